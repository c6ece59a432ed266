use serde::{Deserialize, Serialize};

use crate::descriptor::StorageKind;

/// Default storage-key prefixes, one per side store.
///
/// A typed attribute without an explicit key is stored under
/// `prefix + underscored(attribute name)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPrefixes {
    pub custom_field: String,
    pub taxonomy: String,
    pub metadata: String,
}

impl Default for KeyPrefixes {
    fn default() -> Self {
        Self {
            custom_field: "fp_".into(),
            taxonomy: "fp_".into(),
            metadata: "fp_".into(),
        }
    }
}

impl KeyPrefixes {
    /// The same prefix for every store.
    pub fn uniform(prefix: &str) -> Self {
        Self {
            custom_field: prefix.into(),
            taxonomy: prefix.into(),
            metadata: prefix.into(),
        }
    }

    pub fn for_kind(&self, kind: StorageKind) -> &str {
        match kind {
            StorageKind::CustomField => &self.custom_field,
            StorageKind::Taxonomy => &self.taxonomy,
            StorageKind::Metadata => &self.metadata,
        }
    }
}

/// What a lazy load does when its store fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadFailurePolicy {
    /// Log the failure and leave the attribute unset. Reads see no value.
    #[default]
    LeaveUnset,
    /// Return the store error to the reader.
    Propagate,
}

/// Native fields applied when `persist()` creates a new record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistDefaults {
    pub status: String,
    pub author: u64,
}

impl Default for PersistDefaults {
    fn default() -> Self {
        Self {
            status: "publish".into(),
            author: 1,
        }
    }
}

/// Behavior settings fixed when a model type is registered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub prefixes: KeyPrefixes,
    pub load_failure: LoadFailurePolicy,
    pub persist: PersistDefaults,
}
