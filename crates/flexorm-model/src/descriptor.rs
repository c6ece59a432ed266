//! Attribute descriptors: where an attribute's value is stored.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The side store backing a typed attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageKind {
    CustomField,
    Taxonomy,
    Metadata,
}

impl StorageKind {
    /// Parse a type tag. Accepts the short and long spellings of each kind.
    ///
    /// Returns `Ok(None)` for `native`, which declares an attribute without a
    /// side store, and the unrecognized tag as the error otherwise.
    pub fn parse_tag(tag: &str) -> Result<Option<Self>, String> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "acf" | "field" | "custom-field" | "custom_field" => Ok(Some(StorageKind::CustomField)),
            "tax" | "taxonomy" => Ok(Some(StorageKind::Taxonomy)),
            "meta" | "metadata" => Ok(Some(StorageKind::Metadata)),
            "native" | "" => Ok(None),
            _ => Err(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::CustomField => "custom-field",
            StorageKind::Taxonomy => "taxonomy",
            StorageKind::Metadata => "metadata",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage declaration for a single attribute.
///
/// An attribute with no `kind` is never lazily loaded and never written back
/// by type; it holds whatever is set on it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub kind: Option<StorageKind>,
    /// Explicit storage key, replacing the prefix-derived default.
    pub key: Option<String>,
}

impl AttributeDescriptor {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn custom_field() -> Self {
        Self::of(StorageKind::CustomField)
    }

    pub fn taxonomy() -> Self {
        Self::of(StorageKind::Taxonomy)
    }

    pub fn metadata() -> Self {
        Self::of(StorageKind::Metadata)
    }

    pub fn of(kind: StorageKind) -> Self {
        Self {
            kind: Some(kind),
            key: None,
        }
    }

    /// Set the explicit storage key. Keys are case-insensitive and stored
    /// lower-cased; an empty key means "no override".
    pub fn with_key(mut self, key: &str) -> Self {
        let key = key.trim().to_lowercase();
        self.key = (!key.is_empty()).then_some(key);
        self
    }

    /// Parse an annotation block of `@name value` lines.
    ///
    /// Only `@type` and `@key` are meaningful. The first occurrence of each
    /// wins. Lines without a value, unknown annotations, and unknown type
    /// tags are ignored, leaving the attribute without a type.
    ///
    /// ```
    /// use flexorm_model::{AttributeDescriptor, StorageKind};
    ///
    /// let d = AttributeDescriptor::from_annotations("/**\n * @type tax\n * @key category\n */");
    /// assert_eq!(d.kind, Some(StorageKind::Taxonomy));
    /// assert_eq!(d.key.as_deref(), Some("category"));
    /// ```
    pub fn from_annotations(block: &str) -> Self {
        let mut type_tag: Option<&str> = None;
        let mut key: Option<&str> = None;

        for (name, value) in block.lines().filter_map(parse_annotation_line) {
            match name {
                "type" if type_tag.is_none() => type_tag = Some(value),
                "key" if key.is_none() => key = Some(value),
                _ => {}
            }
        }

        let kind = type_tag
            .and_then(|tag| StorageKind::parse_tag(tag).ok())
            .flatten();
        let descriptor = Self { kind, key: None };
        match key {
            Some(key) => descriptor.with_key(key),
            None => descriptor,
        }
    }

    pub fn is_typed(&self) -> bool {
        self.kind.is_some()
    }
}

/// Split `... @name value` into `(name, value)`. The name must be word
/// characters followed by a single space and a non-empty value.
fn parse_annotation_line(line: &str) -> Option<(&str, &str)> {
    let at = line.find('@')?;
    let rest = &line[at + 1..];
    let name_len = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let (name, tail) = rest.split_at(name_len);
    let value = tail.strip_prefix(' ')?.trim_end_matches('\r').trim();
    if value.is_empty() {
        return None;
    }
    Some((name, value))
}
