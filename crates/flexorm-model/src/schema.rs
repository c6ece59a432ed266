//! The attribute registry of a model type.
//!
//! A [`ModelSchema`] is built once per model type, either in code through
//! [`SchemaBuilder`] or declaratively from TOML, and is immutable afterwards.
//! It answers two questions for the rest of the engine: where does an
//! attribute live ([`ModelSchema::resolve`]) and under which key
//! ([`ModelSchema::storage_key`]).
//!
//! ```toml
//! name = "event"
//! load_failure = "leave-unset"
//!
//! [prefixes]
//! taxonomy = "ev_"
//!
//! [attributes.venue]
//! type = "meta"
//!
//! [attributes.eventType]
//! type = "taxonomy"
//!
//! [attributes.imageUrl]
//! annotations = "@type acf\n@key hero_image"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use flexorm_types::NATIVE_FIELDS;
use serde::Deserialize;

use crate::config::{KeyPrefixes, LoadFailurePolicy, ModelConfig, PersistDefaults};
use crate::descriptor::{AttributeDescriptor, StorageKind};
use crate::error::{ModelError, ModelResult};
use crate::naming::underscored;

/// Where an attribute's value lives on a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeSlot {
    /// A native field of the content record, by underscored field name.
    Native(&'static str),
    /// A declared attribute held by the record and backed by its descriptor.
    Declared(AttributeDescriptor),
}

impl AttributeSlot {
    /// The storage kind, if the attribute is typed.
    pub fn kind(&self) -> Option<StorageKind> {
        match self {
            AttributeSlot::Native(_) => None,
            AttributeSlot::Declared(descriptor) => descriptor.kind,
        }
    }
}

/// Immutable attribute registry and configuration of a model type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSchema {
    name: String,
    post_type: String,
    config: ModelConfig,
    attributes: BTreeMap<String, AttributeDescriptor>,
}

impl ModelSchema {
    /// Start building a schema for model `name`.
    ///
    /// Every schema starts with `category` declared as a taxonomy attribute
    /// keyed `category`; declaring `category` again replaces it.
    pub fn builder(name: &str) -> SchemaBuilder {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "category".to_string(),
            AttributeDescriptor::taxonomy().with_key("category"),
        );
        SchemaBuilder {
            name: name.to_string(),
            post_type: None,
            config: ModelConfig::default(),
            attributes,
        }
    }

    /// Parse a schema declaration from TOML.
    pub fn from_toml_str(input: &str) -> ModelResult<Self> {
        let file: SchemaFile =
            toml::from_str(input).map_err(|e| ModelError::InvalidSchema(e.to_string()))?;

        let mut builder = Self::builder(&file.name)
            .prefixes(file.prefixes)
            .load_failure(file.load_failure)
            .persist_defaults(file.persist);
        if let Some(post_type) = file.post_type {
            builder = builder.post_type(&post_type);
        }

        for (name, decl) in file.attributes {
            let descriptor = decl.into_descriptor(&name)?;
            builder = builder.attribute(&name, descriptor);
        }

        builder.build()
    }

    /// Read and parse a TOML schema file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The record type created records are given.
    pub fn post_type(&self) -> &str {
        &self.post_type
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn prefixes(&self) -> &KeyPrefixes {
        &self.config.prefixes
    }

    /// Declared attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeDescriptor)> {
        self.attributes.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn descriptor(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.get(name)
    }

    /// Resolve an attribute name to its slot.
    ///
    /// Declared attributes take precedence. Otherwise the name is matched
    /// against native fields by its underscored spelling, so `postTitle`
    /// addresses `post_title`.
    pub fn resolve(&self, name: &str) -> ModelResult<AttributeSlot> {
        if let Some(descriptor) = self.attributes.get(name) {
            return Ok(AttributeSlot::Declared(descriptor.clone()));
        }
        let field = underscored(name);
        NATIVE_FIELDS
            .iter()
            .copied()
            .find(|f| *f == field)
            .map(AttributeSlot::Native)
            .ok_or_else(|| ModelError::UnknownAttribute {
                model: self.name.clone(),
                attribute: name.to_string(),
            })
    }

    /// The key a typed attribute is stored under: the explicit key if one is
    /// declared, else the kind's prefix followed by the underscored name.
    ///
    /// Returns `None` for attributes without a type.
    pub fn storage_key(&self, name: &str, descriptor: &AttributeDescriptor) -> Option<String> {
        let kind = descriptor.kind?;
        Some(match &descriptor.key {
            Some(key) => key.clone(),
            None => format!("{}{}", self.config.prefixes.for_kind(kind), underscored(name)),
        })
    }
}

/// Builder for [`ModelSchema`].
#[derive(Clone, Debug)]
pub struct SchemaBuilder {
    name: String,
    post_type: Option<String>,
    config: ModelConfig,
    attributes: BTreeMap<String, AttributeDescriptor>,
}

impl SchemaBuilder {
    /// Record type for created records. Defaults to the model name.
    pub fn post_type(mut self, post_type: &str) -> Self {
        self.post_type = Some(post_type.to_string());
        self
    }

    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn prefixes(mut self, prefixes: KeyPrefixes) -> Self {
        self.config.prefixes = prefixes;
        self
    }

    pub fn load_failure(mut self, policy: LoadFailurePolicy) -> Self {
        self.config.load_failure = policy;
        self
    }

    pub fn persist_defaults(mut self, defaults: PersistDefaults) -> Self {
        self.config.persist = defaults;
        self
    }

    /// Declare an attribute with an explicit descriptor.
    pub fn attribute(mut self, name: &str, descriptor: AttributeDescriptor) -> Self {
        self.attributes.insert(name.to_string(), descriptor);
        self
    }

    /// Declare an attribute from an annotation block (`@type ...`, `@key ...`).
    pub fn annotated(self, name: &str, annotations: &str) -> Self {
        self.attribute(name, AttributeDescriptor::from_annotations(annotations))
    }

    /// Declare an attribute without a type. It is never loaded or written
    /// back; it only holds what is set on it.
    pub fn plain(self, name: &str) -> Self {
        self.attribute(name, AttributeDescriptor::plain())
    }

    pub fn build(self) -> ModelResult<ModelSchema> {
        if !is_identifier(&self.name) {
            return Err(ModelError::InvalidSchema(format!(
                "invalid model name: {:?}",
                self.name
            )));
        }
        if let Some(bad) = self.attributes.keys().find(|name| !is_identifier(name)) {
            return Err(ModelError::InvalidSchema(format!(
                "invalid attribute name: {bad:?}"
            )));
        }
        let post_type = self.post_type.unwrap_or_else(|| self.name.clone());
        if post_type.trim().is_empty() {
            return Err(ModelError::InvalidSchema("post type must not be empty".into()));
        }

        Ok(ModelSchema {
            name: self.name,
            post_type,
            config: self.config,
            attributes: self.attributes,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    name: String,
    #[serde(default)]
    post_type: Option<String>,
    #[serde(default)]
    prefixes: KeyPrefixes,
    #[serde(default)]
    load_failure: LoadFailurePolicy,
    #[serde(default)]
    persist: PersistDefaults,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttributeDecl {
    #[serde(rename = "type")]
    type_tag: Option<String>,
    key: Option<String>,
    annotations: Option<String>,
}

impl AttributeDecl {
    fn into_descriptor(self, name: &str) -> ModelResult<AttributeDescriptor> {
        if let Some(block) = self.annotations {
            if self.type_tag.is_some() || self.key.is_some() {
                return Err(ModelError::InvalidSchema(format!(
                    "attribute {name}: annotations cannot be combined with type or key"
                )));
            }
            return Ok(AttributeDescriptor::from_annotations(&block));
        }

        let kind = match self.type_tag.as_deref() {
            Some(tag) => StorageKind::parse_tag(tag).map_err(|tag| {
                ModelError::InvalidSchema(format!("attribute {name}: unknown type {tag:?}"))
            })?,
            None => None,
        };
        let descriptor = AttributeDescriptor { kind, key: None };
        Ok(match self.key {
            Some(key) => descriptor.with_key(&key),
            None => descriptor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_schema() -> ModelSchema {
        ModelSchema::builder("event")
            .attribute("venue", AttributeDescriptor::metadata())
            .attribute("imageUrl", AttributeDescriptor::custom_field())
            .attribute("eventType", AttributeDescriptor::taxonomy())
            .attribute(
                "ticketPrice",
                AttributeDescriptor::metadata().with_key("price"),
            )
            .plain("scratch")
            .build()
            .unwrap()
    }

    #[test]
    fn category_is_declared_by_default() {
        let schema = event_schema();
        let d = schema.descriptor("category").unwrap();
        assert_eq!(d.kind, Some(StorageKind::Taxonomy));
        assert_eq!(schema.storage_key("category", d).as_deref(), Some("category"));
    }

    #[test]
    fn default_keys_use_prefix_and_underscored_name() {
        let schema = event_schema();
        let key = |name: &str| schema.storage_key(name, schema.descriptor(name).unwrap());
        assert_eq!(key("venue").as_deref(), Some("fp_venue"));
        assert_eq!(key("imageUrl").as_deref(), Some("fp_image_url"));
        assert_eq!(key("eventType").as_deref(), Some("fp_event_type"));
        assert_eq!(key("ticketPrice").as_deref(), Some("price"));
        assert_eq!(key("scratch"), None);
    }

    #[test]
    fn per_kind_prefixes() {
        let schema = ModelSchema::builder("event")
            .prefixes(KeyPrefixes {
                custom_field: "acf_".into(),
                taxonomy: "tx_".into(),
                metadata: "_m_".into(),
            })
            .attribute("venue", AttributeDescriptor::metadata())
            .attribute("eventType", AttributeDescriptor::taxonomy())
            .attribute("imageUrl", AttributeDescriptor::custom_field())
            .build()
            .unwrap();
        let key = |name: &str| schema.storage_key(name, schema.descriptor(name).unwrap());
        assert_eq!(key("venue").as_deref(), Some("_m_venue"));
        assert_eq!(key("eventType").as_deref(), Some("tx_event_type"));
        assert_eq!(key("imageUrl").as_deref(), Some("acf_image_url"));
    }

    #[test]
    fn resolve_declared_native_and_unknown() {
        let schema = event_schema();
        assert_eq!(
            schema.resolve("venue").unwrap(),
            AttributeSlot::Declared(AttributeDescriptor::metadata())
        );
        assert_eq!(
            schema.resolve("postTitle").unwrap(),
            AttributeSlot::Native("post_title")
        );
        assert_eq!(schema.resolve("ID").unwrap(), AttributeSlot::Native("id"));
        assert_eq!(schema.resolve("scratch").unwrap().kind(), None);

        let err = schema.resolve("subtitle").unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnknownAttribute { ref attribute, .. } if attribute == "subtitle"
        ));
    }

    #[test]
    fn declared_attribute_shadows_native_field() {
        let schema = ModelSchema::builder("event")
            .attribute("postExcerpt", AttributeDescriptor::metadata())
            .build()
            .unwrap();
        assert_eq!(
            schema.resolve("postExcerpt").unwrap().kind(),
            Some(StorageKind::Metadata)
        );
    }

    #[test]
    fn post_type_defaults_to_model_name() {
        assert_eq!(event_schema().post_type(), "event");
        let schema = ModelSchema::builder("event")
            .post_type("tribe_events")
            .build()
            .unwrap();
        assert_eq!(schema.post_type(), "tribe_events");
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(ModelSchema::builder("").build().is_err());
        assert!(ModelSchema::builder("event").plain("bad name").build().is_err());
        assert!(ModelSchema::builder("event").plain("9lives").build().is_err());
    }

    #[test]
    fn parse_toml_schema() {
        let schema = ModelSchema::from_toml_str(
            r#"
            name = "event"
            post_type = "tribe_events"
            load_failure = "propagate"

            [prefixes]
            taxonomy = "ev_"

            [persist]
            author = 7

            [attributes.venue]
            type = "meta"

            [attributes.eventType]
            type = "taxonomy"

            [attributes.imageUrl]
            annotations = "@type acf\n@key Hero_Image"

            [attributes.notes]
            "#,
        )
        .unwrap();

        assert_eq!(schema.name(), "event");
        assert_eq!(schema.post_type(), "tribe_events");
        assert_eq!(schema.config().load_failure, LoadFailurePolicy::Propagate);
        assert_eq!(schema.config().persist.author, 7);
        assert_eq!(schema.config().persist.status, "publish");

        let key = |name: &str| schema.storage_key(name, schema.descriptor(name).unwrap());
        assert_eq!(key("venue").as_deref(), Some("fp_venue"));
        assert_eq!(key("eventType").as_deref(), Some("ev_event_type"));
        assert_eq!(key("imageUrl").as_deref(), Some("hero_image"));
        assert_eq!(key("notes"), None);
        assert!(schema.descriptor("category").is_some());
    }

    #[test]
    fn toml_unknown_type_is_rejected() {
        let err = ModelSchema::from_toml_str(
            r#"
            name = "event"
            [attributes.venue]
            type = "blob"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidSchema(_)));
    }

    #[test]
    fn toml_annotations_and_type_conflict() {
        let err = ModelSchema::from_toml_str(
            r#"
            name = "event"
            [attributes.venue]
            type = "meta"
            annotations = "@type meta"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidSchema(_)));
    }

    #[test]
    fn load_schema_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.toml");
        std::fs::write(&path, "name = \"event\"\n[attributes.venue]\ntype = \"meta\"\n").unwrap();
        let schema = ModelSchema::from_toml_file(&path).unwrap();
        assert!(schema.descriptor("venue").is_some());

        let missing = ModelSchema::from_toml_file(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ModelError::Io(_))));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn kind() -> impl Strategy<Value = StorageKind> {
            prop_oneof![
                Just(StorageKind::CustomField),
                Just(StorageKind::Taxonomy),
                Just(StorageKind::Metadata),
            ]
        }

        proptest! {
            #[test]
            fn default_key_is_prefix_plus_underscored_name(
                words in prop::collection::vec("[a-z]{2,8}", 1..4),
                kind in kind(),
                prefix in "[a-z]{0,4}_",
            ) {
                let name: String = words
                    .iter()
                    .enumerate()
                    .map(|(i, w)| if i == 0 { w.clone() } else { w[..1].to_uppercase() + &w[1..] })
                    .collect();
                let schema = ModelSchema::builder("model")
                    .prefixes(KeyPrefixes::uniform(&prefix))
                    .attribute(&name, AttributeDescriptor::of(kind))
                    .build()
                    .unwrap();
                let descriptor = schema.descriptor(&name).unwrap();
                prop_assert_eq!(
                    schema.storage_key(&name, descriptor),
                    Some(format!("{prefix}{}", words.join("_")))
                );
            }
        }
    }
}
