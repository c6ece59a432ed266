//! The lazy-load gate for declared attributes.
//!
//! A typed attribute is fetched from its store the first time it is read
//! and kept on the record afterwards. Nothing is loaded proactively, and an
//! attribute that already holds a value is never refetched; [`Record::unset`]
//! is the only way to force a reload.
//!
//! - Custom-field and metadata values that are absent load as
//!   [`AttrValue::Null`], so the store is asked only once.
//! - Taxonomy attributes load the full term list. No assigned terms leaves
//!   the attribute unset.
//! - Store failures follow the model's [`LoadFailurePolicy`].

use flexorm_store::StoreResult;
use flexorm_types::{AttrValue, RecordId};
use tracing::{debug, warn};

use crate::config::LoadFailurePolicy;
use crate::descriptor::{AttributeDescriptor, StorageKind};
use crate::error::ModelResult;
use crate::record::Record;

impl Record {
    /// Populate `name` from its backing store unless it already holds a
    /// value. Records without an identity have nothing to load.
    pub(crate) fn ensure_loaded(
        &mut self,
        name: &str,
        descriptor: &AttributeDescriptor,
    ) -> ModelResult<()> {
        if self.values.contains_key(name) {
            return Ok(());
        }
        let Some(kind) = descriptor.kind else {
            return Ok(());
        };
        let Some(id) = self.id() else {
            debug!(attribute = name, "skipping load for unsaved record");
            return Ok(());
        };
        let Some(key) = self.schema().storage_key(name, descriptor) else {
            return Ok(());
        };

        let fetched = match kind {
            StorageKind::CustomField => self
                .fetch_custom_field(descriptor, &key, id)
                .map(|value| Some(value.unwrap_or_default())),
            StorageKind::Metadata => self
                .model
                .backends()
                .metadata
                .get(id, &key)
                .map(|value| Some(value.unwrap_or_default())),
            StorageKind::Taxonomy => self
                .model
                .backends()
                .taxonomy
                .object_terms(id, &key)
                .map(|terms| (!terms.is_empty()).then(|| AttrValue::from_terms(terms))),
        };

        match fetched {
            Ok(Some(value)) => {
                debug!(attribute = name, %kind, key = %key, "attribute loaded");
                self.values.insert(name.to_string(), value);
            }
            Ok(None) => {
                debug!(attribute = name, key = %key, "no terms assigned; attribute left unset");
            }
            Err(e) => match self.schema().config().load_failure {
                LoadFailurePolicy::Propagate => return Err(e.into()),
                LoadFailurePolicy::LeaveUnset => {
                    warn!(attribute = name, %kind, key = %key, error = %e, "load failed; attribute left unset");
                }
            },
        }
        Ok(())
    }

    /// Custom fields without an explicit key are looked up through the
    /// store's field reference first, falling back to the derived key.
    fn fetch_custom_field(
        &self,
        descriptor: &AttributeDescriptor,
        key: &str,
        id: RecordId,
    ) -> StoreResult<Option<AttrValue>> {
        let fields = &self.model.backends().fields;
        let field_key = match descriptor.key {
            Some(_) => key.to_string(),
            None => fields
                .field_reference(key, id)?
                .unwrap_or_else(|| key.to_string()),
        };
        fields.get_field(&field_key, id)
    }
}

#[cfg(test)]
mod tests {
    use flexorm_store::{CustomFieldStore, MetadataStore, TaxonomyStore};
    use flexorm_types::{NativeRecord, Term, TermRef};

    use crate::backends::InMemoryBackends;
    use crate::config::LoadFailurePolicy;
    use crate::descriptor::AttributeDescriptor;
    use crate::error::ModelError;
    use crate::model::Model;
    use crate::record::{ReadOptions, Record};
    use crate::schema::ModelSchema;

    use super::*;

    fn setup(policy: LoadFailurePolicy) -> (Model, InMemoryBackends, Record) {
        let stores = InMemoryBackends::new();
        stores.taxonomy.register_taxonomy("category").unwrap();
        stores.taxonomy.register_taxonomy("fp_event_type").unwrap();
        let schema = ModelSchema::builder("event")
            .load_failure(policy)
            .attribute("venue", AttributeDescriptor::metadata())
            .attribute("imageUrl", AttributeDescriptor::custom_field())
            .attribute("hero", AttributeDescriptor::custom_field().with_key("hero_image"))
            .attribute("eventType", AttributeDescriptor::taxonomy())
            .build()
            .unwrap();
        let model = Model::new(schema, stores.backends());
        let id = stores.records.put(NativeRecord::default()).unwrap();
        let record = model.instance_by_id(id).unwrap();
        (model, stores, record)
    }

    #[test]
    fn metadata_loads_once() {
        let (_, stores, mut record) = setup(LoadFailurePolicy::LeaveUnset);
        let id = record.id().unwrap();
        stores.metadata.update(id, "fp_venue", &"Hall A".into()).unwrap();

        assert_eq!(record.get("venue").unwrap(), AttrValue::from("Hall A"));
        assert_eq!(record.get("venue").unwrap(), AttrValue::from("Hall A"));
        assert_eq!(stores.metadata.stats().reads(), 1);
    }

    #[test]
    fn absent_metadata_is_cached_as_null() {
        let (_, stores, mut record) = setup(LoadFailurePolicy::LeaveUnset);
        assert_eq!(record.get("venue").unwrap(), AttrValue::Null);
        assert!(record.is_set("venue"));
        record.get("venue").unwrap();
        assert_eq!(stores.metadata.stats().reads(), 1);
    }

    #[test]
    fn custom_field_resolves_field_reference() {
        let (_, stores, mut record) = setup(LoadFailurePolicy::LeaveUnset);
        let id = record.id().unwrap();
        stores
            .fields
            .register_reference("fp_image_url", "field_5f1a")
            .unwrap();
        stores
            .fields
            .update_field("field_5f1a", &"/img/a.jpg".into(), id)
            .unwrap();

        assert_eq!(record.get("imageUrl").unwrap(), AttrValue::from("/img/a.jpg"));
    }

    #[test]
    fn custom_field_with_explicit_key_skips_reference_lookup() {
        let (_, stores, mut record) = setup(LoadFailurePolicy::LeaveUnset);
        let id = record.id().unwrap();
        stores
            .fields
            .update_field("hero_image", &"/img/hero.jpg".into(), id)
            .unwrap();
        let reads_before = stores.fields.stats().reads();

        assert_eq!(record.get("hero").unwrap(), AttrValue::from("/img/hero.jpg"));
        assert_eq!(stores.fields.stats().reads() - reads_before, 1);
    }

    #[test]
    fn taxonomy_loads_full_term_list() {
        let (_, stores, mut record) = setup(LoadFailurePolicy::LeaveUnset);
        let id = record.id().unwrap();
        stores
            .taxonomy
            .set_object_terms(
                id,
                "fp_event_type",
                &[TermRef::Slug("gala".into()), TermRef::Slug("talk".into())],
            )
            .unwrap();

        let all = record.get_with("eventType", &ReadOptions::all_terms()).unwrap();
        let slugs: Vec<&str> = all
            .as_list()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_term().map(|t: &Term| t.slug.as_str()))
            .collect();
        assert_eq!(slugs, vec!["gala", "talk"]);
    }

    #[test]
    fn empty_taxonomy_leaves_attribute_unset() {
        let (_, stores, mut record) = setup(LoadFailurePolicy::LeaveUnset);
        assert_eq!(record.get("eventType").unwrap(), AttrValue::Null);
        assert!(!record.is_set("eventType"));
        record.get("eventType").unwrap();
        assert_eq!(stores.taxonomy.stats().reads(), 2);
    }

    #[test]
    fn failed_load_leaves_attribute_unset() {
        let (_, stores, mut record) = setup(LoadFailurePolicy::LeaveUnset);
        stores.taxonomy.stats().set_fail_reads(true);
        stores.metadata.stats().set_fail_reads(true);

        assert_eq!(record.get("eventType").unwrap(), AttrValue::Null);
        assert_eq!(record.get("venue").unwrap(), AttrValue::Null);
        assert!(!record.is_set("eventType"));
        assert!(!record.is_set("venue"));

        stores.metadata.stats().set_fail_reads(false);
        let id = record.id().unwrap();
        stores.metadata.update(id, "fp_venue", &"Hall B".into()).unwrap();
        assert_eq!(record.get("venue").unwrap(), AttrValue::from("Hall B"));
    }

    #[test]
    fn failed_load_propagates_when_configured() {
        let (_, stores, mut record) = setup(LoadFailurePolicy::Propagate);
        stores.metadata.stats().set_fail_reads(true);
        assert!(matches!(record.get("venue"), Err(ModelError::Store(_))));
        assert!(!record.is_set("venue"));
    }

    #[test]
    fn unregistered_taxonomy_follows_failure_policy() {
        let (_, stores, _) = setup(LoadFailurePolicy::LeaveUnset);
        let schema = ModelSchema::builder("event")
            .attribute("mood", AttributeDescriptor::taxonomy())
            .build()
            .unwrap();
        let other = Model::new(schema, stores.backends());
        let id = stores.records.put(NativeRecord::default()).unwrap();
        let mut record = other.instance_by_id(id).unwrap();
        assert_eq!(record.get("mood").unwrap(), AttrValue::Null);
        assert!(!record.is_set("mood"));
    }

    #[test]
    fn unsaved_record_never_loads() {
        let (model, stores, _) = setup(LoadFailurePolicy::Propagate);
        let mut record = model.new_record();
        assert_eq!(record.get("venue").unwrap(), AttrValue::Null);
        assert_eq!(record.get("eventType").unwrap(), AttrValue::Null);
        assert_eq!(stores.side_reads(), 0);
    }

    #[test]
    fn loaded_values_are_not_dirty() {
        let (_, stores, mut record) = setup(LoadFailurePolicy::LeaveUnset);
        let id = record.id().unwrap();
        stores.metadata.update(id, "fp_venue", &"Hall A".into()).unwrap();
        record.get("venue").unwrap();
        assert!(record.dirty().is_empty());
        assert_eq!(stores.metadata.get(id, "fp_venue").unwrap(), Some("Hall A".into()));
    }
}
