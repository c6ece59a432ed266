//! Registered model types and record factories.

use std::sync::Arc;

use flexorm_types::{NativeRecord, RecordId};
use tracing::{debug, warn};

use crate::backends::Backends;
use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::schema::ModelSchema;

/// A model type: an immutable schema bound to the stores it persists into.
///
/// Cloning is cheap; every record created from a model shares its schema
/// and backends.
#[derive(Clone, Debug)]
pub struct Model {
    schema: Arc<ModelSchema>,
    backends: Backends,
}

impl Model {
    pub fn new(schema: ModelSchema, backends: Backends) -> Self {
        Self {
            schema: Arc::new(schema),
            backends,
        }
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub(crate) fn schema_arc(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// An empty record without an identity. Typed attributes are never
    /// loaded until the record has been persisted.
    pub fn new_record(&self) -> Record {
        Record::new(self.clone(), NativeRecord::default(), None, None)
    }

    /// A record copying every native field of `snapshot`.
    ///
    /// The permalink is computed once here. A failing permalink lookup is
    /// logged and leaves the record without one.
    pub fn from_snapshot(&self, snapshot: NativeRecord) -> Record {
        let permalink = snapshot.id.and_then(|id| match self.backends.records.permalink(id) {
            Ok(link) => link,
            Err(e) => {
                warn!(model = self.schema.name(), %id, error = %e, "permalink lookup failed");
                None
            }
        });
        Record::new(self.clone(), snapshot.clone(), Some(snapshot), permalink)
    }

    /// Load the record with identity `id` from the record store.
    pub fn instance_by_id(&self, id: RecordId) -> ModelResult<Record> {
        let snapshot = self
            .backends
            .records
            .get(id)?
            .ok_or(ModelError::NotFound(id))?;
        debug!(model = self.schema.name(), %id, "loaded record snapshot");
        Ok(self.from_snapshot(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::InMemoryBackends;

    fn model() -> (Model, InMemoryBackends) {
        let stores = InMemoryBackends::new();
        let schema = ModelSchema::builder("event").build().unwrap();
        (Model::new(schema, stores.backends()), stores)
    }

    #[test]
    fn new_record_is_empty() {
        let (model, _) = model();
        let record = model.new_record();
        assert!(record.id().is_none());
        assert!(record.original_snapshot().is_none());
        assert!(record.permalink().is_none());
    }

    #[test]
    fn snapshot_copies_native_fields_and_permalink() {
        let (model, stores) = model();
        let id = stores
            .records
            .put(NativeRecord {
                post_title: "Launch".into(),
                post_name: "launch".into(),
                ..NativeRecord::default()
            })
            .unwrap();

        let record = model.instance_by_id(id).unwrap();
        assert_eq!(record.id(), Some(id));
        assert_eq!(record.native().post_title, "Launch");
        assert_eq!(record.permalink(), Some("https://example.test/launch/"));
        assert_eq!(record.original_snapshot().map(|s| s.id), Some(Some(id)));
    }

    #[test]
    fn missing_record_is_not_found() {
        let (model, _) = model();
        let id = RecordId::new(99).unwrap();
        assert!(matches!(model.instance_by_id(id), Err(ModelError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn failing_permalink_lookup_leaves_none() {
        let (model, stores) = model();
        let id = stores.records.put(NativeRecord::default()).unwrap();
        let snapshot = stores.records.records().unwrap().remove(0);
        stores.records.stats().set_fail_reads(true);
        let record = model.from_snapshot(snapshot);
        assert_eq!(record.id(), Some(id));
        assert!(record.permalink().is_none());
    }

    #[test]
    fn records_share_the_schema() {
        let (model, _) = model();
        let a = model.new_record();
        let b = model.new_record();
        assert!(std::ptr::eq(a.model().schema(), b.model().schema()));
    }
}
