//! The persistence coordinator.
//!
//! `persist()` runs in two phases:
//!
//! 1. **Record.** A record with an identity pushes its full native field set
//!    to the record store, dirty or not. A record without one is created from
//!    the minimal payload (type, title, date, content) with the model's fixed
//!    default status and author, and adopts the new identity.
//! 2. **Writeback.** Every declared, typed attribute in the dirty set is
//!    written to its store under its storage key. Taxonomy values are
//!    sanitized to term ids and slugs first and reloaded afterwards, so the
//!    record holds the store's term objects. A failed reload does not fail
//!    the persist; the attribute is left unset and loads on the next read.
//!
//! The dirty set is cleared only when both phases succeed. On failure the
//! record keeps its pending writes and `persist()` can be retried.

use std::sync::Arc;

use flexorm_types::{AttrValue, NewRecord, RecordId, TermRef};
use tracing::{debug, info, warn};

use crate::descriptor::{AttributeDescriptor, StorageKind};
use crate::error::{ModelError, ModelResult};
use crate::record::Record;

impl Record {
    /// Save the record and its changed typed attributes. Returns the
    /// record's identity.
    pub fn persist(&mut self) -> ModelResult<RecordId> {
        let id = match self.id() {
            Some(id) => self.update_native(id)?,
            None => self.create_native()?,
        };

        let schema = Arc::clone(self.model.schema_arc());
        let mut written = 0usize;
        for (name, descriptor) in schema.attributes() {
            if !self.dirty.contains(name) {
                continue;
            }
            let Some(kind) = descriptor.kind else {
                debug!(attribute = name, "untyped attribute skipped on persist");
                continue;
            };
            let Some(value) = self.values.get(name).cloned() else {
                continue;
            };
            let Some(key) = schema.storage_key(name, descriptor) else {
                continue;
            };
            self.write_back(id, name, descriptor, kind, &key, &value)?;
            written += 1;
        }

        self.dirty.clear();
        info!(model = schema.name(), %id, written, "record persisted");
        Ok(id)
    }

    fn update_native(&mut self, id: RecordId) -> ModelResult<RecordId> {
        info!(model = self.schema().name(), %id, "updating record");
        let updated = self
            .model
            .backends()
            .records
            .update(&self.native)
            .map_err(|e| ModelError::persistence(format!("update record {id}"), e))?;
        self.native.id = Some(updated);
        Ok(updated)
    }

    fn create_native(&mut self) -> ModelResult<RecordId> {
        let schema = self.schema();
        let defaults = &schema.config().persist;
        let payload = NewRecord {
            post_status: defaults.status.clone(),
            post_type: non_empty_or(&self.native.post_type, schema.post_type()),
            post_author: defaults.author,
            post_title: self.native.post_title.clone(),
            post_date: self.native.post_date.clone(),
            post_content: self.native.post_content.clone(),
        };

        info!(model = schema.name(), post_type = %payload.post_type, "creating record");
        let id = self
            .model
            .backends()
            .records
            .insert(&payload)
            .map_err(|e| ModelError::persistence("create record", e))?;

        self.native.id = Some(id);
        self.native.post_status = payload.post_status;
        self.native.post_type = payload.post_type;
        self.native.post_author = payload.post_author;
        Ok(id)
    }

    fn write_back(
        &mut self,
        id: RecordId,
        name: &str,
        descriptor: &AttributeDescriptor,
        kind: StorageKind,
        key: &str,
        value: &AttrValue,
    ) -> ModelResult<()> {
        let backends = self.model.backends().clone();
        let context = || format!("{kind} {key} of {name}");

        match kind {
            StorageKind::CustomField => backends
                .fields
                .update_field(key, value, id)
                .map_err(|e| ModelError::persistence(context(), e))?,
            StorageKind::Metadata => backends
                .metadata
                .update(id, key, value)
                .map_err(|e| ModelError::persistence(context(), e))?,
            StorageKind::Taxonomy => {
                let terms = TermRef::sanitize(value);
                backends
                    .taxonomy
                    .set_object_terms(id, key, &terms)
                    .map_err(|e| ModelError::persistence(context(), e))?;
                self.values.remove(name);
                if let Err(e) = self.ensure_loaded(name, descriptor) {
                    warn!(attribute = name, key, error = %e, "terms written but reload failed; attribute left unset");
                }
            }
        }

        debug!(attribute = name, %kind, key, "attribute written");
        Ok(())
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
