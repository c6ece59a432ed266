//! Port traits for every backing store the model core depends on.
//!
//! Any backend (in-memory, database, remote platform API) implements these
//! traits. The model core holds them as `Arc<dyn Trait>` and never reaches
//! for a global.

use std::collections::BTreeMap;

use flexorm_types::{AttrValue, NativeRecord, NewRecord, RecordId, Term, TermRef};

use crate::error::StoreResult;

/// HTML attributes passed to the image renderer.
pub type ImageAttrs = BTreeMap<String, String>;

/// Storage backend for content records and their native fields.
pub trait RecordStore: Send + Sync {
    /// Read the native snapshot of a record.
    ///
    /// Returns `Ok(None)` if the record does not exist.
    fn get(&self, id: RecordId) -> StoreResult<Option<NativeRecord>>;

    /// Create a record from the minimal create payload and return its new
    /// identity.
    fn insert(&self, record: &NewRecord) -> StoreResult<RecordId>;

    /// Replace every native field of an existing record.
    ///
    /// The record must carry an identity that exists in the store.
    fn update(&self, record: &NativeRecord) -> StoreResult<RecordId>;

    /// Delete a record. When `force` is false the record is moved to the
    /// trash instead of being removed.
    ///
    /// Returns `Ok(true)` if the record existed.
    fn delete(&self, id: RecordId, force: bool) -> StoreResult<bool>;

    /// The public permalink for a record, if it exists.
    fn permalink(&self, id: RecordId) -> StoreResult<Option<String>>;
}

/// Scalar key-value metadata keyed by record identity.
pub trait MetadataStore: Send + Sync {
    /// Read the single value stored under `key`.
    ///
    /// Returns `Ok(None)` if no value is stored.
    fn get(&self, id: RecordId, key: &str) -> StoreResult<Option<AttrValue>>;

    /// Create or replace the value stored under `key`.
    fn update(&self, id: RecordId, key: &str, value: &AttrValue) -> StoreResult<()>;

    /// Remove the value stored under `key`. Returns `true` if one existed.
    fn delete(&self, id: RecordId, key: &str) -> StoreResult<bool>;
}

/// Term assignments keyed by taxonomy and record identity.
pub trait TaxonomyStore: Send + Sync {
    /// The terms assigned to a record in `taxonomy`, in assignment order.
    ///
    /// Fails with `NotFound` when the taxonomy is not registered.
    fn object_terms(&self, id: RecordId, taxonomy: &str) -> StoreResult<Vec<Term>>;

    /// Replace the record's assignments in `taxonomy` with `terms`.
    ///
    /// Slugs that do not name an existing term create one. Ids that do not
    /// name an existing term are skipped. Returns the assigned term ids.
    fn set_object_terms(
        &self,
        id: RecordId,
        taxonomy: &str,
        terms: &[TermRef],
    ) -> StoreResult<Vec<i64>>;
}

/// Named structured fields keyed by record identity.
pub trait CustomFieldStore: Send + Sync {
    /// Resolve a field name to the store's internal field key for a record.
    ///
    /// Returns `Ok(None)` when the store has no separate key for the field,
    /// in which case callers address the field by name.
    fn field_reference(&self, _name: &str, _id: RecordId) -> StoreResult<Option<String>> {
        Ok(None)
    }

    /// Read the value of a field, addressed by name or internal key.
    fn get_field(&self, key: &str, id: RecordId) -> StoreResult<Option<AttrValue>>;

    /// Create or replace the value of a field, addressed by name or internal key.
    fn update_field(&self, key: &str, value: &AttrValue, id: RecordId) -> StoreResult<()>;
}

/// Renders featured-image markup for a record.
pub trait ImageRenderer: Send + Sync {
    /// Markup for the record's featured image at `size`, or an empty string
    /// when the record has none.
    fn featured_image(&self, id: RecordId, size: &str, attrs: &ImageAttrs) -> StoreResult<String>;
}

/// Resolves author identities to display names.
pub trait AuthorDirectory: Send + Sync {
    /// The display name for `author_id`, if the author exists.
    fn display_name(&self, author_id: u64) -> StoreResult<Option<String>>;
}
