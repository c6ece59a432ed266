//! In-memory store backends for testing and ephemeral use.
//!
//! Every store keeps its data in a map behind a `RwLock` and counts the
//! operations it serves in an [`OpStats`]. Data is lost when the store is
//! dropped.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;

use flexorm_types::{AttrValue, NativeRecord, NewRecord, RecordId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{
    AuthorDirectory, CustomFieldStore, ImageAttrs, ImageRenderer, MetadataStore, RecordStore,
};

/// Operation counters and failure switches shared by the in-memory stores.
#[derive(Debug, Default)]
pub struct OpStats {
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl OpStats {
    /// Number of read operations served (including failed ones).
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write operations served (including failed ones).
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent read fail with [`StoreError::Unavailable`].
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with [`StoreError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn record_read(&self, op: &str) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected read failure: {op}")));
        }
        Ok(())
    }

    pub(crate) fn record_write(&self, op: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected write failure: {op}")));
        }
        Ok(())
    }
}

// ---- Records ----

/// An in-memory implementation of [`RecordStore`].
#[derive(Debug)]
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<RecordId, NativeRecord>>,
    next_id: AtomicU64,
    base_url: String,
    stats: OpStats,
}

impl InMemoryRecordStore {
    /// Create a new empty record store with the default permalink base.
    pub fn new() -> Self {
        Self::with_base_url("https://example.test")
    }

    /// Create a new empty record store whose permalinks start with `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            stats: OpStats::default(),
        }
    }

    /// Store a snapshot as-is, assigning an identity if it has none.
    ///
    /// Seeding does not count as a write.
    pub fn put(&self, mut record: NativeRecord) -> StoreResult<RecordId> {
        let id = match record.id {
            Some(id) => {
                self.next_id.fetch_max(id.get() + 1, Ordering::SeqCst);
                id
            }
            None => self.allocate_id()?,
        };
        record.id = Some(id);
        self.records.write()?.insert(id, record);
        Ok(id)
    }

    /// All stored records in identity order.
    pub fn records(&self) -> StoreResult<Vec<NativeRecord>> {
        Ok(self.records.read()?.values().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> &OpStats {
        &self.stats
    }

    fn allocate_id(&self) -> StoreResult<RecordId> {
        let raw = self.next_id.fetch_add(1, Ordering::SeqCst);
        RecordId::new(raw).ok_or_else(|| StoreError::Unavailable("record id space exhausted".into()))
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, id: RecordId) -> StoreResult<Option<NativeRecord>> {
        self.stats.record_read("get record")?;
        Ok(self.records.read()?.get(&id).cloned())
    }

    fn insert(&self, record: &NewRecord) -> StoreResult<RecordId> {
        self.stats.record_write("insert record")?;
        if record.post_type.is_empty() {
            return Err(StoreError::Rejected("record type must not be empty".into()));
        }
        let id = self.allocate_id()?;
        self.records
            .write()?
            .insert(id, record.clone().into_native(id));
        debug!(%id, post_type = %record.post_type, "record inserted");
        Ok(id)
    }

    fn update(&self, record: &NativeRecord) -> StoreResult<RecordId> {
        self.stats.record_write("update record")?;
        let id = record
            .id
            .ok_or_else(|| StoreError::Rejected("cannot update a record without id".into()))?;
        let mut records = self.records.write()?;
        match records.get_mut(&id) {
            Some(slot) => {
                *slot = record.clone();
                debug!(%id, "record updated");
                Ok(id)
            }
            None => Err(StoreError::NotFound(format!("record {id}"))),
        }
    }

    fn delete(&self, id: RecordId, force: bool) -> StoreResult<bool> {
        self.stats.record_write("delete record")?;
        let mut records = self.records.write()?;
        if force {
            return Ok(records.remove(&id).is_some());
        }
        match records.get_mut(&id) {
            Some(record) => {
                record.post_status = "trash".into();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn permalink(&self, id: RecordId) -> StoreResult<Option<String>> {
        self.stats.record_read("permalink")?;
        let records = self.records.read()?;
        Ok(records.get(&id).map(|record| {
            if record.post_name.is_empty() {
                format!("{}/?p={id}", self.base_url)
            } else {
                format!("{}/{}/", self.base_url, record.post_name)
            }
        }))
    }
}

// ---- Metadata ----

/// An in-memory implementation of [`MetadataStore`].
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    values: RwLock<BTreeMap<(RecordId, String), AttrValue>>,
    stats: OpStats,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored entries in `(record, key)` order.
    pub fn entries(&self) -> StoreResult<Vec<(RecordId, String, AttrValue)>> {
        Ok(self
            .values
            .read()?
            .iter()
            .map(|((id, key), value)| (*id, key.clone(), value.clone()))
            .collect())
    }

    pub fn stats(&self) -> &OpStats {
        &self.stats
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn get(&self, id: RecordId, key: &str) -> StoreResult<Option<AttrValue>> {
        self.stats.record_read("get metadata")?;
        Ok(self.values.read()?.get(&(id, key.to_string())).cloned())
    }

    fn update(&self, id: RecordId, key: &str, value: &AttrValue) -> StoreResult<()> {
        self.stats.record_write("update metadata")?;
        if key.is_empty() {
            return Err(StoreError::Rejected("metadata key must not be empty".into()));
        }
        self.values
            .write()?
            .insert((id, key.to_string()), value.clone());
        Ok(())
    }

    fn delete(&self, id: RecordId, key: &str) -> StoreResult<bool> {
        self.stats.record_write("delete metadata")?;
        Ok(self.values.write()?.remove(&(id, key.to_string())).is_some())
    }
}

// ---- Custom fields ----

/// An in-memory implementation of [`CustomFieldStore`].
///
/// Values are stored by field name. Internal field keys registered with
/// [`register_reference`](Self::register_reference) resolve back to their
/// field name, so a field can be addressed either way.
#[derive(Debug, Default)]
pub struct InMemoryCustomFieldStore {
    values: RwLock<BTreeMap<(RecordId, String), AttrValue>>,
    references: RwLock<BTreeMap<String, String>>,
    stats: OpStats,
}

impl InMemoryCustomFieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the internal key the store uses for field `name`.
    pub fn register_reference(&self, name: &str, field_key: &str) -> StoreResult<()> {
        self.references
            .write()?
            .insert(name.to_string(), field_key.to_string());
        Ok(())
    }

    /// All stored entries in `(record, field name)` order.
    pub fn entries(&self) -> StoreResult<Vec<(RecordId, String, AttrValue)>> {
        Ok(self
            .values
            .read()?
            .iter()
            .map(|((id, name), value)| (*id, name.clone(), value.clone()))
            .collect())
    }

    pub fn stats(&self) -> &OpStats {
        &self.stats
    }

    fn field_name(&self, key: &str) -> StoreResult<String> {
        let references = self.references.read()?;
        Ok(references
            .iter()
            .find(|(_, field_key)| field_key.as_str() == key)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| key.to_string()))
    }
}

impl CustomFieldStore for InMemoryCustomFieldStore {
    fn field_reference(&self, name: &str, _id: RecordId) -> StoreResult<Option<String>> {
        self.stats.record_read("field reference")?;
        Ok(self.references.read()?.get(name).cloned())
    }

    fn get_field(&self, key: &str, id: RecordId) -> StoreResult<Option<AttrValue>> {
        self.stats.record_read("get field")?;
        let name = self.field_name(key)?;
        Ok(self.values.read()?.get(&(id, name)).cloned())
    }

    fn update_field(&self, key: &str, value: &AttrValue, id: RecordId) -> StoreResult<()> {
        self.stats.record_write("update field")?;
        let name = self.field_name(key)?;
        self.values.write()?.insert((id, name), value.clone());
        Ok(())
    }
}

// ---- Authors ----

/// An in-memory implementation of [`AuthorDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryAuthorDirectory {
    names: RwLock<HashMap<u64, String>>,
}

impl InMemoryAuthorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_author(&self, author_id: u64, display_name: &str) -> StoreResult<()> {
        self.names
            .write()?
            .insert(author_id, display_name.to_string());
        Ok(())
    }

    pub fn authors(&self) -> StoreResult<BTreeMap<u64, String>> {
        Ok(self
            .names
            .read()?
            .iter()
            .map(|(id, name)| (*id, name.clone()))
            .collect())
    }
}

impl AuthorDirectory for InMemoryAuthorDirectory {
    fn display_name(&self, author_id: u64) -> StoreResult<Option<String>> {
        Ok(self.names.read()?.get(&author_id).cloned())
    }
}

// ---- Images ----

/// An [`ImageRenderer`] that renders `<img>` tags from a fixed table of
/// thumbnail sources.
#[derive(Debug, Default)]
pub struct StaticImageRenderer {
    sources: RwLock<HashMap<RecordId, String>>,
}

impl StaticImageRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_thumbnail(&self, id: RecordId, src: &str) -> StoreResult<()> {
        self.sources.write()?.insert(id, src.to_string());
        Ok(())
    }

    pub fn thumbnails(&self) -> StoreResult<BTreeMap<RecordId, String>> {
        Ok(self
            .sources
            .read()?
            .iter()
            .map(|(id, src)| (*id, src.clone()))
            .collect())
    }
}

impl ImageRenderer for StaticImageRenderer {
    fn featured_image(&self, id: RecordId, size: &str, attrs: &ImageAttrs) -> StoreResult<String> {
        let sources = self.sources.read()?;
        let Some(src) = sources.get(&id) else {
            return Ok(String::new());
        };

        let mut class = format!("attachment-{size} size-{size}");
        if let Some(extra) = attrs.get("class").filter(|c| !c.is_empty()) {
            class.push(' ');
            class.push_str(extra);
        }

        let mut html = format!("<img src=\"{src}\" class=\"{class}\"");
        for (name, value) in attrs.iter().filter(|(name, _)| name.as_str() != "class") {
            html.push_str(&format!(" {name}=\"{value}\""));
        }
        html.push_str(" />");
        Ok(html)
    }
}
