//! JSON fixtures describing the contents of every in-memory store.
//!
//! ```json
//! {
//!   "base_url": "https://events.test",
//!   "records": [{ "id": 1, "post_title": "Launch", "post_type": "event" }],
//!   "metadata": [{ "id": 1, "key": "fp_venue", "value": "Hall A" }],
//!   "fields": [{ "id": 1, "key": "fp_image_url", "value": "/img/a.jpg" }],
//!   "field_references": { "fp_image_url": "field_5f1a" },
//!   "taxonomies": ["category"],
//!   "terms": [{ "term_id": 3, "name": "News", "slug": "news", "taxonomy": "category" }],
//!   "assignments": [{ "id": 1, "taxonomy": "category", "terms": [3] }],
//!   "authors": { "1": "Admin" },
//!   "thumbnails": { "1": "/img/hero.jpg" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use flexorm_model::InMemoryBackends;
use flexorm_store::{CustomFieldStore, InMemoryRecordStore, MetadataStore, TaxonomyStore};
use flexorm_types::{AttrValue, NativeRecord, RecordId, Term, TermRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub base_url: Option<String>,
    pub records: Vec<NativeRecord>,
    pub metadata: Vec<Entry>,
    pub fields: Vec<Entry>,
    pub field_references: BTreeMap<String, String>,
    pub taxonomies: Vec<String>,
    pub terms: Vec<Term>,
    pub assignments: Vec<Assignment>,
    pub authors: BTreeMap<u64, String>,
    pub thumbnails: BTreeMap<u64, String>,
}

/// A value in the metadata or custom-field store.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: RecordId,
    pub key: String,
    pub value: AttrValue,
}

/// The terms assigned to one record in one taxonomy.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: RecordId,
    pub taxonomy: String,
    pub terms: Vec<i64>,
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing fixture {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw + "\n")
            .with_context(|| format!("writing fixture {}", path.display()))
    }

    /// Build in-memory stores holding this fixture's contents.
    pub fn seed(&self) -> anyhow::Result<InMemoryBackends> {
        let records = match &self.base_url {
            Some(url) => InMemoryRecordStore::with_base_url(url.as_str()),
            None => InMemoryRecordStore::new(),
        };
        let stores = InMemoryBackends {
            records: Arc::new(records),
            ..InMemoryBackends::new()
        };

        for record in &self.records {
            stores.records.put(record.clone())?;
        }
        for entry in &self.metadata {
            stores.metadata.update(entry.id, &entry.key, &entry.value)?;
        }
        for (name, field_key) in &self.field_references {
            stores.fields.register_reference(name, field_key)?;
        }
        for entry in &self.fields {
            stores.fields.update_field(&entry.key, &entry.value, entry.id)?;
        }
        for taxonomy in &self.taxonomies {
            stores.taxonomy.register_taxonomy(taxonomy)?;
        }
        // Counts are rebuilt from the assignments below.
        for term in &self.terms {
            stores.taxonomy.put_term(Term {
                count: 0,
                ..term.clone()
            })?;
        }
        for assignment in &self.assignments {
            let refs: Vec<TermRef> = assignment.terms.iter().copied().map(TermRef::Id).collect();
            stores
                .taxonomy
                .set_object_terms(assignment.id, &assignment.taxonomy, &refs)?;
        }
        for (author, name) in &self.authors {
            stores.authors.add_author(*author, name)?;
        }
        for (raw, src) in &self.thumbnails {
            let id = RecordId::new(*raw).context("thumbnail record id must be non-zero")?;
            stores.images.set_thumbnail(id, src)?;
        }

        Ok(stores)
    }

    /// Snapshot the current contents of `stores`. Field references are not
    /// observable through the store and are carried over from `self`.
    pub fn capture(&self, stores: &InMemoryBackends) -> anyhow::Result<Self> {
        let entries = |rows: Vec<(RecordId, String, AttrValue)>| -> Vec<Entry> {
            rows.into_iter()
                .map(|(id, key, value)| Entry { id, key, value })
                .collect()
        };

        Ok(Self {
            base_url: self.base_url.clone(),
            records: stores.records.records()?,
            metadata: entries(stores.metadata.entries()?),
            fields: entries(stores.fields.entries()?),
            field_references: self.field_references.clone(),
            taxonomies: stores.taxonomy.taxonomies()?,
            terms: stores.taxonomy.terms()?,
            assignments: stores
                .taxonomy
                .assignments()?
                .into_iter()
                .map(|(id, taxonomy, terms)| Assignment { id, taxonomy, terms })
                .collect(),
            authors: stores.authors.authors()?,
            thumbnails: stores
                .images
                .thumbnails()?
                .into_iter()
                .map(|(id, src)| (id.get(), src))
                .collect(),
        })
    }
}
