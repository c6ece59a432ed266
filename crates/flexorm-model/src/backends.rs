//! The bundle of store ports a model reads from and writes to.

use std::fmt;
use std::sync::Arc;

use flexorm_store::{
    AuthorDirectory, CustomFieldStore, ImageRenderer, InMemoryAuthorDirectory,
    InMemoryCustomFieldStore, InMemoryMetadataStore, InMemoryRecordStore, InMemoryTaxonomyStore,
    MetadataStore, RecordStore, StaticImageRenderer, TaxonomyStore,
};

/// Every collaborator the model core depends on, injected once when a
/// model type is registered.
#[derive(Clone)]
pub struct Backends {
    pub records: Arc<dyn RecordStore>,
    pub metadata: Arc<dyn MetadataStore>,
    pub taxonomy: Arc<dyn TaxonomyStore>,
    pub fields: Arc<dyn CustomFieldStore>,
    pub images: Arc<dyn ImageRenderer>,
    pub authors: Arc<dyn AuthorDirectory>,
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

/// In-memory backends with their concrete types kept, so callers can seed
/// data and inspect operation counts.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBackends {
    pub records: Arc<InMemoryRecordStore>,
    pub metadata: Arc<InMemoryMetadataStore>,
    pub taxonomy: Arc<InMemoryTaxonomyStore>,
    pub fields: Arc<InMemoryCustomFieldStore>,
    pub images: Arc<StaticImageRenderer>,
    pub authors: Arc<InMemoryAuthorDirectory>,
}

impl InMemoryBackends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Port handles sharing this bundle's stores.
    pub fn backends(&self) -> Backends {
        Backends {
            records: self.records.clone(),
            metadata: self.metadata.clone(),
            taxonomy: self.taxonomy.clone(),
            fields: self.fields.clone(),
            images: self.images.clone(),
            authors: self.authors.clone(),
        }
    }

    /// Total writes served by the side stores (metadata, taxonomy and
    /// custom fields), not counting the record store.
    pub fn side_writes(&self) -> usize {
        self.metadata.stats().writes()
            + self.taxonomy.stats().writes()
            + self.fields.stats().writes()
    }

    /// Total reads served by the side stores.
    pub fn side_reads(&self) -> usize {
        self.metadata.stats().reads()
            + self.taxonomy.stats().reads()
            + self.fields.stats().reads()
    }
}
