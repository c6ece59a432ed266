//! Store ports for FlexORM.
//!
//! The model core never talks to a platform directly. Every backing store is
//! an explicit collaborator described by a trait in [`traits`]:
//!
//! - [`RecordStore`] -- the content-record store holding native fields
//! - [`MetadataStore`] -- scalar key-value metadata keyed by record identity
//! - [`TaxonomyStore`] -- term assignments keyed by taxonomy and record
//! - [`CustomFieldStore`] -- named structured fields keyed by record identity
//! - [`ImageRenderer`] -- featured image markup for a record
//! - [`AuthorDirectory`] -- author display names
//!
//! # Backends
//!
//! In-memory implementations of every port live in [`memory`] and
//! [`taxonomy`]. They are intended for tests, fixtures, and embedding, and
//! support read/write failure injection so callers can exercise error paths.
//!
//! # Design Rules
//!
//! 1. All calls are blocking and run in the caller's thread.
//! 2. Reads of absent data return `Ok(None)` or an empty list, never an error.
//! 3. Backend failures are reported as [`StoreError`], never panics.

pub mod error;
pub mod memory;
pub mod taxonomy;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{
    InMemoryAuthorDirectory, InMemoryCustomFieldStore, InMemoryMetadataStore,
    InMemoryRecordStore, OpStats, StaticImageRenderer,
};
pub use taxonomy::InMemoryTaxonomyStore;
pub use traits::{
    AuthorDirectory, CustomFieldStore, ImageAttrs, ImageRenderer, MetadataStore, RecordStore,
    TaxonomyStore,
};
