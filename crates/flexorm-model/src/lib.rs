//! Attribute resolution and persistence engine for FlexORM models.
//!
//! A model type declares attributes whose values live in different stores:
//! native fields on the content record, custom fields, taxonomy terms, or
//! scalar metadata. This crate provides:
//! - [`ModelSchema`]: the immutable attribute registry, built in code or from TOML
//! - [`Model`]: a schema bound to its store ports, and the record factories
//! - [`Record`]: lazy loading on read, dirty tracking on write, and
//!   `persist()` writing back only what changed
//! - Convention-named dispatch (`getPostTitle`, `theVenueFormatted`,
//!   `setEventType`) through [`Record::call`]
//! - `date()`-style timestamp formatting in [`format`]

pub mod backends;
pub mod config;
pub mod descriptor;
pub mod dirty;
mod dispatch;
pub mod error;
pub mod format;
mod loader;
pub mod model;
pub mod naming;
mod persist;
pub mod record;
pub mod schema;

pub use backends::{Backends, InMemoryBackends};
pub use config::{KeyPrefixes, LoadFailurePolicy, ModelConfig, PersistDefaults};
pub use descriptor::{AttributeDescriptor, StorageKind};
pub use dirty::DirtySet;
pub use error::{ModelError, ModelResult};
pub use model::Model;
pub use naming::{parse_operation, underscored, Action, Operation};
pub use record::{ReadOptions, Record};
pub use schema::{AttributeSlot, ModelSchema, SchemaBuilder};
