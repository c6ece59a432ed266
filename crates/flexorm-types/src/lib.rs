//! Foundation types for FlexORM.
//!
//! This crate provides the identity, value, and record types shared by the
//! store ports and the model core. Every other FlexORM crate depends on
//! `flexorm-types`.
//!
//! # Key Types
//!
//! - [`RecordId`] -- Identity of a persisted content record
//! - [`AttrValue`] -- Dynamic value held by a model attribute
//! - [`Term`] -- A taxonomy term object as returned by the taxonomy store
//! - [`TermRef`] -- A sanitized term reference (id or slug) used for assignment
//! - [`NativeRecord`] -- The full native field set of a content record
//! - [`NewRecord`] -- The minimal payload used to create a content record

pub mod error;
pub mod id;
pub mod record;
pub mod value;

pub use error::TypeError;
pub use id::RecordId;
pub use record::{NativeRecord, NewRecord, NATIVE_FIELDS};
pub use value::{AttrValue, Term, TermRef};
