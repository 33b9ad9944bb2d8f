//! # list-types
//!
//! Data model types for livelist, a controller that keeps a sectioned list
//! UI in step with a query-backed, change-observing store.
//!
//! This crate provides the foundational types used across all livelist crates:
//! - [`RecordId`], [`IndexPath`] - Identity and position types
//! - [`FieldValue`], [`Record`], [`EntitySchema`] - Typed records
//! - [`Predicate`], [`QueryDescriptor`] - Declarative queries
//! - [`ChangeEvent`] - Granular result-set changes
//! - [`ListError`] - Error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

mod change;
mod error;
mod ids;
mod predicate;
mod query;
mod record;
mod value;

pub use change::ChangeEvent;
pub use error::{
    ConfigurationError, IndexError, ListError, PersistenceError, ProtocolViolation, QueryError,
    Result, SchemaError,
};
pub use ids::{IndexPath, RecordId};
pub use predicate::{Comparison, Predicate};
pub use query::{QueryDescriptor, SortKey, DEFAULT_BATCH_SIZE};
pub use record::{EntitySchema, Record};
pub use value::{FieldKind, FieldValue};
