//! Error types for livelist.
//!
//! The taxonomy follows where a failure can be handled:
//! - [`ConfigurationError`] is fatal at setup and must abort configuration.
//! - [`QueryError`] is recoverable; the previous result set stays in place.
//! - [`PersistenceError`] is reported to the caller of the mutating command.
//! - [`ProtocolViolation`] is an integration bug, recovered by a full reload.

use crate::ids::{IndexPath, RecordId};
use crate::value::FieldKind;
use thiserror::Error;

/// A query, record or mutation does not match the entity schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No schema is registered under this entity name.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// The entity does not declare this field.
    #[error("entity {entity} has no field {field}")]
    UnknownField {
        /// Entity name.
        entity: String,
        /// Offending field name.
        field: String,
    },

    /// The value kind does not match the declared field kind.
    #[error("field {entity}.{field} expects {expected}, got {actual}")]
    TypeMismatch {
        /// Entity name.
        entity: String,
        /// Field name.
        field: String,
        /// Declared kind.
        expected: FieldKind,
        /// Kind of the supplied value.
        actual: FieldKind,
    },
}

/// Setup errors. A controller that hits one of these stays unconfigured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The cell reuse identifier was not supplied.
    #[error("cell reuse identifier is not set")]
    MissingReuseIdentifier,

    /// The query names no entity.
    #[error("query entity name is empty")]
    EmptyEntity,

    /// Batch size of zero.
    #[error("batch size must be greater than zero")]
    ZeroBatchSize,

    /// The query does not match the entity schema.
    #[error("invalid query descriptor: {0}")]
    Schema(#[from] SchemaError),

    /// The operation requires a configured controller.
    #[error("controller is not configured")]
    NotConfigured,
}

/// Query execution failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The store could not execute the query.
    #[error("query on {entity} failed: {reason}")]
    Failed {
        /// Entity being queried.
        entity: String,
        /// Store-supplied reason.
        reason: String,
    },

    /// The query does not match the entity schema.
    #[error("query rejected: {0}")]
    Schema(#[from] SchemaError),
}

/// A store mutation or save failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// The store rejected the save.
    #[error("save failed: {0}")]
    SaveFailed(String),

    /// The record does not exist (or was already deleted).
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    /// The mutation does not match the entity schema.
    #[error("invalid mutation: {0}")]
    Schema(#[from] SchemaError),
}

impl PersistenceError {
    /// Create a save failure with the given message.
    pub fn save_failed(message: impl Into<String>) -> Self {
        Self::SaveFailed(message.into())
    }
}

/// The store and the controller disagree about the batch protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// The suppression flag changed while a batch was open.
    #[error("suppression flag changed while a change batch was open")]
    SuppressionChangedMidBatch,

    /// A change event arrived with no open batch.
    #[error("change event delivered outside a batch")]
    ChangeOutsideBatch,

    /// A batch began before the previous one ended.
    #[error("change batch began while another batch was open")]
    NestedBatch,

    /// A batch ended that was never opened.
    #[error("change batch ended with no open batch")]
    UnmatchedBatchEnd,
}

/// A section or row index is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Section index out of range.
    #[error("section {section} out of range (sections: {count})")]
    Section {
        /// Requested section.
        section: usize,
        /// Number of sections.
        count: usize,
    },

    /// Row index out of range.
    #[error("row {row} out of range in section {section} (rows: {count})")]
    Row {
        /// Section of the request.
        section: usize,
        /// Requested row.
        row: usize,
        /// Number of rows in the section.
        count: usize,
    },
}

/// Errors returned by list controller operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// Setup error.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Query execution error.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// Store mutation or save error.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Batch protocol violation.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// Index out of range.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// A move between sections, or to a row outside the section.
    #[error("move rejected: {from} -> {to}")]
    MoveRejected {
        /// Source path.
        from: IndexPath,
        /// Requested destination.
        to: IndexPath,
    },
}

/// Result type alias for list operations.
pub type Result<T> = std::result::Result<T, ListError>;
