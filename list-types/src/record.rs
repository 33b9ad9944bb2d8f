//! Records and entity schemas.
//!
//! A record is a typed mapping from declared field names to values. The set
//! of fields an entity may carry is fixed by its [`EntitySchema`]; stores
//! validate inserts and mutations against it, and queries are validated
//! against it before a result set is built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SchemaError;
use crate::ids::RecordId;
use crate::value::{FieldKind, FieldValue};

static NULL: FieldValue = FieldValue::Null;

/// Declared shape of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    name: String,
    fields: BTreeMap<String, FieldKind>,
}

impl EntitySchema {
    /// Create a schema with no fields.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: BTreeMap::new(),
        }
    }

    /// Declare a field.
    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.insert(name.to_string(), kind);
        self
    }

    /// Entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind of a field.
    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }

    /// Iterate over declared fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Check that `field` is declared, returning its kind.
    pub fn require_field(&self, field: &str) -> Result<FieldKind, SchemaError> {
        self.kind_of(field).ok_or_else(|| SchemaError::UnknownField {
            entity: self.name.clone(),
            field: field.to_string(),
        })
    }

    /// Check that `value` may be stored in `field`.
    pub fn check_value(&self, field: &str, value: &FieldValue) -> Result<(), SchemaError> {
        let expected = self.require_field(field)?;
        match value.kind() {
            Some(actual) if actual != expected => Err(SchemaError::TypeMismatch {
                entity: self.name.clone(),
                field: field.to_string(),
                expected,
                actual,
            }),
            _ => Ok(()),
        }
    }

    /// Check every field of a record.
    pub fn check_record(&self, record: &Record) -> Result<(), SchemaError> {
        if record.entity() != self.name {
            return Err(SchemaError::UnknownEntity(record.entity().to_string()));
        }
        for (field, value) in record.fields() {
            self.check_value(field, value)?;
        }
        Ok(())
    }
}

/// A persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    entity: String,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record of the given entity with a fresh id.
    pub fn new(entity: &str) -> Self {
        Self::with_id(RecordId::new(), entity)
    }

    /// Create an empty record with a known id.
    pub fn with_id(id: RecordId, entity: &str) -> Self {
        Self {
            id,
            entity: entity.to_string(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Record identity.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Entity name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Value of a field; missing fields read as `Null`.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Set a field. Setting `Null` removes it.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        if value.is_null() {
            self.fields.remove(field);
        } else {
            self.fields.insert(field.to_string(), value);
        }
    }

    /// Iterate over present fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Whether two versions of a record carry the same field values.
    pub fn same_content(&self, other: &Record) -> bool {
        self.fields == other.fields
    }
}
