//! Declarative query descriptors.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::predicate::Predicate;
use crate::record::EntitySchema;

/// Default number of records fetched per batch.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Field to sort by.
    pub field: String,
    /// Ascending (`true`) or descending.
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl SortKey {
    /// Ascending sort on `field`.
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ascending: true,
        }
    }

    /// Descending sort on `field`.
    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ascending: false,
        }
    }
}

/// Everything needed to build a result set: which entity, which records,
/// in what order, grouped how.
///
/// A descriptor is immutable once a live result set has been built from it;
/// to change the query, configure the controller again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Entity (collection) name.
    pub entity: String,
    /// Optional filter.
    pub predicate: Option<Predicate>,
    /// Ordered sort criteria.
    pub sort: Vec<SortKey>,
    /// Optional grouping field; one section per distinct value.
    pub group_by: Option<String>,
    /// Optional cache identifier, passed through to the store.
    pub cache_name: Option<String>,
    /// Fetch batch size.
    pub batch_size: usize,
}

impl QueryDescriptor {
    /// Start a descriptor for `entity` with no filter, sort or grouping.
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            predicate: None,
            sort: Vec::new(),
            group_by: None,
            cache_name: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the filter predicate.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Append a sort criterion.
    pub fn sort_by(mut self, field: &str, ascending: bool) -> Self {
        self.sort.push(SortKey {
            field: field.to_string(),
            ascending,
        });
        self
    }

    /// Replace all sort criteria.
    pub fn sort_keys(mut self, keys: Vec<SortKey>) -> Self {
        self.sort = keys;
        self
    }

    /// Group records into sections by `field`.
    pub fn group_by(mut self, field: &str) -> Self {
        self.group_by = Some(field.to_string());
        self
    }

    /// Set the cache identifier.
    pub fn cache_name(mut self, name: &str) -> Self {
        self.cache_name = Some(name.to_string());
        self
    }

    /// Set the fetch batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Whether sections are ordered descending.
    ///
    /// Sections follow the group value ascending unless the group field is
    /// also the first sort key and that key is descending.
    pub fn sections_descending(&self) -> bool {
        match (&self.group_by, self.sort.first()) {
            (Some(group), Some(first)) => first.field == *group && !first.ascending,
            _ => false,
        }
    }

    /// Check the descriptor against the entity schema.
    pub fn validate(&self, schema: &EntitySchema) -> Result<(), ConfigurationError> {
        if self.entity.trim().is_empty() {
            return Err(ConfigurationError::EmptyEntity);
        }
        if self.batch_size == 0 {
            return Err(ConfigurationError::ZeroBatchSize);
        }
        if schema.name() != self.entity {
            return Err(crate::SchemaError::UnknownEntity(self.entity.clone()).into());
        }
        for key in &self.sort {
            schema.require_field(&key.field)?;
        }
        if let Some(group) = &self.group_by {
            schema.require_field(group)?;
        }
        if let Some(predicate) = &self.predicate {
            predicate.validate(schema)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldKind;
    use crate::SchemaError;

    fn schema() -> EntitySchema {
        EntitySchema::new("Event")
            .field("position", FieldKind::Int)
            .field("timeStamp", FieldKind::Timestamp)
            .field("day", FieldKind::Text)
    }

    #[test]
    fn builder_defaults() {
        let q = QueryDescriptor::new("Event");
        assert_eq!(q.batch_size, DEFAULT_BATCH_SIZE);
        assert!(q.sort.is_empty());
        assert!(q.group_by.is_none());
    }

    #[test]
    fn valid_descriptor_passes() {
        let q = QueryDescriptor::new("Event")
            .sort_by("position", true)
            .sort_by("timeStamp", true)
            .group_by("day")
            .filter(Predicate::ge("position", 0i64))
            .cache_name("Master");
        assert!(q.validate(&schema()).is_ok());
    }

    #[test]
    fn unknown_sort_key_rejected() {
        let q = QueryDescriptor::new("Event").sort_by("rank", true);
        assert_eq!(
            q.validate(&schema()),
            Err(ConfigurationError::Schema(SchemaError::UnknownField {
                entity: "Event".into(),
                field: "rank".into(),
            }))
        );
    }

    #[test]
    fn unknown_group_key_rejected() {
        let q = QueryDescriptor::new("Event").group_by("month");
        assert!(q.validate(&schema()).is_err());
    }

    #[test]
    fn zero_batch_size_rejected() {
        let q = QueryDescriptor::new("Event").batch_size(0);
        assert_eq!(q.validate(&schema()), Err(ConfigurationError::ZeroBatchSize));
    }

    #[test]
    fn empty_entity_rejected() {
        let q = QueryDescriptor::new("  ");
        assert_eq!(q.validate(&schema()), Err(ConfigurationError::EmptyEntity));
    }

    #[test]
    fn mismatched_schema_rejected() {
        let q = QueryDescriptor::new("Note");
        assert!(matches!(
            q.validate(&schema()),
            Err(ConfigurationError::Schema(SchemaError::UnknownEntity(_)))
        ));
    }

    #[test]
    fn section_direction_follows_leading_group_sort() {
        let asc = QueryDescriptor::new("Event").group_by("day");
        assert!(!asc.sections_descending());

        let desc = QueryDescriptor::new("Event")
            .sort_by("day", false)
            .group_by("day");
        assert!(desc.sections_descending());

        let other = QueryDescriptor::new("Event")
            .sort_by("position", false)
            .group_by("day");
        assert!(!other.sections_descending());
    }
}
