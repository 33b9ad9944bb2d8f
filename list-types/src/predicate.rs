//! Filter predicates for query descriptors.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::record::{EntitySchema, Record};
use crate::value::FieldValue;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// A boolean filter over a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Compare a field against a constant.
    Compare {
        /// Field name.
        field: String,
        /// Operator.
        op: Comparison,
        /// Right-hand side.
        value: FieldValue,
    },
    /// All sub-predicates hold. Empty is true.
    And(Vec<Predicate>),
    /// Any sub-predicate holds. Empty is false.
    Or(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    /// `field == value`
    pub fn eq(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Eq, value)
    }

    /// `field != value`
    pub fn ne(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Ne, value)
    }

    /// `field < value`
    pub fn lt(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Lt, value)
    }

    /// `field <= value`
    pub fn le(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Le, value)
    }

    /// `field > value`
    pub fn gt(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Gt, value)
    }

    /// `field >= value`
    pub fn ge(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, Comparison::Ge, value)
    }

    /// Generic comparison constructor.
    pub fn compare(field: &str, op: Comparison, value: impl Into<FieldValue>) -> Self {
        Self::Compare {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }

    /// Negate this predicate.
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Compare { field, op, value } => {
                let lhs = record.get(field);
                match op {
                    Comparison::Eq => lhs == value,
                    Comparison::Ne => lhs != value,
                    Comparison::Lt => lhs < value,
                    Comparison::Le => lhs <= value,
                    Comparison::Gt => lhs > value,
                    Comparison::Ge => lhs >= value,
                }
            }
            Predicate::And(all) => all.iter().all(|p| p.matches(record)),
            Predicate::Or(any) => any.iter().any(|p| p.matches(record)),
            Predicate::Not(inner) => !inner.matches(record),
        }
    }

    /// Check every referenced field and constant against a schema.
    pub fn validate(&self, schema: &EntitySchema) -> Result<(), SchemaError> {
        match self {
            Predicate::Compare { field, value, .. } => schema.check_value(field, value),
            Predicate::And(list) | Predicate::Or(list) => {
                list.iter().try_for_each(|p| p.validate(schema))
            }
            Predicate::Not(inner) => inner.validate(schema),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldKind;

    fn record(position: i64, title: &str) -> Record {
        Record::new("Event")
            .with("position", position)
            .with("title", title)
    }

    #[test]
    fn comparisons_evaluate() {
        let r = record(5, "x");
        assert!(Predicate::eq("position", 5i64).matches(&r));
        assert!(Predicate::ne("position", 4i64).matches(&r));
        assert!(Predicate::lt("position", 6i64).matches(&r));
        assert!(Predicate::le("position", 5i64).matches(&r));
        assert!(Predicate::gt("position", 4i64).matches(&r));
        assert!(Predicate::ge("position", 5i64).matches(&r));
        assert!(!Predicate::gt("position", 5i64).matches(&r));
    }

    #[test]
    fn combinators_evaluate() {
        let r = record(2, "keep");
        let p = Predicate::And(vec![
            Predicate::ge("position", 1i64),
            Predicate::Or(vec![
                Predicate::eq("title", "keep"),
                Predicate::eq("title", "also"),
            ]),
        ]);
        assert!(p.matches(&r));
        assert!(!p.clone().negate().matches(&r));
    }

    #[test]
    fn empty_and_is_true_empty_or_is_false() {
        let r = record(0, "");
        assert!(Predicate::And(vec![]).matches(&r));
        assert!(!Predicate::Or(vec![]).matches(&r));
    }

    #[test]
    fn missing_field_compares_as_null() {
        let r = Record::new("Event");
        assert!(Predicate::lt("position", 0i64).matches(&r));
        assert!(Predicate::eq("position", FieldValue::Null).matches(&r));
    }

    #[test]
    fn validate_walks_nested_predicates() {
        let schema = EntitySchema::new("Event").field("position", FieldKind::Int);
        let ok = Predicate::Not(Box::new(Predicate::eq("position", 1i64)));
        assert!(ok.validate(&schema).is_ok());

        let bad = Predicate::And(vec![
            Predicate::eq("position", 1i64),
            Predicate::eq("colour", "red"),
        ]);
        assert!(matches!(
            bad.validate(&schema),
            Err(SchemaError::UnknownField { .. })
        ));
    }
}
