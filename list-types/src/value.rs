//! Typed field values for records.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The declared kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// `true` / `false`.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// UTF-8 text.
    Text,
    /// Unix timestamp in seconds.
    Timestamp,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Text => "text",
            FieldKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single field value.
///
/// Values are totally ordered so they can serve as sort and grouping keys:
/// `Null < Bool < Int < Timestamp < Text`, natural order within a kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Absent value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
    /// Unix timestamp in seconds.
    Timestamp(u64),
}

impl FieldValue {
    /// The kind of this value, or `None` for `Null`.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(_) => Some(FieldKind::Bool),
            FieldValue::Int(_) => Some(FieldKind::Int),
            FieldValue::Text(_) => Some(FieldKind::Text),
            FieldValue::Timestamp(_) => Some(FieldKind::Timestamp),
        }
    }

    /// Whether this value may be stored in a field of the given kind.
    ///
    /// `Null` fits any kind.
    pub fn fits(&self, kind: FieldKind) -> bool {
        self.kind().map_or(true, |k| k == kind)
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if this is `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Timestamp payload, if this is a `Timestamp`.
    pub fn as_timestamp(&self) -> Option<u64> {
        match self {
            FieldValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Int(_) => 2,
            FieldValue::Timestamp(_) => 3,
            FieldValue::Text(_) => 4,
        }
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Timestamp(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_within_kind_is_natural() {
        assert!(FieldValue::Int(1) < FieldValue::Int(2));
        assert!(FieldValue::Text("a".into()) < FieldValue::Text("b".into()));
        assert!(FieldValue::Timestamp(10) < FieldValue::Timestamp(11));
        assert!(FieldValue::Bool(false) < FieldValue::Bool(true));
    }

    #[test]
    fn null_sorts_first() {
        assert!(FieldValue::Null < FieldValue::Bool(false));
        assert!(FieldValue::Null < FieldValue::Int(i64::MIN));
        assert!(FieldValue::Null < FieldValue::Text(String::new()));
    }

    #[test]
    fn cross_kind_order_is_by_rank() {
        assert!(FieldValue::Int(i64::MAX) < FieldValue::Timestamp(0));
        assert!(FieldValue::Timestamp(u64::MAX) < FieldValue::Text(String::new()));
    }

    #[test]
    fn null_fits_every_kind() {
        assert!(FieldValue::Null.fits(FieldKind::Int));
        assert!(FieldValue::Null.fits(FieldKind::Text));
        assert!(FieldValue::Int(3).fits(FieldKind::Int));
        assert!(!FieldValue::Int(3).fits(FieldKind::Text));
    }

    #[test]
    fn serde_uses_tagged_form() {
        let json = serde_json::to_string(&FieldValue::Int(7)).unwrap();
        assert_eq!(json, r#"{"kind":"int","value":7}"#);
        let back: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FieldValue::Int(7));
    }

    #[test]
    fn display_renders_payload() {
        assert_eq!(FieldValue::Int(-4).to_string(), "-4");
        assert_eq!(FieldValue::Text("hi".into()).to_string(), "hi");
        assert_eq!(FieldValue::Null.to_string(), "");
    }
}
