//! Identity and position types for livelist.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a record in a store.
///
/// UUID v4 format (16 bytes). Two records are the same record exactly when
/// their ids are equal, regardless of field contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    /// Create a new random RecordId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create a RecordId from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        uuid::Uuid::from_slice(bytes).ok().map(Self)
    }

    /// Get the raw bytes of this RecordId.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", &self.to_string()[..8])
    }
}

/// Zero-based `(section, row)` coordinates in a result set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct IndexPath {
    /// Section index.
    pub section: usize,
    /// Row index within the section.
    pub row: usize,
}

impl IndexPath {
    /// Create a new index path.
    pub const fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.row)
    }
}

impl From<(usize, usize)> for IndexPath {
    fn from((section, row): (usize, usize)) -> Self {
        Self { section, row }
    }
}
