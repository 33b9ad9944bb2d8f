//! Visual row layout with batched-update semantics.
//!
//! [`RowLayout`] is the model a rendering surface keeps of what is on
//! screen. Mutations are staged between [`RowLayout::begin_updates`] and
//! [`RowLayout::end_updates`] and committed atomically, using the same
//! conventions as the change events that drive them:
//!
//! 1. row and section deletes use pre-batch indexes and are applied first
//!    (highest index first);
//! 2. section and row inserts use post-batch indexes and are applied after
//!    (lowest index first); an inserted section is filled from the source;
//! 3. the result must agree with the data source's counts, otherwise the
//!    batch fails with [`LayoutError::Inconsistent`] and the caller is
//!    expected to reload.
//!
//! Removed rows are kept in a small pool and handed back out for inserted
//! rows, so binding always happens on a reused value when one is available.

use std::collections::BTreeSet;

use list_types::IndexPath;
use thiserror::Error;

/// Read access a layout needs to fill rows.
pub trait RowSource<T> {
    /// Number of sections.
    fn section_count(&self) -> usize;

    /// Number of rows in `section`.
    fn row_count(&self, section: usize) -> usize;

    /// Render the record at `path` into `row`.
    fn bind_row(&self, row: &mut T, path: IndexPath);
}

/// Errors from staging or committing layout changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A mutation was staged with no open batch.
    #[error("layout mutation outside begin_updates/end_updates")]
    NoOpenBatch,

    /// `begin_updates` while a batch is already open.
    #[error("layout batch already open")]
    BatchAlreadyOpen,

    /// A staged index does not exist.
    #[error("invalid {what} index {index}")]
    InvalidIndex {
        /// Which kind of index.
        what: &'static str,
        /// The offending index, rendered.
        index: String,
    },

    /// The committed layout does not match the data source.
    #[error("inconsistent layout: expected {expected}, found {found}")]
    Inconsistent {
        /// Counts reported by the source.
        expected: String,
        /// Counts after applying the batch.
        found: String,
    },
}

#[derive(Debug, Default)]
struct PendingBatch {
    deleted_sections: BTreeSet<usize>,
    inserted_sections: BTreeSet<usize>,
    deleted_rows: BTreeSet<IndexPath>,
    inserted_rows: BTreeSet<IndexPath>,
}

/// The on-screen rows of a sectioned list.
#[derive(Debug)]
pub struct RowLayout<T> {
    sections: Vec<Vec<T>>,
    pending: Option<PendingBatch>,
    pool: Vec<T>,
}

const POOL_LIMIT: usize = 32;

impl<T: Default> RowLayout<T> {
    /// An empty layout.
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
            pending: None,
            pool: Vec::new(),
        }
    }

    /// Number of sections on screen.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Number of rows on screen in `section` (0 if it does not exist).
    pub fn row_count(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, Vec::len)
    }

    /// The row at `path`, as currently on screen.
    pub fn row(&self, path: IndexPath) -> Option<&T> {
        self.sections.get(path.section)?.get(path.row)
    }

    /// Mutable access to the row at `path`, for in-place rebinding.
    ///
    /// During an open batch this addresses the pre-batch layout.
    pub fn row_mut(&mut self, path: IndexPath) -> Option<&mut T> {
        self.sections.get_mut(path.section)?.get_mut(path.row)
    }

    /// Whether a batch is open.
    pub fn in_batch(&self) -> bool {
        self.pending.is_some()
    }

    /// Iterate over sections.
    pub fn sections(&self) -> impl Iterator<Item = &[T]> {
        self.sections.iter().map(Vec::as_slice)
    }

    /// Discard everything and rebuild from `source`.
    ///
    /// Also abandons any open batch.
    pub fn reload(&mut self, source: &dyn RowSource<T>) {
        self.pending = None;
        let old = std::mem::take(&mut self.sections);
        for row in old.into_iter().flatten() {
            self.recycle(row);
        }
        for section in 0..source.section_count() {
            let rows = self.fill_section(source, section);
            self.sections.push(rows);
        }
    }

    /// Open a batch.
    pub fn begin_updates(&mut self) -> Result<(), LayoutError> {
        if self.pending.is_some() {
            return Err(LayoutError::BatchAlreadyOpen);
        }
        self.pending = Some(PendingBatch::default());
        Ok(())
    }

    /// Stage a section insert at a post-batch index.
    pub fn insert_section(&mut self, index: usize) -> Result<(), LayoutError> {
        self.batch()?.inserted_sections.insert(index);
        Ok(())
    }

    /// Stage a section delete at a pre-batch index.
    pub fn delete_section(&mut self, index: usize) -> Result<(), LayoutError> {
        if index >= self.sections.len() {
            return Err(LayoutError::InvalidIndex {
                what: "section",
                index: index.to_string(),
            });
        }
        self.batch()?.deleted_sections.insert(index);
        Ok(())
    }

    /// Stage a row insert at a post-batch path.
    pub fn insert_row(&mut self, path: IndexPath) -> Result<(), LayoutError> {
        self.batch()?.inserted_rows.insert(path);
        Ok(())
    }

    /// Stage a row delete at a pre-batch path.
    pub fn delete_row(&mut self, path: IndexPath) -> Result<(), LayoutError> {
        if self.row(path).is_none() {
            return Err(LayoutError::InvalidIndex {
                what: "row",
                index: path.to_string(),
            });
        }
        self.batch()?.deleted_rows.insert(path);
        Ok(())
    }

    /// Commit the open batch against `source`.
    ///
    /// On any error the layout is rebuilt from `source` before returning, so
    /// the screen is consistent either way.
    pub fn end_updates(&mut self, source: &dyn RowSource<T>) -> Result<(), LayoutError> {
        let pending = self.pending.take().ok_or(LayoutError::NoOpenBatch)?;
        let result = self.apply(pending, source);
        if result.is_err() {
            self.reload(source);
        }
        result
    }

    fn apply(&mut self, pending: PendingBatch, source: &dyn RowSource<T>) -> Result<(), LayoutError> {
        for path in pending.deleted_rows.iter().rev() {
            if pending.deleted_sections.contains(&path.section) {
                continue;
            }
            let row = self.sections[path.section].remove(path.row);
            self.recycle(row);
        }
        for &index in pending.deleted_sections.iter().rev() {
            let rows = self.sections.remove(index);
            for row in rows {
                self.recycle(row);
            }
        }
        for &index in &pending.inserted_sections {
            if index > self.sections.len() {
                return Err(LayoutError::InvalidIndex {
                    what: "section",
                    index: index.to_string(),
                });
            }
            let rows = self.fill_section(source, index);
            self.sections.insert(index, rows);
        }
        for &path in &pending.inserted_rows {
            let Some(rows) = self.sections.get(path.section) else {
                return Err(LayoutError::InvalidIndex {
                    what: "row",
                    index: path.to_string(),
                });
            };
            if path.row > rows.len() {
                return Err(LayoutError::InvalidIndex {
                    what: "row",
                    index: path.to_string(),
                });
            }
            let mut row = self.dequeue();
            source.bind_row(&mut row, path);
            self.sections[path.section].insert(path.row, row);
        }
        self.check(source)
    }

    fn check(&self, source: &dyn RowSource<T>) -> Result<(), LayoutError> {
        let expected: Vec<usize> = (0..source.section_count())
            .map(|s| source.row_count(s))
            .collect();
        let found: Vec<usize> = self.sections.iter().map(Vec::len).collect();
        if expected == found {
            Ok(())
        } else {
            Err(LayoutError::Inconsistent {
                expected: format!("{:?}", expected),
                found: format!("{:?}", found),
            })
        }
    }

    fn batch(&mut self) -> Result<&mut PendingBatch, LayoutError> {
        self.pending.as_mut().ok_or(LayoutError::NoOpenBatch)
    }

    fn fill_section(&mut self, source: &dyn RowSource<T>, section: usize) -> Vec<T> {
        (0..source.row_count(section))
            .map(|row| {
                let mut value = self.dequeue();
                source.bind_row(&mut value, IndexPath::new(section, row));
                value
            })
            .collect()
    }

    fn dequeue(&mut self) -> T {
        self.pool.pop().unwrap_or_default()
    }

    fn recycle(&mut self, row: T) {
        if self.pool.len() < POOL_LIMIT {
            self.pool.push(row);
        }
    }
}

impl<T: Default> Default for RowLayout<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Default> RowLayout<T> {
    /// Snapshot of all rows.
    pub fn to_vec(&self) -> Vec<Vec<T>> {
        self.sections.clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::result_set::ResultSet;
    use list_types::{QueryDescriptor, Record, RecordId};

    /// A source backed by a fixed grid of record ids.
    pub(crate) struct FixedSource {
        pub(crate) rows: Vec<Vec<Option<RecordId>>>,
    }

    impl From<&ResultSet> for FixedSource {
        fn from(rs: &ResultSet) -> Self {
            Self {
                rows: rs
                    .sections()
                    .iter()
                    .map(|s| s.records().iter().map(|r| Some(r.id())).collect())
                    .collect(),
            }
        }
    }

    impl RowSource<Option<RecordId>> for FixedSource {
        fn section_count(&self) -> usize {
            self.rows.len()
        }

        fn row_count(&self, section: usize) -> usize {
            self.rows[section].len()
        }

        fn bind_row(&self, row: &mut Option<RecordId>, path: IndexPath) {
            *row = self.rows[path.section][path.row];
        }
    }

    fn ids(n: usize) -> Vec<Option<RecordId>> {
        (0..n).map(|_| Some(RecordId::new())).collect()
    }

    #[test]
    fn reload_copies_source() {
        let source = FixedSource {
            rows: vec![ids(2), ids(3)],
        };
        let mut layout = RowLayout::new();
        layout.reload(&source);
        assert_eq!(layout.section_count(), 2);
        assert_eq!(layout.row_count(1), 3);
        assert_eq!(layout.to_vec(), source.rows);
    }

    #[test]
    fn mutation_outside_batch_is_rejected() {
        let mut layout: RowLayout<Option<RecordId>> = RowLayout::new();
        assert_eq!(layout.insert_row(IndexPath::new(0, 0)), Err(LayoutError::NoOpenBatch));
    }

    #[test]
    fn nested_begin_is_rejected() {
        let mut layout: RowLayout<Option<RecordId>> = RowLayout::new();
        layout.begin_updates().unwrap();
        assert_eq!(layout.begin_updates(), Err(LayoutError::BatchAlreadyOpen));
    }

    #[test]
    fn deletes_use_old_indexes_and_inserts_new() {
        let before = ids(4);
        let mut source = FixedSource {
            rows: vec![before.clone()],
        };
        let mut layout = RowLayout::new();
        layout.reload(&source);

        // Remove rows 0 and 2, insert a new row at post-batch index 1.
        let fresh = Some(RecordId::new());
        source.rows = vec![vec![before[1], fresh, before[3]]];

        layout.begin_updates().unwrap();
        layout.delete_row(IndexPath::new(0, 0)).unwrap();
        layout.delete_row(IndexPath::new(0, 2)).unwrap();
        layout.insert_row(IndexPath::new(0, 1)).unwrap();
        layout.end_updates(&source).unwrap();

        assert_eq!(layout.to_vec(), source.rows);
    }

    #[test]
    fn rows_are_addressable_in_old_layout_during_batch() {
        let before = ids(2);
        let source = FixedSource {
            rows: vec![before.clone()],
        };
        let mut layout = RowLayout::new();
        layout.reload(&source);

        layout.begin_updates().unwrap();
        layout.delete_row(IndexPath::new(0, 0)).unwrap();
        assert_eq!(layout.row(IndexPath::new(0, 0)), Some(&before[0]));
    }

    #[test]
    fn inconsistent_batch_fails_and_reloads() {
        let source = FixedSource { rows: vec![ids(3)] };
        let mut layout = RowLayout::new();
        layout.reload(&source);

        let after = FixedSource { rows: vec![ids(2)] };
        layout.begin_updates().unwrap();
        let err = layout.end_updates(&after).unwrap_err();
        assert!(matches!(err, LayoutError::Inconsistent { .. }));
        assert_eq!(layout.to_vec(), after.rows);
        assert!(!layout.in_batch());
    }

    #[test]
    fn inserted_section_is_filled_from_source() {
        let existing = ids(1);
        let mut source = FixedSource {
            rows: vec![existing.clone()],
        };
        let mut layout = RowLayout::new();
        layout.reload(&source);

        source.rows = vec![ids(2), existing];
        layout.begin_updates().unwrap();
        layout.insert_section(0).unwrap();
        layout.end_updates(&source).unwrap();
        assert_eq!(layout.to_vec(), source.rows);
    }

    #[test]
    fn invalid_delete_is_rejected_when_staged() {
        let source = FixedSource { rows: vec![ids(1)] };
        let mut layout = RowLayout::new();
        layout.reload(&source);
        layout.begin_updates().unwrap();
        assert!(matches!(
            layout.delete_row(IndexPath::new(0, 5)),
            Err(LayoutError::InvalidIndex { what: "row", .. })
        ));
        assert!(layout.delete_section(3).is_err());
    }

    #[test]
    fn builds_from_result_set() {
        let q = QueryDescriptor::new("Event").sort_by("position", true);
        let rs = ResultSet::build(&q, vec![Record::new("Event").with("position", 1i64)]);
        let mut layout = RowLayout::new();
        layout.reload(&FixedSource::from(&rs));
        assert_eq!(layout.row_count(0), 1);
    }
}
