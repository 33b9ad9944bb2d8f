//! Recording surface for testing.
//!
//! Wraps a real [`RowLayout`] so batches are checked against the data
//! source, and captures every primitive for verification.

use list_core::{LayoutError, RowAnimation, RowLayout, RowSource};
use list_types::IndexPath;

use super::RenderSurface;

/// A primitive applied to a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    /// `begin_updates`.
    BeginUpdates,
    /// `end_updates`.
    EndUpdates,
    /// `insert_sections`.
    InsertSections(Vec<usize>, RowAnimation),
    /// `delete_sections`.
    DeleteSections(Vec<usize>, RowAnimation),
    /// `insert_rows`.
    InsertRows(Vec<IndexPath>, RowAnimation),
    /// `delete_rows`.
    DeleteRows(Vec<IndexPath>, RowAnimation),
    /// A row was handed out through `row_mut`.
    RowAccess(IndexPath),
    /// `reload_data`.
    ReloadData,
}

impl RecordedOp {
    /// Whether this op inserts or deletes sections or rows.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RecordedOp::InsertSections(..)
                | RecordedOp::DeleteSections(..)
                | RecordedOp::InsertRows(..)
                | RecordedOp::DeleteRows(..)
        )
    }
}

/// Surface double: rows are plain strings.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    layout: RowLayout<String>,
    ops: Vec<RecordedOp>,
}

impl RecordingSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// All primitives applied so far.
    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    /// Forget recorded primitives (the layout is kept).
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of `reload_data` calls recorded.
    pub fn reload_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, RecordedOp::ReloadData))
            .count()
    }

    /// Visible rows, section by section.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.layout.to_vec()
    }
}

impl RenderSurface for RecordingSurface {
    type Row = String;

    fn begin_updates(&mut self) {
        self.ops.push(RecordedOp::BeginUpdates);
        RenderSurface::begin_updates(&mut self.layout);
    }

    fn end_updates(&mut self, source: &dyn RowSource<String>) -> Result<(), LayoutError> {
        self.ops.push(RecordedOp::EndUpdates);
        RenderSurface::end_updates(&mut self.layout, source)
    }

    fn insert_sections(
        &mut self,
        sections: &[usize],
        animation: RowAnimation,
    ) -> Result<(), LayoutError> {
        self.ops
            .push(RecordedOp::InsertSections(sections.to_vec(), animation));
        self.layout.insert_sections(sections, animation)
    }

    fn delete_sections(
        &mut self,
        sections: &[usize],
        animation: RowAnimation,
    ) -> Result<(), LayoutError> {
        self.ops
            .push(RecordedOp::DeleteSections(sections.to_vec(), animation));
        self.layout.delete_sections(sections, animation)
    }

    fn insert_rows(
        &mut self,
        paths: &[IndexPath],
        animation: RowAnimation,
    ) -> Result<(), LayoutError> {
        self.ops
            .push(RecordedOp::InsertRows(paths.to_vec(), animation));
        self.layout.insert_rows(paths, animation)
    }

    fn delete_rows(
        &mut self,
        paths: &[IndexPath],
        animation: RowAnimation,
    ) -> Result<(), LayoutError> {
        self.ops
            .push(RecordedOp::DeleteRows(paths.to_vec(), animation));
        self.layout.delete_rows(paths, animation)
    }

    fn row_mut(&mut self, path: IndexPath) -> Option<&mut String> {
        self.ops.push(RecordedOp::RowAccess(path));
        RenderSurface::row_mut(&mut self.layout, path)
    }

    fn reload_data(&mut self, source: &dyn RowSource<String>) {
        self.ops.push(RecordedOp::ReloadData);
        self.layout.reload_data(source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Labels(Vec<Vec<&'static str>>);

    impl RowSource<String> for Labels {
        fn section_count(&self) -> usize {
            self.0.len()
        }
        fn row_count(&self, section: usize) -> usize {
            self.0[section].len()
        }
        fn bind_row(&self, row: &mut String, path: IndexPath) {
            *row = self.0[path.section][path.row].to_string();
        }
    }

    #[test]
    fn records_batch_primitives() {
        let mut surface = RecordingSurface::new();
        surface.reload_data(&Labels(vec![vec!["a"]]));
        surface.begin_updates();
        surface
            .insert_rows(&[IndexPath::new(0, 1)], RowAnimation::Fade)
            .unwrap();
        surface.end_updates(&Labels(vec![vec!["a", "b"]])).unwrap();

        assert_eq!(
            surface.ops(),
            &[
                RecordedOp::ReloadData,
                RecordedOp::BeginUpdates,
                RecordedOp::InsertRows(vec![IndexPath::new(0, 1)], RowAnimation::Fade),
                RecordedOp::EndUpdates,
            ]
        );
        assert_eq!(surface.rows(), vec![vec!["a".to_string(), "b".to_string()]]);
        assert_eq!(surface.reload_count(), 1);
    }

    #[test]
    fn staging_outside_batch_fails() {
        let mut surface = RecordingSurface::new();
        assert_eq!(
            surface.insert_sections(&[0], RowAnimation::Fade),
            Err(LayoutError::NoOpenBatch)
        );
        assert!(surface.ops()[0].is_structural());
    }

    #[test]
    fn second_begin_keeps_staged_primitives() {
        let mut surface = RecordingSurface::new();
        surface.reload_data(&Labels(vec![vec!["a"]]));
        surface.begin_updates();
        surface
            .insert_rows(&[IndexPath::new(0, 1)], RowAnimation::Fade)
            .unwrap();
        surface.begin_updates();
        surface.end_updates(&Labels(vec![vec!["a", "b"]])).unwrap();

        assert_eq!(surface.rows(), vec![vec!["a".to_string(), "b".to_string()]]);
        assert_eq!(surface.reload_count(), 1);
    }

    #[test]
    fn row_access_is_recorded() {
        let mut surface = RecordingSurface::new();
        surface.reload_data(&Labels(vec![vec!["a"]]));
        surface.clear_ops();
        if let Some(row) = surface.row_mut(IndexPath::new(0, 0)) {
            row.push('!');
        }
        assert_eq!(surface.rows(), vec![vec!["a!".to_string()]]);
        assert_eq!(surface.ops(), &[RecordedOp::RowAccess(IndexPath::new(0, 0))]);
    }
}
