//! Rendering surface abstraction.
//!
//! A [`RenderSurface`] is the passive list view the controller drives. It
//! applies batched section/row mutations, exposes visible rows for in-place
//! rebinding, and can redraw everything from a [`RowSource`].

mod recording;

pub use recording::{RecordedOp, RecordingSurface};

use list_core::{LayoutError, RowAnimation, RowLayout, RowSource};
use list_types::IndexPath;
use tracing::warn;

/// A sectioned list view.
///
/// Section and row mutations are only valid between `begin_updates` and
/// `end_updates`. Deletes use pre-batch indexes, inserts post-batch ones.
pub trait RenderSurface {
    /// A visual row (cell) that records are bound into.
    type Row: Default;

    /// Open a batched-update scope.
    fn begin_updates(&mut self);

    /// Close the scope and apply staged mutations, binding new rows from
    /// `source`.
    fn end_updates(&mut self, source: &dyn RowSource<Self::Row>) -> Result<(), LayoutError>;

    /// Stage section inserts.
    fn insert_sections(
        &mut self,
        sections: &[usize],
        animation: RowAnimation,
    ) -> Result<(), LayoutError>;

    /// Stage section deletes.
    fn delete_sections(
        &mut self,
        sections: &[usize],
        animation: RowAnimation,
    ) -> Result<(), LayoutError>;

    /// Stage row inserts.
    fn insert_rows(&mut self, paths: &[IndexPath], animation: RowAnimation)
        -> Result<(), LayoutError>;

    /// Stage row deletes.
    fn delete_rows(&mut self, paths: &[IndexPath], animation: RowAnimation)
        -> Result<(), LayoutError>;

    /// The visible row at `path`, if any.
    fn row_mut(&mut self, path: IndexPath) -> Option<&mut Self::Row>;

    /// Discard everything and redraw from `source`.
    fn reload_data(&mut self, source: &dyn RowSource<Self::Row>);
}

impl<T: Default> RenderSurface for RowLayout<T> {
    type Row = T;

    fn begin_updates(&mut self) {
        // An already open scope stays open.
        if let Err(e) = RowLayout::begin_updates(self) {
            warn!(error = %e, "begin_updates ignored");
        }
    }

    fn end_updates(&mut self, source: &dyn RowSource<T>) -> Result<(), LayoutError> {
        RowLayout::end_updates(self, source)
    }

    fn insert_sections(
        &mut self,
        sections: &[usize],
        _animation: RowAnimation,
    ) -> Result<(), LayoutError> {
        sections.iter().try_for_each(|&s| self.insert_section(s))
    }

    fn delete_sections(
        &mut self,
        sections: &[usize],
        _animation: RowAnimation,
    ) -> Result<(), LayoutError> {
        sections.iter().try_for_each(|&s| self.delete_section(s))
    }

    fn insert_rows(&mut self, paths: &[IndexPath], _animation: RowAnimation)
        -> Result<(), LayoutError> {
        paths.iter().try_for_each(|&p| self.insert_row(p))
    }

    fn delete_rows(&mut self, paths: &[IndexPath], _animation: RowAnimation)
        -> Result<(), LayoutError> {
        paths.iter().try_for_each(|&p| self.delete_row(p))
    }

    fn row_mut(&mut self, path: IndexPath) -> Option<&mut T> {
        RowLayout::row_mut(self, path)
    }

    fn reload_data(&mut self, source: &dyn RowSource<T>) {
        self.reload(source);
    }
}
