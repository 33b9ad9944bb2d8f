//! Terminal list surface.
//!
//! Rows are the bound text labels. Every primitive is traced at debug level
//! so `-v` shows exactly what the controller asked the view to do.

use list_controller::RenderSurface;
use list_core::{LayoutError, RowAnimation, RowLayout, RowSource};
use list_types::IndexPath;
use tracing::debug;

/// A list surface that renders to text.
#[derive(Debug, Default)]
pub struct TextSurface {
    layout: RowLayout<String>,
}

impl TextSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible rows, section by section.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.layout.to_vec()
    }

    /// Render the list, one line per row, with a header per named section.
    pub fn render(&self, section_names: &[String]) -> String {
        let rows = self.rows();
        if rows.iter().all(Vec::is_empty) {
            return "(empty)\n".to_string();
        }

        let mut out = String::new();
        for (section, labels) in rows.iter().enumerate() {
            if let Some(name) = section_names.get(section).filter(|name| !name.is_empty()) {
                out.push_str(&format!("[{}]\n", name));
            }
            for (row, label) in labels.iter().enumerate() {
                out.push_str(&format!("{:>3}  {}\n", row, label));
            }
        }
        out
    }
}

impl RenderSurface for TextSurface {
    type Row = String;

    fn begin_updates(&mut self) {
        debug!("surface: begin updates");
        RenderSurface::begin_updates(&mut self.layout);
    }

    fn end_updates(&mut self, source: &dyn RowSource<String>) -> Result<(), LayoutError> {
        debug!("surface: end updates");
        RenderSurface::end_updates(&mut self.layout, source)
    }

    fn insert_sections(
        &mut self,
        sections: &[usize],
        animation: RowAnimation,
    ) -> Result<(), LayoutError> {
        debug!(?sections, ?animation, "surface: insert sections");
        self.layout.insert_sections(sections, animation)
    }

    fn delete_sections(
        &mut self,
        sections: &[usize],
        animation: RowAnimation,
    ) -> Result<(), LayoutError> {
        debug!(?sections, ?animation, "surface: delete sections");
        self.layout.delete_sections(sections, animation)
    }

    fn insert_rows(
        &mut self,
        paths: &[IndexPath],
        animation: RowAnimation,
    ) -> Result<(), LayoutError> {
        debug!(?paths, ?animation, "surface: insert rows");
        self.layout.insert_rows(paths, animation)
    }

    fn delete_rows(
        &mut self,
        paths: &[IndexPath],
        animation: RowAnimation,
    ) -> Result<(), LayoutError> {
        debug!(?paths, ?animation, "surface: delete rows");
        self.layout.delete_rows(paths, animation)
    }

    fn row_mut(&mut self, path: IndexPath) -> Option<&mut String> {
        debug!(%path, "surface: rebind row");
        RenderSurface::row_mut(&mut self.layout, path)
    }

    fn reload_data(&mut self, source: &dyn RowSource<String>) {
        debug!("surface: reload data");
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
    fn empty_surface_renders_placeholder() {
        let surface = TextSurface::new();
        assert_eq!(surface.render(&[]), "(empty)\n");
    }

    #[test]
    fn render_numbers_rows() {
        let mut surface = TextSurface::new();
        surface.reload_data(&Labels(vec![vec!["10 - 0", "11 - 1"]]));
        assert_eq!(
            surface.render(&[String::new()]),
            "  0  10 - 0\n  1  11 - 1\n"
        );
    }

    #[test]
    fn render_names_sections() {
        let mut surface = TextSurface::new();
        surface.reload_data(&Labels(vec![vec!["a"], vec!["b"]]));
        let out = surface.render(&["home".to_string(), "work".to_string()]);
        assert_eq!(out, "[home]\n  0  a\n[work]\n  0  b\n");
    }

    #[test]
    fn repeated_begin_does_not_drop_the_batch() {
        let mut surface = TextSurface::new();
        surface.reload_data(&Labels(vec![vec!["a", "b"]]));
        surface.begin_updates();
        surface
            .delete_rows(&[IndexPath::new(0, 1)], RowAnimation::Fade)
            .unwrap();
        surface.begin_updates();
        surface.end_updates(&Labels(vec![vec!["a"]])).unwrap();
        assert_eq!(surface.rows(), vec![vec!["a".to_string()]]);
    }

    #[test]
    fn batch_applies_to_layout() {
        let mut surface = TextSurface::new();
        surface.reload_data(&Labels(vec![vec!["a", "b"]]));
        surface.begin_updates();
        surface
            .delete_rows(&[IndexPath::new(0, 0)], RowAnimation::Fade)
            .unwrap();
        surface.end_updates(&Labels(vec![vec!["b"]])).unwrap();
        assert_eq!(surface.rows(), vec![vec!["b".to_string()]]);
    }
}
