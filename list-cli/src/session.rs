//! One CLI invocation's view of the list.
//!
//! Opens the persisted store, wires a [`SyncController`] to a
//! [`TextSurface`] the way an application screen would, and writes the
//! store back after a command.

use anyhow::{Context, Result};
use list_controller::{MemoryStore, RecordStore, SyncController};
use list_types::{FieldValue, Record};
use std::cell::{Cell, Ref};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

use crate::config::{Config, POSITION_FIELD, TIMESTAMP_FIELD};
use crate::surface::TextSurface;

/// Store file name in the data directory.
pub const STORE_FILE: &str = "store.json";

/// Controller type used by the CLI.
pub type Controller = SyncController<MemoryStore, TextSurface>;

/// An open list backed by `store.json`.
pub struct Session {
    store: MemoryStore,
    store_path: PathBuf,
    controller: Controller,
    item_count: Rc<Cell<usize>>,
}

impl Session {
    /// Open the data directory's store and load the configured list.
    pub fn open(data_dir: &Path, config: &Config) -> Result<Self> {
        let store_path = data_dir.join(STORE_FILE);
        let store = if store_path.exists() {
            MemoryStore::load(&store_path)
                .with_context(|| format!("Failed to load store {}", store_path.display()))?
        } else {
            debug!(path = %store_path.display(), "no store yet, starting empty");
            MemoryStore::new()
        };
        store.register(config.list.schema());

        let item_count = Rc::new(Cell::new(0usize));
        let counter = item_count.clone();
        let sink = store.clone();

        let options = config.list.options();
        let controller = SyncController::new(store.clone(), TextSurface::new(), options)
            .context("Invalid list options")?
            .with_bind_row(|row: &mut String, _path, record: &Record| {
                *row = row_label(record);
            })
            .with_reorder_commit(move |records: &[Record]| {
                for (position, record) in records.iter().enumerate() {
                    sink.mutate_record(
                        record.id(),
                        POSITION_FIELD,
                        FieldValue::Int(position as i64),
                    )?;
                }
                sink.save()
            })
            .with_before_delete(move |_record: &Record| {
                counter.set(counter.get().saturating_sub(1));
            });

        controller
            .configure(config.list.descriptor())
            .context("Failed to load list")?;
        item_count.set(controller.fetched_records().len());

        Ok(Self {
            store,
            store_path,
            controller,
            item_count,
        })
    }

    /// The list controller.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Path of the persisted store.
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Number of items the list believes it holds.
    pub fn item_count(&self) -> usize {
        self.item_count.get()
    }

    /// Claim the position for a new item.
    pub fn next_position(&self) -> usize {
        let position = self.item_count.get();
        self.item_count.set(position + 1);
        position
    }

    /// Write saved store state to disk.
    pub fn persist(&self) -> Result<()> {
        self.store
            .persist(&self.store_path)
            .with_context(|| format!("Failed to write store {}", self.store_path.display()))
    }

    /// The surface as text.
    pub fn render(&self) -> String {
        let names: Vec<String> = (0..self.controller.section_count())
            .map(|section| self.controller.section_name(section).unwrap_or_default())
            .collect();
        self.surface().render(&names)
    }

    fn surface(&self) -> Ref<'_, TextSurface> {
        self.controller.surface()
    }
}

/// Row text for an event: `"<timeStamp> - <position>"`.
pub fn row_label(record: &Record) -> String {
    format!(
        "{} - {}",
        record.get(TIMESTAMP_FIELD),
        record.get(POSITION_FIELD)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use list_types::IndexPath;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn event(ts: u64, position: i64) -> BTreeMap<String, FieldValue> {
        BTreeMap::from([
            (TIMESTAMP_FIELD.to_string(), FieldValue::Timestamp(ts)),
            (POSITION_FIELD.to_string(), FieldValue::Int(position)),
        ])
    }

    #[test]
    fn open_empty_data_dir() {
        let dir = tempdir().unwrap();
        let session = Session::open(dir.path(), &Config::default()).unwrap();
        assert_eq!(session.item_count(), 0);
        assert_eq!(session.render(), "(empty)\n");
        assert!(!session.store_path().exists());
    }

    #[test]
    fn inserted_rows_are_bound_and_persisted() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        {
            let session = Session::open(dir.path(), &config).unwrap();
            session.controller().insert_record(event(100, 0)).unwrap();
            session.controller().insert_record(event(200, 1)).unwrap();
            assert_eq!(session.render(), "  0  100 - 0\n  1  200 - 1\n");
            session.persist().unwrap();
        }

        let session = Session::open(dir.path(), &config).unwrap();
        assert_eq!(session.item_count(), 2);
        assert_eq!(session.next_position(), 2);
        assert_eq!(session.item_count(), 3);
    }

    #[test]
    fn move_rewrites_positions_without_redraw() {
        let dir = tempdir().unwrap();
        let session = Session::open(dir.path(), &Config::default()).unwrap();
        for i in 0..3 {
            session
                .controller()
                .insert_record(event(100 + i, i as i64))
                .unwrap();
        }

        session
            .controller()
            .commit_move(IndexPath::new(0, 0), IndexPath::new(0, 2))
            .unwrap();
        // Notifications were suppressed; the surface is untouched until reloaded.
        assert_eq!(session.render(), "  0  100 - 0\n  1  101 - 1\n  2  102 - 2\n");

        session.controller().reload().unwrap();
        assert_eq!(session.render(), "  0  101 - 0\n  1  102 - 1\n  2  100 - 2\n");
    }

    #[test]
    fn delete_decrements_item_count() {
        let dir = tempdir().unwrap();
        let session = Session::open(dir.path(), &Config::default()).unwrap();
        session.controller().insert_record(event(100, 0)).unwrap();
        session.controller().insert_record(event(200, 1)).unwrap();
        let session = {
            session.persist().unwrap();
            drop(session);
            Session::open(dir.path(), &Config::default()).unwrap()
        };

        session.controller().commit_delete(0, 0).unwrap();
        assert_eq!(session.item_count(), 1);
        assert_eq!(session.render(), "  0  200 - 1\n");
    }
}
