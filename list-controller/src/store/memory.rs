//! In-memory record store.
//!
//! Keeps records in a map, stages changes until [`RecordStore::save`], and
//! recomputes and diffs every live query on save. Also used as the test
//! double for controller tests: failures can be injected with
//! `fail_next_save` / `fail_next_query`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use list_core::{diff, ResultSet};
use list_types::{
    ChangeEvent, EntitySchema, FieldValue, PersistenceError, QueryDescriptor, QueryError, Record,
    RecordId, SchemaError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{ChangeListener, RecordStore, SharedResultSet, SubscriptionId};

/// Serializable contents of a [`MemoryStore`]: schemas and saved records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Registered entity schemas.
    pub schemas: Vec<EntitySchema>,
    /// Saved records.
    pub records: Vec<Record>,
}

/// Snapshot file errors.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Failed to read the snapshot file.
    #[error("failed to read store file {path}: {source}")]
    ReadError {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to write the snapshot file.
    #[error("failed to write store file {path}: {source}")]
    WriteError {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The store could not be encoded.
    #[error("failed to encode store: {source}")]
    EncodeError {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The snapshot file is not valid JSON for a store.
    #[error("failed to parse store file {path}: {source}")]
    ParseError {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

struct Subscription {
    descriptor: QueryDescriptor,
    result_set: SharedResultSet,
    listener: Weak<dyn ChangeListener>,
}

#[derive(Default)]
struct MemoryStoreInner {
    schemas: BTreeMap<String, EntitySchema>,
    /// Working copy, including staged changes.
    records: BTreeMap<RecordId, Record>,
    /// State as of the last successful save.
    saved: BTreeMap<RecordId, Record>,
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    next_subscription: u64,
    save_count: u64,
    fail_next_save: Option<String>,
    fail_next_query: Option<String>,
}

impl MemoryStoreInner {
    fn schema(&self, entity: &str) -> Result<&EntitySchema, SchemaError> {
        self.schemas
            .get(entity)
            .ok_or_else(|| SchemaError::UnknownEntity(entity.to_string()))
    }

    fn evaluate(&self, descriptor: &QueryDescriptor) -> Result<ResultSet, QueryError> {
        if let Some(reason) = &self.fail_next_query {
            return Err(QueryError::Failed {
                entity: descriptor.entity.clone(),
                reason: reason.clone(),
            });
        }
        let schema = self.schema(&descriptor.entity)?;
        for key in &descriptor.sort {
            schema.require_field(&key.field)?;
        }
        if let Some(group) = &descriptor.group_by {
            schema.require_field(group)?;
        }
        if let Some(predicate) = &descriptor.predicate {
            predicate.validate(schema)?;
        }
        Ok(ResultSet::build(descriptor, self.records.values().cloned()))
    }
}

/// Clonable in-memory store; clones share state.
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryStoreInner>>,
}

impl MemoryStore {
    /// Create an empty store with no schemas.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryStoreInner::default())),
        }
    }

    /// Register (or replace) an entity schema.
    pub fn register(&self, schema: EntitySchema) {
        let mut inner = self.inner.borrow_mut();
        inner.schemas.insert(schema.name().to_string(), schema);
    }

    /// Rebuild a store from a snapshot. Records count as saved.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.borrow_mut();
            for schema in snapshot.schemas {
                inner.schemas.insert(schema.name().to_string(), schema);
            }
            for record in snapshot.records {
                inner.records.insert(record.id(), record);
            }
            inner.saved = inner.records.clone();
        }
        store
    }

    /// Schemas and saved records. Staged changes are not included.
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.borrow();
        StoreSnapshot {
            schemas: inner.schemas.values().cloned().collect(),
            records: inner.saved.values().cloned().collect(),
        }
    }

    /// Load a store from a JSON snapshot file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let snapshot = serde_json::from_str(&content).map_err(|e| SnapshotError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the saved state to a JSON snapshot file, creating parent
    /// directories as needed.
    pub fn persist(&self, path: &Path) -> Result<(), SnapshotError> {
        let write_error = |e| SnapshotError::WriteError {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| SnapshotError::EncodeError { source: e })?;
        std::fs::write(path, json).map_err(write_error)
    }

    /// Number of records, including staged changes.
    pub fn record_count(&self) -> usize {
        self.inner.borrow().records.len()
    }

    /// A record by id, including staged changes.
    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.inner.borrow().records.get(&id).cloned()
    }

    /// Whether there are unsaved changes.
    pub fn has_changes(&self) -> bool {
        let inner = self.inner.borrow();
        inner.records != inner.saved
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> u64 {
        self.inner.borrow().save_count
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }

    /// Cause the next save() to fail with the given error.
    pub fn fail_next_save(&self, error: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.fail_next_save = Some(error.to_string());
    }

    /// Cause the next query (execute or subscribe) to fail with the given error.
    pub fn fail_next_query(&self, error: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.fail_next_query = Some(error.to_string());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MemoryStore")
            .field("schemas", &inner.schemas.len())
            .field("records", &inner.records.len())
            .field("subscriptions", &inner.subscriptions.len())
            .finish()
    }
}

impl RecordStore for MemoryStore {
    fn schema(&self, entity: &str) -> Option<EntitySchema> {
        self.inner.borrow().schemas.get(entity).cloned()
    }

    fn execute_query(&self, descriptor: &QueryDescriptor) -> Result<ResultSet, QueryError> {
        let mut inner = self.inner.borrow_mut();
        let result = inner.evaluate(descriptor);
        inner.fail_next_query = None;
        result
    }

    fn subscribe(
        &self,
        descriptor: QueryDescriptor,
        listener: Weak<dyn ChangeListener>,
    ) -> Result<(SubscriptionId, SharedResultSet), QueryError> {
        let mut inner = self.inner.borrow_mut();
        let evaluated = inner.evaluate(&descriptor);
        inner.fail_next_query = None;
        let result_set = Rc::new(RefCell::new(evaluated?));

        inner.next_subscription += 1;
        let id = SubscriptionId::new(inner.next_subscription);
        debug!(?id, entity = %descriptor.entity, "subscribed");
        inner.subscriptions.insert(
            id,
            Subscription {
                descriptor,
                result_set: Rc::clone(&result_set),
                listener,
            },
        );
        Ok((id, result_set))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.inner.borrow_mut().subscriptions.remove(&id).is_some() {
            debug!(?id, "unsubscribed");
        }
    }

    fn mutate_record(
        &self,
        id: RecordId,
        field: &str,
        value: FieldValue,
    ) -> Result<(), PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        let entity = match inner.records.get(&id) {
            Some(record) => record.entity().to_string(),
            None => return Err(PersistenceError::RecordNotFound(id)),
        };
        inner.schema(&entity)?.check_value(field, &value)?;
        if let Some(record) = inner.records.get_mut(&id) {
            record.set(field, value);
        }
        Ok(())
    }

    fn delete_record(&self, id: RecordId) -> Result<(), PersistenceError> {
        self.inner
            .borrow_mut()
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistenceError::RecordNotFound(id))
    }

    fn insert_record(
        &self,
        entity: &str,
        fields: BTreeMap<String, FieldValue>,
    ) -> Result<Record, PersistenceError> {
        let mut inner = self.inner.borrow_mut();
        let mut record = Record::new(entity);
        for (field, value) in fields {
            record.set(&field, value);
        }
        inner.schema(entity)?.check_record(&record)?;
        inner.records.insert(record.id(), record.clone());
        Ok(record)
    }

    fn save(&self) -> Result<(), PersistenceError> {
        let deliveries: Vec<(Weak<dyn ChangeListener>, Vec<ChangeEvent>)> = {
            let mut inner = self.inner.borrow_mut();
            if let Some(error) = inner.fail_next_save.take() {
                return Err(PersistenceError::SaveFailed(error));
            }
            inner.saved = inner.records.clone();
            inner.save_count += 1;

            inner
                .subscriptions
                .retain(|_, sub| sub.listener.strong_count() > 0);

            let mut deliveries = Vec::new();
            for (id, sub) in &inner.subscriptions {
                let next = ResultSet::build(&sub.descriptor, inner.records.values().cloned());
                let events = diff(&sub.result_set.borrow(), &next);
                *sub.result_set.borrow_mut() = next;
                trace!(?id, events = events.len(), "recomputed live query");
                if !events.is_empty() {
                    deliveries.push((sub.listener.clone(), events));
                }
            }
            deliveries
        };

        for (listener, events) in deliveries {
            let Some(listener) = listener.upgrade() else {
                continue;
            };
            listener.begin_batch();
            for event in &events {
                listener.on_change(event);
            }
            listener.end_batch();
        }
        Ok(())
    }
}
