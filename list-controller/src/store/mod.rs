//! Store abstraction for livelist.
//!
//! This module provides a pluggable store layer that abstracts the
//! underlying persistence and query engine (in-memory for testing and the
//! demo, anything with change tracking in production).
//!
//! # Design
//!
//! The store trait is synchronous and single-threaded:
//! - `execute_query()` evaluates a descriptor to a [`ResultSet`]
//! - `subscribe()` registers a live query and a listener for its changes
//! - `insert_record()`, `mutate_record()`, `delete_record()` stage changes
//! - `save()` commits staged changes and notifies subscribers
//!
//! During `save()` the store first updates every subscription's shared
//! result set in place, then delivers each non-empty change batch as
//! `begin_batch`, `on_change`*, `end_batch`. No store borrow is held while
//! listeners run, so listeners may call back into the store.
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryStore::new();
//! store.register(EntitySchema::new("Event").field("position", FieldKind::Int));
//! let record = store.insert_record("Event", fields)?;
//! store.save()?;
//! ```

mod memory;

pub use memory::{MemoryStore, SnapshotError, StoreSnapshot};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use list_core::ResultSet;
use list_types::{
    ChangeEvent, EntitySchema, FieldValue, PersistenceError, QueryDescriptor, QueryError, Record,
    RecordId,
};

/// A live result set shared between a store and one subscriber.
///
/// The store replaces its contents before notifying; the subscriber reads
/// it (and may replace it on reload).
pub type SharedResultSet = Rc<RefCell<ResultSet>>;

/// Handle for a live query subscription.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

/// Receiver of change batches for one subscription.
pub trait ChangeListener {
    /// A batch is about to be delivered.
    fn begin_batch(&self);

    /// One change of the current batch.
    fn on_change(&self, event: &ChangeEvent);

    /// The batch is complete.
    fn end_batch(&self);
}

/// Query engine and change source behind a list.
///
/// Implementations keep only weak listener handles, so a dropped subscriber
/// never receives events.
pub trait RecordStore {
    /// Declared schema for `entity`, if registered.
    fn schema(&self, entity: &str) -> Option<EntitySchema>;

    /// Evaluate a descriptor against the current (staged) records.
    fn execute_query(&self, descriptor: &QueryDescriptor) -> Result<ResultSet, QueryError>;

    /// Register a live query.
    ///
    /// Returns the subscription handle and the shared result set, already
    /// evaluated.
    fn subscribe(
        &self,
        descriptor: QueryDescriptor,
        listener: Weak<dyn ChangeListener>,
    ) -> Result<(SubscriptionId, SharedResultSet), QueryError>;

    /// Drop a live query. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Stage a field change on an existing record.
    fn mutate_record(
        &self,
        id: RecordId,
        field: &str,
        value: FieldValue,
    ) -> Result<(), PersistenceError>;

    /// Stage the deletion of a record.
    fn delete_record(&self, id: RecordId) -> Result<(), PersistenceError>;

    /// Stage a new record and return it.
    fn insert_record(
        &self,
        entity: &str,
        fields: BTreeMap<String, FieldValue>,
    ) -> Result<Record, PersistenceError>;

    /// Commit staged changes and notify subscribers.
    fn save(&self) -> Result<(), PersistenceError>;
}
