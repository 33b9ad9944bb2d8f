//! Change events delivered by a store to its subscribers.
//!
//! Events describing one store transaction are delivered as a batch,
//! delimited by begin/end markers on the listener. Index semantics follow
//! batched-update conventions:
//! - `old_index` (deleted, updated, moved-from) refers to the layout before
//!   the batch;
//! - `new_index` (inserted, moved-to) refers to the layout after the batch.

use serde::{Deserialize, Serialize};

use crate::ids::{IndexPath, RecordId};

/// A single granular change to a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    /// A section appeared at `index` (post-batch).
    SectionInserted {
        /// Section index after the batch.
        index: usize,
    },
    /// The section at `index` (pre-batch) disappeared.
    SectionDeleted {
        /// Section index before the batch.
        index: usize,
    },
    /// A record now matches the query.
    RecordInserted {
        /// The record.
        id: RecordId,
        /// Position after the batch.
        new_index: IndexPath,
    },
    /// A record no longer matches the query.
    RecordDeleted {
        /// The record.
        id: RecordId,
        /// Position before the batch.
        old_index: IndexPath,
    },
    /// A record changed without changing its position.
    RecordUpdated {
        /// The record.
        id: RecordId,
        /// Position before the batch.
        index: IndexPath,
    },
    /// A record changed position.
    RecordMoved {
        /// The record.
        id: RecordId,
        /// Position before the batch.
        old_index: IndexPath,
        /// Position after the batch.
        new_index: IndexPath,
    },
}

impl ChangeEvent {
    /// The record this event is about, if it is a record event.
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            ChangeEvent::SectionInserted { .. } | ChangeEvent::SectionDeleted { .. } => None,
            ChangeEvent::RecordInserted { id, .. }
            | ChangeEvent::RecordDeleted { id, .. }
            | ChangeEvent::RecordUpdated { id, .. }
            | ChangeEvent::RecordMoved { id, .. } => Some(*id),
        }
    }

    /// Whether the event changes the list layout (anything but an update).
    pub fn is_structural(&self) -> bool {
        !matches!(self, ChangeEvent::RecordUpdated { .. })
    }
}
