//! # list-controller
//!
//! List controller for livelist.
//!
//! This is the library that applications use to put a live query on screen.
//!
//! ## Features
//!
//! - **Live Results**: Subscribes to a query and applies granular change batches
//! - **Minimal Redraws**: Translates changes into batched row/section primitives
//! - **Feedback Suppression**: User-driven reorders do not echo back to the surface
//! - **Store Abstraction**: Pluggable store and surface traits (in-memory, recording)
//!
//! ## Example
//!
//! ```ignore
//! use list_controller::{ListOptions, MemoryStore, RecordingSurface, SyncController};
//!
//! let controller = SyncController::new(store, RecordingSurface::new(), ListOptions::new("Cell"))?;
//! controller.configure(QueryDescriptor::new("Event").sort_by("position", true))?;
//!
//! // Delete the second row; the store's change event removes it from the surface
//! controller.commit_delete(0, 1)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod store;
pub mod surface;

pub use controller::{BeforeDeleteFn, BindRowFn, ListOptions, ReorderCommitFn, SyncController};
pub use store::{
    ChangeListener, MemoryStore, RecordStore, SharedResultSet, SnapshotError, StoreSnapshot,
    SubscriptionId,
};
pub use surface::{RecordedOp, RecordingSurface, RenderSurface};
