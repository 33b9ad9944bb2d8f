//! # list-core
//!
//! Pure logic for livelist (no I/O, instant tests).
//!
//! This crate implements the algorithms and the state machine behind a
//! live list without any store or rendering I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no UI)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about batch protocol transitions
//!
//! The actual store access and rendering are performed by `list-controller`,
//! which interprets the surface ops produced by the dispatcher.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diff;
pub mod dispatch;
pub mod layout;
pub mod reorder;
pub mod result_set;

pub use diff::diff;
pub use dispatch::{DispatchState, RowAnimation, Signal, SurfaceOp};
pub use layout::{LayoutError, RowLayout, RowSource};
pub use reorder::{propose_move_target, reorder};
pub use result_set::{compare_records, ResultSet, Section};
