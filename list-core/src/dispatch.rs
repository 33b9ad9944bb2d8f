//! Change-dispatch state machine.
//!
//! This module turns the store's change notifications into rendering
//! primitives. It is a pure state machine: it takes a [`Signal`] plus the
//! current value of the controller's suppression flag and produces the next
//! state and a list of [`SurfaceOp`]s for the caller to execute.
//!
//! The actual rendering is performed by the controller, not by this module.

use list_types::{ChangeEvent, IndexPath, ProtocolViolation, RecordId};

/// Animation hint attached to structural primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowAnimation {
    /// Cross-fade the affected rows.
    #[default]
    Fade,
}

/// Where the dispatcher is in the batch protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    /// No batch open.
    #[default]
    Idle,
    /// A batch is open and the surface is inside `begin_updates`.
    BatchOpen,
    /// A batch began while suppression was on; its events are discarded.
    Suppressed,
    /// A violation occurred in the current batch; the rest of it is
    /// discarded and the surface is reloaded when it ends.
    Poisoned {
        /// Whether the surface is inside `begin_updates` and must be closed.
        surface_open: bool,
    },
}

/// Input to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The store is about to deliver a batch.
    BatchBegin,
    /// One change of the current batch.
    Change(ChangeEvent),
    /// The store finished delivering a batch.
    BatchEnd,
}

/// A rendering primitive (or side effect) requested by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOp {
    /// Open a batched-update scope.
    BeginUpdates,
    /// Close the batched-update scope.
    EndUpdates,
    /// Insert a section at a post-batch index.
    InsertSection {
        /// Section index.
        index: usize,
        /// Animation hint.
        animation: RowAnimation,
    },
    /// Delete a section at a pre-batch index.
    DeleteSection {
        /// Section index.
        index: usize,
        /// Animation hint.
        animation: RowAnimation,
    },
    /// Insert a row at a post-batch path.
    InsertRow {
        /// Row path.
        path: IndexPath,
        /// Animation hint.
        animation: RowAnimation,
    },
    /// Delete a row at a pre-batch path.
    DeleteRow {
        /// Row path.
        path: IndexPath,
        /// Animation hint.
        animation: RowAnimation,
    },
    /// Re-render the visible row at `path` in place.
    RebindRow {
        /// The updated record.
        id: RecordId,
        /// Pre-batch path of the visible row.
        path: IndexPath,
    },
    /// Re-execute the query and redraw everything.
    ForceReload,
    /// Report a protocol violation.
    Report(ProtocolViolation),
}

impl SurfaceOp {
    /// Whether this op inserts or deletes sections or rows.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SurfaceOp::InsertSection { .. }
                | SurfaceOp::DeleteSection { .. }
                | SurfaceOp::InsertRow { .. }
                | SurfaceOp::DeleteRow { .. }
        )
    }
}

impl DispatchState {
    /// Create a dispatcher in the `Idle` state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process a signal and return the new state plus ops to execute.
    ///
    /// `suppressed` is the suppression flag as observed when the signal
    /// arrives.
    pub fn on_signal(self, signal: Signal, suppressed: bool) -> (Self, Vec<SurfaceOp>) {
        use ProtocolViolation::*;

        match (self, signal) {
            // From Idle
            (Self::Idle, Signal::BatchBegin) if suppressed => (Self::Suppressed, vec![]),
            (Self::Idle, Signal::BatchBegin) => (Self::BatchOpen, vec![SurfaceOp::BeginUpdates]),
            (Self::Idle, Signal::Change(_)) => (Self::Idle, recover(ChangeOutsideBatch, suppressed)),
            (Self::Idle, Signal::BatchEnd) => (Self::Idle, recover(UnmatchedBatchEnd, suppressed)),

            // From BatchOpen
            (Self::BatchOpen, Signal::BatchBegin) => (
                Self::Poisoned { surface_open: true },
                vec![SurfaceOp::Report(NestedBatch)],
            ),
            (Self::BatchOpen, Signal::Change(_)) if suppressed => (
                Self::Poisoned { surface_open: true },
                vec![SurfaceOp::Report(SuppressionChangedMidBatch)],
            ),
            (Self::BatchOpen, Signal::Change(event)) => (Self::BatchOpen, translate(event)),
            (Self::BatchOpen, Signal::BatchEnd) if suppressed => (
                Self::Idle,
                vec![
                    SurfaceOp::Report(SuppressionChangedMidBatch),
                    SurfaceOp::EndUpdates,
                    SurfaceOp::ForceReload,
                ],
            ),
            (Self::BatchOpen, Signal::BatchEnd) => (Self::Idle, vec![SurfaceOp::EndUpdates]),

            // From Suppressed
            (Self::Suppressed, Signal::BatchBegin) => (
                Self::Poisoned {
                    surface_open: false,
                },
                vec![SurfaceOp::Report(NestedBatch)],
            ),
            (Self::Suppressed, Signal::Change(_)) if suppressed => (Self::Suppressed, vec![]),
            (Self::Suppressed, Signal::Change(_)) => (
                Self::Poisoned {
                    surface_open: false,
                },
                vec![SurfaceOp::Report(SuppressionChangedMidBatch)],
            ),
            (Self::Suppressed, Signal::BatchEnd) if suppressed => (Self::Idle, vec![]),
            (Self::Suppressed, Signal::BatchEnd) => (
                Self::Idle,
                vec![
                    SurfaceOp::Report(SuppressionChangedMidBatch),
                    SurfaceOp::ForceReload,
                ],
            ),

            // From Poisoned
            (state @ Self::Poisoned { .. }, Signal::BatchBegin) => {
                (state, vec![SurfaceOp::Report(NestedBatch)])
            }
            (state @ Self::Poisoned { .. }, Signal::Change(_)) => (state, vec![]),
            // Nothing reached the surface and the controller is still
            // mutating; the violation was reported when it happened.
            (
                Self::Poisoned {
                    surface_open: false,
                },
                Signal::BatchEnd,
            ) if suppressed => (Self::Idle, vec![]),
            (Self::Poisoned { surface_open }, Signal::BatchEnd) => {
                let mut ops = Vec::with_capacity(2);
                if surface_open {
                    ops.push(SurfaceOp::EndUpdates);
                }
                ops.push(SurfaceOp::ForceReload);
                (Self::Idle, ops)
            }
        }
    }

    /// Check if a batch is being delivered.
    pub fn in_batch(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

fn recover(violation: ProtocolViolation, suppressed: bool) -> Vec<SurfaceOp> {
    // While suppressed the controller is the one mutating; it redraws itself.
    if suppressed {
        vec![SurfaceOp::Report(violation)]
    } else {
        vec![SurfaceOp::Report(violation), SurfaceOp::ForceReload]
    }
}

fn translate(event: ChangeEvent) -> Vec<SurfaceOp> {
    let animation = RowAnimation::Fade;
    match event {
        ChangeEvent::SectionInserted { index } => {
            vec![SurfaceOp::InsertSection { index, animation }]
        }
        ChangeEvent::SectionDeleted { index } => {
            vec![SurfaceOp::DeleteSection { index, animation }]
        }
        ChangeEvent::RecordInserted { new_index, .. } => vec![SurfaceOp::InsertRow {
            path: new_index,
            animation,
        }],
        ChangeEvent::RecordDeleted { old_index, .. } => vec![SurfaceOp::DeleteRow {
            path: old_index,
            animation,
        }],
        ChangeEvent::RecordUpdated { id, index } => vec![SurfaceOp::RebindRow { id, path: index }],
        ChangeEvent::RecordMoved {
            old_index,
            new_index,
            ..
        } => vec![
            SurfaceOp::DeleteRow {
                path: old_index,
                animation,
            },
            SurfaceOp::InsertRow {
                path: new_index,
                animation,
            },
        ],
    }
}
