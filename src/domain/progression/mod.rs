//! Progression module - pure state transitions for workflow trackers.
//!
//! The engine derives position, progress and display phase from a tracker and
//! its template's flattened sequence. Nothing here awaits or touches storage.

mod engine;
mod initialization;
mod phase_resolution;

pub use engine::{CompletionOutcome, PointerShift, ProgressionEngine, UncompletionOutcome};
pub use initialization::WorkflowRequest;
pub use phase_resolution::{phase_for_status, PhaseSignals};
