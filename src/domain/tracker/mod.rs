//! Tracker module - per-project, per-workflow-type progression state.

mod aggregate;

pub use aggregate::{CompletedItem, ProjectWorkflowTracker};
