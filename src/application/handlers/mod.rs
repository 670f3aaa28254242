//! Application handlers.
//!
//! One handler per exposed operation. Writes take the tracker lock, commit
//! the tracker, then reconcile alerts and write back the project's phase
//! and progress.

mod complete_line_item;
mod ensure_ready;
mod get_position;
mod initialize_workflow;
mod tracker_access;
mod uncomplete_line_item;

#[cfg(test)]
pub(crate) mod test_support;

pub use complete_line_item::{CompleteLineItemCommand, CompleteLineItemHandler, CompleteLineItemResult};
pub use ensure_ready::{EnsureReadyHandler, EnsureReadyResult};
pub use get_position::{GetPositionHandler, GetPositionQuery, ProjectPosition, TrackerPosition};
pub use initialize_workflow::{InitializeWorkflowCommand, InitializeWorkflowHandler, InitializeWorkflowResult};
pub use uncomplete_line_item::{UncompleteLineItemCommand, UncompleteLineItemHandler, UncompleteLineItemResult};
