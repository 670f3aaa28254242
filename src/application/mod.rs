//! Application layer - handlers and the services they share.
//!
//! Orchestrates the progression engine over the ports: template caching,
//! per-tracker locking, alert reconciliation, and the project write-back.

mod alert_generator;
mod error;
pub mod handlers;
mod projection;
mod services;
pub(crate) mod template_store;
mod tracker_locks;

pub use alert_generator::{AlertChanges, AlertGenerator, AlertGeneratorConfig, BatchAlertReport};
pub use error::WorkflowError;
pub use handlers::{
    CompleteLineItemCommand, CompleteLineItemHandler, CompleteLineItemResult, EnsureReadyHandler, EnsureReadyResult,
    GetPositionHandler, GetPositionQuery, InitializeWorkflowCommand, InitializeWorkflowHandler,
    InitializeWorkflowResult, ProjectPosition, TrackerPosition, UncompleteLineItemCommand, UncompleteLineItemHandler,
    UncompleteLineItemResult,
};
pub use projection::{ProjectProjection, ProjectSnapshot};
pub use services::{WorkflowPorts, WorkflowServices};
pub use template_store::{CachedTemplate, TemplateStore, TemplateStoreConfig, DEFAULT_TOTAL_LINE_ITEMS};
pub use tracker_locks::TrackerLocks;
