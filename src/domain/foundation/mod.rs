//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the workflow domain.

mod alert_status;
mod errors;
mod ids;
mod percentage;
mod phase_key;
mod timestamp;
mod workflow_type;

pub use alert_status::{AlertPriority, AlertStatus, ResponsibleRole};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AlertId, LineItemId, PhaseId, ProjectId, SectionId, TrackerId};
pub use percentage::Percentage;
pub use phase_key::PhaseKey;
pub use timestamp::Timestamp;
pub use workflow_type::WorkflowType;
