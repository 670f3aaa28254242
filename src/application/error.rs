//! Application error type for the exposed workflow operations.
//!
//! `UnknownProject` and `UnknownLineItem` surface as not-found,
//! `TrackerWriteConflict` as transient, everything else as a generic failure
//! carrying its cause. An already-completed line item is not an error.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, LineItemId, ProjectId, TrackerId, WorkflowType};

#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    #[error("Project not found: {0}")]
    UnknownProject(ProjectId),

    #[error("Line item {0} is not part of any resolved workflow template")]
    UnknownLineItem(LineItemId),

    #[error("Workflow template unavailable: {0}")]
    TemplateUnavailable(WorkflowType),

    #[error("Tracker {0} was modified concurrently; retry the request")]
    TrackerWriteConflict(TrackerId),

    #[error(transparent)]
    Internal(#[from] DomainError),
}

impl WorkflowError {
    /// Returns true if the error should surface as not-found.
    pub fn is_not_found(&self) -> bool {
        match self {
            WorkflowError::UnknownProject(_) | WorkflowError::UnknownLineItem(_) => true,
            WorkflowError::Internal(err) => err.code.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if retrying the request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            WorkflowError::TrackerWriteConflict(_) => true,
            WorkflowError::Internal(err) => {
                matches!(err.code, ErrorCode::ConcurrencyConflict | ErrorCode::DatabaseError)
            }
            _ => false,
        }
    }
}
