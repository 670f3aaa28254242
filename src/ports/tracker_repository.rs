//! Tracker repository port.
//!
//! Persists `ProjectWorkflowTracker` aggregates. Implementations must ensure:
//! - At most one tracker per (project, workflow type)
//! - At most one main tracker per project
//! - `save` replaces pointer and completed items atomically, guarded by the
//!   tracker's version

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ProjectId, WorkflowType};
use crate::domain::tracker::ProjectWorkflowTracker;

#[async_trait]
pub trait TrackerRepository: Send + Sync {
    /// Insert a new tracker.
    ///
    /// # Errors
    ///
    /// - `DuplicateTracker` if the project already has a tracker of this type
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, tracker: &ProjectWorkflowTracker) -> Result<(), DomainError>;

    /// Replace a stored tracker's state.
    ///
    /// The stored version must equal `tracker.version()`; on success the
    /// stored version becomes `tracker.version() + 1`.
    ///
    /// # Errors
    ///
    /// - `TrackerNotFound` if the tracker doesn't exist
    /// - `ConcurrencyConflict` if the stored version moved on
    /// - `DatabaseError` on persistence failure
    async fn save(&self, tracker: &ProjectWorkflowTracker) -> Result<(), DomainError>;

    /// Find the tracker for a project and workflow type.
    async fn find_by_project_and_type(
        &self,
        project_id: &ProjectId,
        workflow_type: &WorkflowType,
    ) -> Result<Option<ProjectWorkflowTracker>, DomainError>;

    /// Find the project's main tracker.
    async fn find_main(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<ProjectWorkflowTracker>, DomainError>;

    /// List all trackers for a project, main tracker first, then by creation.
    async fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<ProjectWorkflowTracker>, DomainError>;

    /// Delete every tracker of a project. Returns the number deleted.
    async fn delete_for_project(&self, project_id: &ProjectId) -> Result<u64, DomainError>;
}
