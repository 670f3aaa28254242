//! In-memory tracker repository with the same uniqueness and versioning
//! rules as the PostgreSQL adapter.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, ProjectId, TrackerId, WorkflowType};
use crate::domain::tracker::ProjectWorkflowTracker;
use crate::ports::TrackerRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryTrackerRepository {
    trackers: Arc<RwLock<HashMap<TrackerId, ProjectWorkflowTracker>>>,
}

impl InMemoryTrackerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored trackers.
    pub async fn count(&self) -> usize {
        self.trackers.read().await.len()
    }

    /// Stores a tracker as-is, bypassing uniqueness checks (test setup).
    pub async fn put_raw(&self, tracker: ProjectWorkflowTracker) {
        self.trackers.write().await.insert(tracker.id(), tracker);
    }
}

#[async_trait]
impl TrackerRepository for InMemoryTrackerRepository {
    async fn insert(&self, tracker: &ProjectWorkflowTracker) -> Result<(), DomainError> {
        let mut trackers = self.trackers.write().await;

        let clash = trackers.values().any(|t| {
            t.project_id() == tracker.project_id()
                && (t.workflow_type() == tracker.workflow_type()
                    || (t.is_main_workflow() && tracker.is_main_workflow()))
        });
        if clash || trackers.contains_key(&tracker.id()) {
            return Err(DomainError::new(
                ErrorCode::DuplicateTracker,
                format!(
                    "Project {} already has a {} tracker or a main tracker",
                    tracker.project_id(),
                    tracker.workflow_type()
                ),
            ));
        }

        trackers.insert(tracker.id(), tracker.clone());
        Ok(())
    }

    async fn save(&self, tracker: &ProjectWorkflowTracker) -> Result<(), DomainError> {
        let mut trackers = self.trackers.write().await;
        let stored = trackers.get_mut(&tracker.id()).ok_or_else(|| {
            DomainError::new(ErrorCode::TrackerNotFound, format!("Tracker {} not found", tracker.id()))
        })?;

        if stored.version() != tracker.version() {
            return Err(DomainError::new(
                ErrorCode::ConcurrencyConflict,
                format!(
                    "Tracker {} is at version {}, write was based on {}",
                    tracker.id(),
                    stored.version(),
                    tracker.version()
                ),
            ));
        }

        let mut next = tracker.clone();
        next.mark_persisted();
        *stored = next;
        Ok(())
    }

    async fn find_by_project_and_type(
        &self,
        project_id: &ProjectId,
        workflow_type: &WorkflowType,
    ) -> Result<Option<ProjectWorkflowTracker>, DomainError> {
        let trackers = self.trackers.read().await;
        Ok(trackers
            .values()
            .find(|t| t.project_id() == *project_id && t.workflow_type() == workflow_type)
            .cloned())
    }

    async fn find_main(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<ProjectWorkflowTracker>, DomainError> {
        let trackers = self.trackers.read().await;
        Ok(trackers
            .values()
            .find(|t| t.project_id() == *project_id && t.is_main_workflow())
            .cloned())
    }

    async fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<ProjectWorkflowTracker>, DomainError> {
        let trackers = self.trackers.read().await;
        let mut found: Vec<_> = trackers
            .values()
            .filter(|t| t.project_id() == *project_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| (!t.is_main_workflow(), t.created_at(), t.id()));
        Ok(found)
    }

    async fn delete_for_project(&self, project_id: &ProjectId) -> Result<u64, DomainError> {
        let mut trackers = self.trackers.write().await;
        let before = trackers.len();
        trackers.retain(|_, t| t.project_id() != *project_id);
        Ok((before - trackers.len()) as u64)
    }
}
