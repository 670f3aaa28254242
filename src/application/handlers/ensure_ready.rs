//! EnsureReadyHandler - Recovery entry point for projects whose workflow
//! setup soft-failed.
//!
//! Idempotent. Invoked on demand and by the periodic healing sweep:
//! 1. Creates trackers for declared workflow types that have none
//! 2. Settles trackers created without their template (half-initialized,
//!    or counting against the default estimate) once it loads
//! 3. Restores the main flag if no tracker carries it

use std::sync::Arc;

use crate::domain::foundation::ProjectId;
use crate::domain::progression::ProgressionEngine;
use crate::domain::tracker::ProjectWorkflowTracker;
use crate::ports::TrackerRepository;

use super::tracker_access::write_with_retry;
use super::{InitializeWorkflowCommand, InitializeWorkflowHandler};
use crate::application::{AlertGenerator, ProjectProjection, TemplateStore, TrackerLocks, WorkflowError};

/// Result of an ensure-ready pass.
#[derive(Debug, Clone, Default)]
pub struct EnsureReadyResult {
    /// Every tracker of the project after the pass, main first.
    pub trackers: Vec<ProjectWorkflowTracker>,
    pub created: usize,
    pub repaired: usize,
    pub main_restored: bool,
}

impl EnsureReadyResult {
    /// Returns true if the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.repaired == 0 && !self.main_restored
    }
}

pub struct EnsureReadyHandler {
    trackers: Arc<dyn TrackerRepository>,
    templates: Arc<TemplateStore>,
    locks: Arc<TrackerLocks>,
    initializer: Arc<InitializeWorkflowHandler>,
    alerts: Arc<AlertGenerator>,
    projection: Arc<ProjectProjection>,
}

impl EnsureReadyHandler {
    pub fn new(
        trackers: Arc<dyn TrackerRepository>,
        templates: Arc<TemplateStore>,
        locks: Arc<TrackerLocks>,
        initializer: Arc<InitializeWorkflowHandler>,
        alerts: Arc<AlertGenerator>,
        projection: Arc<ProjectProjection>,
    ) -> Self {
        Self {
            trackers,
            templates,
            locks,
            initializer,
            alerts,
            projection,
        }
    }

    pub async fn handle(&self, project_id: ProjectId) -> Result<EnsureReadyResult, WorkflowError> {
        let project = self.projection.project(&project_id).await?;
        let declared = project.declared_workflow_types();
        let existing = self.trackers.list_for_project(&project_id).await?;

        // 1. Missing trackers
        let missing: Vec<_> = declared
            .into_iter()
            .filter(|wt| !existing.iter().any(|t| t.workflow_type() == wt))
            .collect();
        let created = if missing.is_empty() {
            if existing.is_empty() {
                tracing::warn!(project_id = %project_id, "Project declares no workflow types; nothing to initialize");
            }
            0
        } else {
            self.initializer
                .handle(InitializeWorkflowCommand::new(project_id).with_types(missing))
                .await?
                .created
                .len()
        };

        // 2. Trackers still waiting on their template
        let mut repaired = 0;
        for tracker in existing.iter().filter(|t| t.awaits_template()) {
            if self.repair(tracker).await? {
                repaired += 1;
            }
        }

        // 3. Main flag
        let mut trackers = self.trackers.list_for_project(&project_id).await?;
        let main_restored =
            !trackers.is_empty() && !trackers.iter().any(ProjectWorkflowTracker::is_main_workflow);
        if main_restored {
            self.restore_main(&trackers[0]).await?;
            trackers = self.trackers.list_for_project(&project_id).await?;
        }

        if repaired > 0 || main_restored {
            if let Err(e) = self.alerts.generate_for_project(&project_id).await {
                tracing::warn!(project_id = %project_id, error = %e, "Alert generation failed after repair");
            }
            self.projection.refresh_best_effort(&project_id).await;
        }

        let result = EnsureReadyResult {
            trackers,
            created,
            repaired,
            main_restored,
        };
        if !result.is_noop() {
            tracing::info!(
                project_id = %project_id,
                created = result.created,
                repaired = result.repaired,
                main_restored = result.main_restored,
                "Project workflow repaired"
            );
        }
        Ok(result)
    }

    /// Settles a tracker against its template. Returns false if the template
    /// is still unavailable or another writer already settled it.
    async fn repair(&self, tracker: &ProjectWorkflowTracker) -> Result<bool, WorkflowError> {
        let Some(cached) = self.templates.try_get_template(tracker.workflow_type()).await else {
            tracing::debug!(tracker_id = %tracker.id(), "Template still unavailable; repair deferred");
            return Ok(false);
        };

        let _guard = self.locks.acquire(tracker.id()).await;
        let (_, repaired) = write_with_retry(
            self.trackers.as_ref(),
            &tracker.project_id(),
            tracker.workflow_type(),
            |t| {
                let adopted = ProgressionEngine::adopt_template(t, &cached.sequence);
                Ok((adopted, adopted))
            },
        )
        .await?;
        Ok(repaired)
    }

    async fn restore_main(&self, tracker: &ProjectWorkflowTracker) -> Result<(), WorkflowError> {
        let _guard = self.locks.acquire(tracker.id()).await;
        write_with_retry(
            self.trackers.as_ref(),
            &tracker.project_id(),
            tracker.workflow_type(),
            |t| {
                let changed = !t.is_main_workflow();
                t.set_main_workflow(true);
                Ok(((), changed))
            },
        )
        .await?;
        Ok(())
    }
}
