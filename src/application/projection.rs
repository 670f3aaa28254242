//! ProjectProjection - derives a project's display phase and progress and
//! writes them back to the project store.
//!
//! The project-level values come from the main tracker (or the first
//! tracker if none is flagged main).

use std::sync::Arc;

use crate::domain::foundation::{Percentage, PhaseKey, ProjectId};
use crate::domain::progression::{PhaseSignals, ProgressionEngine};
use crate::domain::tracker::ProjectWorkflowTracker;
use crate::ports::{PhaseOverrideStore, ProjectRecord, ProjectStore, TrackerRepository};

use super::template_store::CachedTemplate;
use super::{TemplateStore, WorkflowError};

/// Derived values written back to the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub phase: PhaseKey,
    pub progress: Percentage,
}

impl ProjectSnapshot {
    /// Computes the snapshot from already-loaded inputs.
    pub fn derive(
        override_phase: Option<PhaseKey>,
        main: Option<&ProjectWorkflowTracker>,
        template: Option<&CachedTemplate>,
        project_status: Option<&str>,
    ) -> Self {
        let phase = ProgressionEngine::derive_phase_key(&PhaseSignals {
            override_phase,
            tracker: main,
            template: template.map(|c| &c.template),
            project_status,
        });
        let progress = match (main, template) {
            (Some(tracker), Some(cached)) => ProgressionEngine::compute_progress(tracker, &cached.sequence),
            _ => Percentage::ZERO,
        };
        Self { phase, progress }
    }
}

pub struct ProjectProjection {
    projects: Arc<dyn ProjectStore>,
    overrides: Arc<dyn PhaseOverrideStore>,
    trackers: Arc<dyn TrackerRepository>,
    templates: Arc<TemplateStore>,
}

impl ProjectProjection {
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        overrides: Arc<dyn PhaseOverrideStore>,
        trackers: Arc<dyn TrackerRepository>,
        templates: Arc<TemplateStore>,
    ) -> Self {
        Self {
            projects,
            overrides,
            trackers,
            templates,
        }
    }

    /// Loads a project or fails with `UnknownProject`.
    pub async fn project(&self, project_id: &ProjectId) -> Result<ProjectRecord, WorkflowError> {
        self.projects
            .get_project(project_id)
            .await?
            .ok_or(WorkflowError::UnknownProject(*project_id))
    }

    /// Computes the current snapshot without writing it.
    pub async fn compute(&self, project: &ProjectRecord) -> Result<ProjectSnapshot, WorkflowError> {
        let override_phase = self.overrides.find_override(&project.id).await?;
        let trackers = self.trackers.list_for_project(&project.id).await?;
        let main = ProjectWorkflowTracker::select_main(&trackers);
        let template = match main {
            Some(t) => self.templates.try_get_template(t.workflow_type()).await,
            None => None,
        };

        Ok(ProjectSnapshot::derive(
            override_phase,
            main,
            template.as_deref(),
            project.status.as_deref(),
        ))
    }

    /// Recomputes the snapshot and writes it back to the project store.
    ///
    /// # Errors
    ///
    /// - `UnknownProject` if the project doesn't exist
    /// - `Internal` on storage failure
    pub async fn refresh(&self, project_id: &ProjectId) -> Result<ProjectSnapshot, WorkflowError> {
        let project = self.project(project_id).await?;
        let snapshot = self.compute(&project).await?;
        self.projects
            .update_phase_and_progress(project_id, snapshot.phase, snapshot.progress)
            .await?;
        tracing::debug!(
            project_id = %project_id,
            phase = %snapshot.phase,
            progress = %snapshot.progress,
            "Project phase and progress written back"
        );
        Ok(snapshot)
    }

    /// Like `refresh`, but logs and swallows failures.
    pub async fn refresh_best_effort(&self, project_id: &ProjectId) -> Option<ProjectSnapshot> {
        match self.refresh(project_id).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(project_id = %project_id, error = %e, "Failed to write back project phase and progress");
                None
            }
        }
    }
}
