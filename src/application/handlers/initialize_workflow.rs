//! InitializeWorkflowHandler - Command handler for creating a project's trackers.
//!
//! Template lookups soft-fail: a tracker whose template cannot be loaded is
//! still created, with the default line-item estimate and no pointer, and
//! is repaired later by `EnsureReadyHandler`. Storage failures do abort.

use std::sync::Arc;

use crate::domain::alert::AlertDiff;
use crate::domain::foundation::{ErrorCode, PhaseKey, ProjectId, WorkflowType};
use crate::domain::progression::{ProgressionEngine, WorkflowRequest};
use crate::domain::tracker::ProjectWorkflowTracker;
use crate::ports::TrackerRepository;

use crate::application::{AlertGenerator, ProjectProjection, ProjectSnapshot, TemplateStore, WorkflowError};

/// Command to create trackers for a project.
#[derive(Debug, Clone)]
pub struct InitializeWorkflowCommand {
    pub project_id: ProjectId,
    /// Workflow types to create. Empty means the project's declared types.
    pub workflow_types: Vec<WorkflowType>,
    /// Type to flag as main. Defaults to the project's declared type.
    pub primary: Option<WorkflowType>,
    /// Entries before this phase's first item are skipped.
    pub starting_phase: Option<PhaseKey>,
}

impl InitializeWorkflowCommand {
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            workflow_types: Vec::new(),
            primary: None,
            starting_phase: None,
        }
    }

    pub fn with_types(mut self, workflow_types: Vec<WorkflowType>) -> Self {
        self.workflow_types = workflow_types;
        self
    }

    pub fn with_primary(mut self, primary: WorkflowType) -> Self {
        self.primary = Some(primary);
        self
    }

    pub fn with_starting_phase(mut self, phase: PhaseKey) -> Self {
        self.starting_phase = Some(phase);
        self
    }
}

/// Result of initializing a project's workflows.
#[derive(Debug, Clone, Default)]
pub struct InitializeWorkflowResult {
    /// Trackers created by this call.
    pub created: Vec<ProjectWorkflowTracker>,
    /// Requested trackers that already existed.
    pub existing: Vec<ProjectWorkflowTracker>,
    pub alerts: AlertDiff,
    pub project: Option<ProjectSnapshot>,
}

impl InitializeWorkflowResult {
    /// Every requested tracker, created or pre-existing.
    pub fn trackers(&self) -> impl Iterator<Item = &ProjectWorkflowTracker> {
        self.created.iter().chain(self.existing.iter())
    }
}

pub struct InitializeWorkflowHandler {
    trackers: Arc<dyn TrackerRepository>,
    templates: Arc<TemplateStore>,
    alerts: Arc<AlertGenerator>,
    projection: Arc<ProjectProjection>,
}

impl InitializeWorkflowHandler {
    pub fn new(
        trackers: Arc<dyn TrackerRepository>,
        templates: Arc<TemplateStore>,
        alerts: Arc<AlertGenerator>,
        projection: Arc<ProjectProjection>,
    ) -> Self {
        Self {
            trackers,
            templates,
            alerts,
            projection,
        }
    }

    pub async fn handle(&self, cmd: InitializeWorkflowCommand) -> Result<InitializeWorkflowResult, WorkflowError> {
        // 1. Resolve requested types against the project
        let project = self.projection.project(&cmd.project_id).await?;
        let requested = if cmd.workflow_types.is_empty() {
            project.declared_workflow_types()
        } else {
            cmd.workflow_types
        };
        let primary = cmd.primary.or_else(|| project.project_type.clone());

        let current = self.trackers.list_for_project(&cmd.project_id).await?;
        let has_main = current.iter().any(ProjectWorkflowTracker::is_main_workflow);
        let (present, missing): (Vec<_>, Vec<_>) = requested
            .into_iter()
            .partition(|wt| current.iter().any(|t| t.workflow_type() == wt));
        let mut existing: Vec<ProjectWorkflowTracker> = current
            .into_iter()
            .filter(|t| present.contains(t.workflow_type()))
            .collect();

        if missing.is_empty() {
            return Ok(InitializeWorkflowResult {
                existing,
                ..InitializeWorkflowResult::default()
            });
        }

        // 2. Load templates; failures leave the tracker half-initialized
        let mut templates = Vec::with_capacity(missing.len());
        for workflow_type in &missing {
            let template = self.templates.try_get_template(workflow_type).await;
            if template.is_none() {
                tracing::warn!(
                    project_id = %cmd.project_id,
                    workflow_type = %workflow_type,
                    default_total = self.templates.default_total_line_items(),
                    "Template unavailable; creating tracker with default estimate"
                );
            }
            templates.push(template);
        }
        let requests: Vec<WorkflowRequest<'_>> = missing
            .iter()
            .zip(&templates)
            .map(|(wt, cached)| WorkflowRequest::new(wt.clone(), cached.as_deref().map(|c| &c.sequence)))
            .collect();

        let mut fresh = ProgressionEngine::initialize_multiple_workflows(
            cmd.project_id,
            &requests,
            primary.as_ref(),
            cmd.starting_phase,
            self.templates.default_total_line_items(),
        );
        if has_main {
            for tracker in &mut fresh {
                tracker.set_main_workflow(false);
            }
        }

        // 3. Persist
        let mut created = Vec::with_capacity(fresh.len());
        for tracker in fresh {
            match self.insert(tracker).await? {
                Inserted::Created(t) => created.push(t),
                Inserted::AlreadyPresent(t) => existing.push(t),
            }
        }

        // 4. Post-commit side effects
        let mut candidates = Vec::new();
        for tracker in &created {
            if let Some(position) = tracker.current() {
                let template = templates
                    .iter()
                    .flatten()
                    .find(|c| c.template.workflow_type() == tracker.workflow_type());
                candidates.push(self.alerts.candidate_for(tracker, template.map(Arc::as_ref), position));
            }
        }
        let alerts = self
            .alerts
            .reconcile(&cmd.project_id, candidates, None)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(project_id = %cmd.project_id, error = %e, "Initial alert generation failed");
                AlertDiff::default()
            });
        let project = self.projection.refresh_best_effort(&cmd.project_id).await;

        tracing::info!(
            project_id = %cmd.project_id,
            created = created.len(),
            existing = existing.len(),
            "Project workflows initialized"
        );

        Ok(InitializeWorkflowResult {
            created,
            existing,
            alerts,
            project,
        })
    }

    /// Inserts a tracker, tolerating a concurrent initializer.
    async fn insert(&self, mut tracker: ProjectWorkflowTracker) -> Result<Inserted, WorkflowError> {
        let err = match self.trackers.insert(&tracker).await {
            Ok(()) => return Ok(Inserted::Created(tracker)),
            Err(e) if e.code == ErrorCode::DuplicateTracker => e,
            Err(e) => return Err(e.into()),
        };

        if let Some(found) = self
            .trackers
            .find_by_project_and_type(&tracker.project_id(), tracker.workflow_type())
            .await?
        {
            tracing::debug!(tracker_id = %found.id(), "Tracker created concurrently; keeping stored copy");
            return Ok(Inserted::AlreadyPresent(found));
        }

        // The type is free, so the clash was on the main flag.
        if !tracker.is_main_workflow() {
            return Err(err.into());
        }
        tracker.set_main_workflow(false);
        self.trackers.insert(&tracker).await?;
        Ok(Inserted::Created(tracker))
    }
}

enum Inserted {
    Created(ProjectWorkflowTracker),
    AlreadyPresent(ProjectWorkflowTracker),
}
