//! CompleteLineItemHandler - Command handler for completing a line item.
//!
//! Everything runs under the tracker's lock so events on one tracker apply
//! in order. A tracker created while its template was unavailable is settled
//! against the template before the completion is applied. Alert reconciliation and the project write-back happen after
//! the write commits and are best-effort: the healing sweep repairs
//! anything they miss.

use std::sync::Arc;

use crate::domain::alert::AlertDiff;
use crate::domain::foundation::{LineItemId, Percentage, ProjectId, WorkflowType};
use crate::domain::progression::{CompletionOutcome, ProgressionEngine};
use crate::domain::template::WorkflowPosition;
use crate::domain::tracker::ProjectWorkflowTracker;
use crate::ports::TrackerRepository;

use super::tracker_access::{engine_error, locate_tracker_for_item, write_with_retry};
use crate::application::{AlertGenerator, ProjectProjection, ProjectSnapshot, TemplateStore, TrackerLocks, WorkflowError};

/// Command to complete a line item.
#[derive(Debug, Clone)]
pub struct CompleteLineItemCommand {
    pub project_id: ProjectId,
    pub line_item_id: LineItemId,
    /// Restricts the lookup to one tracker; otherwise every tracker of the
    /// project is searched, main first.
    pub workflow_type: Option<WorkflowType>,
    pub notes: Option<String>,
}

impl CompleteLineItemCommand {
    pub fn new(project_id: ProjectId, line_item_id: LineItemId) -> Self {
        Self {
            project_id,
            line_item_id,
            workflow_type: None,
            notes: None,
        }
    }

    pub fn with_workflow_type(mut self, workflow_type: WorkflowType) -> Self {
        self.workflow_type = Some(workflow_type);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Result of completing a line item.
#[derive(Debug, Clone)]
pub struct CompleteLineItemResult {
    /// The tracker as persisted.
    pub tracker: ProjectWorkflowTracker,
    pub outcome: CompletionOutcome,
    /// Progress of this tracker after the completion.
    pub progress: Percentage,
    /// The tracker's current item, `None` once exhausted.
    pub next_active: Option<WorkflowPosition>,
    pub alerts: AlertDiff,
    /// Project phase and progress as written back, if the write-back ran.
    pub project: Option<ProjectSnapshot>,
}

impl CompleteLineItemResult {
    pub fn is_complete(&self) -> bool {
        self.next_active.is_none()
    }
}

pub struct CompleteLineItemHandler {
    trackers: Arc<dyn TrackerRepository>,
    templates: Arc<TemplateStore>,
    locks: Arc<TrackerLocks>,
    alerts: Arc<AlertGenerator>,
    projection: Arc<ProjectProjection>,
}

impl CompleteLineItemHandler {
    pub fn new(
        trackers: Arc<dyn TrackerRepository>,
        templates: Arc<TemplateStore>,
        locks: Arc<TrackerLocks>,
        alerts: Arc<AlertGenerator>,
        projection: Arc<ProjectProjection>,
    ) -> Self {
        Self {
            trackers,
            templates,
            locks,
            alerts,
            projection,
        }
    }

    pub async fn handle(&self, cmd: CompleteLineItemCommand) -> Result<CompleteLineItemResult, WorkflowError> {
        // 1. Resolve project and owning tracker
        self.projection.project(&cmd.project_id).await?;
        let located = locate_tracker_for_item(
            self.trackers.as_ref(),
            &self.templates,
            &cmd.project_id,
            cmd.line_item_id,
            cmd.workflow_type.as_ref(),
            false,
        )
        .await?;
        let template = located.template;
        let workflow_type = located.tracker.workflow_type().clone();

        // 2. Read-modify-write under the tracker lock
        let guard = self.locks.acquire(located.tracker.id()).await;
        let (tracker, (outcome, adopted)) =
            write_with_retry(self.trackers.as_ref(), &cmd.project_id, &workflow_type, |tracker| {
                let adopted = ProgressionEngine::adopt_template(tracker, &template.sequence);
                let outcome = ProgressionEngine::complete_line_item(
                    tracker,
                    &template.sequence,
                    cmd.line_item_id,
                    cmd.notes.clone(),
                )
                .map_err(|e| engine_error(e, cmd.line_item_id))?;
                let changed = adopted || !outcome.is_already_completed();
                Ok(((outcome, adopted), changed))
            })
            .await?;

        let progress = ProgressionEngine::compute_progress(&tracker, &template.sequence);

        // 3. Alerts
        let alerts = match &outcome {
            _ if adopted => self.alerts.generate_for_project(&cmd.project_id).await.unwrap_or_else(|e| {
                tracing::warn!(
                    project_id = %cmd.project_id,
                    error = %e,
                    "Alert generation failed after settling tracker"
                );
                AlertDiff::default()
            }),
            CompletionOutcome::AlreadyCompleted => {
                tracing::debug!(
                    tracker_id = %tracker.id(),
                    line_item_id = %cmd.line_item_id,
                    "Line item already completed"
                );
                AlertDiff::default()
            }
            CompletionOutcome::Completed { completed, shift } => self
                .alerts
                .reconcile_progression(&tracker, Some(&template), Some(completed.line_item_id), shift)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        tracker_id = %tracker.id(),
                        error = %e,
                        "Alert reconciliation failed after completion"
                    );
                    AlertDiff::default()
                }),
        };

        // 4. Project write-back
        let project = match &outcome {
            CompletionOutcome::AlreadyCompleted if adopted => self.projection.refresh_best_effort(&cmd.project_id).await,
            CompletionOutcome::AlreadyCompleted => None,
            CompletionOutcome::Completed { shift, .. } => {
                tracing::info!(
                    project_id = %cmd.project_id,
                    tracker_id = %tracker.id(),
                    line_item_id = %cmd.line_item_id,
                    progress = %progress,
                    exhausted = shift.is_complete(),
                    "Line item completed"
                );
                self.projection.refresh_best_effort(&cmd.project_id).await
            }
        };

        drop(guard);

        Ok(CompleteLineItemResult {
            next_active: tracker.current().copied(),
            tracker,
            outcome,
            progress,
            alerts,
            project,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{workflow, Harness};
    use crate::application::handlers::InitializeWorkflowCommand;
    use crate::domain::foundation::{AlertStatus, PhaseKey};
    use crate::ports::AlertRepository;

    async fn initialized() -> (Harness, ProjectId) {
        let h = Harness::new().await;
        let project = h.project("ROOFING", &[]).await;
        h.services
            .initialize_workflow
            .handle(InitializeWorkflowCommand::new(project))
            .await
            .unwrap();
        (h, project)
    }

    #[tokio::test]
    async fn roofing_progresses_through_phases() {
        let (h, project) = initialized().await;
        let items = h.roofing_items();

        let first = h
            .services
            .complete_line_item
            .handle(CompleteLineItemCommand::new(project, items[0]))
            .await
            .unwrap();
        assert_eq!(first.progress.value(), 33);
        assert_eq!(first.next_active.map(|p| p.line_item_id), Some(items[1]));
        assert_eq!(first.project.map(|p| p.phase), Some(PhaseKey::Lead));

        let second = h
            .services
            .complete_line_item
            .handle(CompleteLineItemCommand::new(project, items[1]))
            .await
            .unwrap();
        assert_eq!(second.progress.value(), 67);
        assert_eq!(second.project.map(|p| p.phase), Some(PhaseKey::Execution));

        let last = h
            .services
            .complete_line_item
            .handle(CompleteLineItemCommand::new(project, items[2]))
            .await
            .unwrap();
        assert!(last.is_complete());
        assert_eq!(last.progress, Percentage::HUNDRED);
        assert_eq!(
            h.projects.phase_and_progress(&project).await,
            Some((Some(PhaseKey::Completion), Percentage::HUNDRED))
        );
        assert!(h.alerts.list_active_for_project(&project).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn completion_moves_the_active_alert() {
        let (h, project) = initialized().await;
        let items = h.roofing_items();

        let result = h
            .services
            .complete_line_item
            .handle(CompleteLineItemCommand::new(project, items[0]).with_notes("called"))
            .await
            .unwrap();

        assert_eq!(result.alerts.closed.len(), 1);
        assert_eq!(result.alerts.closed[0].status(), AlertStatus::Completed);
        assert_eq!(result.alerts.opened[0].line_item_id(), items[1]);
        assert_eq!(
            result.tracker.completed_item(&items[0]).and_then(|c| c.notes.as_deref()),
            Some("called")
        );
    }

    #[tokio::test]
    async fn second_completion_is_already_completed_and_unchanged() {
        let (h, project) = initialized().await;
        let items = h.roofing_items();
        let handler = &h.services.complete_line_item;

        let first = handler.handle(CompleteLineItemCommand::new(project, items[0])).await.unwrap();
        let again = handler.handle(CompleteLineItemCommand::new(project, items[0])).await.unwrap();

        assert!(again.outcome.is_already_completed());
        assert_eq!(again.tracker.version(), first.tracker.version());
        assert!(again.alerts.is_empty());
    }

    #[tokio::test]
    async fn tracker_created_without_template_finishes_at_hundred() {
        let h = Harness::new().await;
        let project = h.project("ROOFING", &[]).await;
        h.source.set_unavailable(true);
        h.services
            .initialize_workflow
            .handle(InitializeWorkflowCommand::new(project))
            .await
            .unwrap();
        h.source.set_unavailable(false);

        let mut last = None;
        for id in h.roofing_items() {
            last = Some(
                h.services
                    .complete_line_item
                    .handle(CompleteLineItemCommand::new(project, id))
                    .await
                    .unwrap(),
            );
        }
        let last = last.unwrap();

        assert_eq!(last.progress, Percentage::HUNDRED);
        assert_eq!(last.tracker.total_line_items(), 3);
        assert!(!last.tracker.is_total_estimated());
        assert_eq!(
            h.projects.phase_and_progress(&project).await,
            Some((Some(PhaseKey::Completion), Percentage::HUNDRED))
        );
        assert!(h.alerts.list_active_for_project(&project).await.unwrap().is_empty());
        assert!(h.services.ensure_ready.handle(project).await.unwrap().is_noop());
    }

    #[tokio::test]
    async fn settling_on_out_of_order_completion_alerts_the_first_item() {
        let h = Harness::new().await;
        let project = h.project("ROOFING", &[]).await;
        h.source.set_unavailable(true);
        h.services
            .initialize_workflow
            .handle(InitializeWorkflowCommand::new(project))
            .await
            .unwrap();
        h.source.set_unavailable(false);
        let items = h.roofing_items();

        let result = h
            .services
            .complete_line_item
            .handle(CompleteLineItemCommand::new(project, items[1]))
            .await
            .unwrap();

        assert_eq!(result.next_active.map(|p| p.line_item_id), Some(items[0]));
        assert_eq!(result.progress.value(), 33);
        let active = h.alerts.list_active_for_project(&project).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].line_item_id(), items[0]);
    }

    #[tokio::test]
    async fn unknown_inputs_surface_as_not_found() {
        let (h, project) = initialized().await;
        let handler = &h.services.complete_line_item;

        let err = handler
            .handle(CompleteLineItemCommand::new(project, LineItemId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownLineItem(_)));
        assert!(err.is_not_found());

        let err = handler
            .handle(CompleteLineItemCommand::new(ProjectId::new(), h.roofing_items()[0]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownProject(_)));
    }

    #[tokio::test]
    async fn item_from_another_workflow_is_unknown_when_type_is_given() {
        let h = Harness::new().await;
        let project = h.project("ROOFING", &["GUTTERS"]).await;
        h.services
            .initialize_workflow
            .handle(InitializeWorkflowCommand::new(project))
            .await
            .unwrap();

        let err = h
            .services
            .complete_line_item
            .handle(CompleteLineItemCommand::new(project, h.gutter_items()[0]).with_workflow_type(workflow("ROOFING")))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownLineItem(_)));

        let ok = h
            .services
            .complete_line_item
            .handle(CompleteLineItemCommand::new(project, h.gutter_items()[0]))
            .await
            .unwrap();
        assert_eq!(ok.tracker.workflow_type().as_str(), "GUTTERS");
        assert!(ok.is_complete());
    }
}
