//! UncompleteLineItemHandler - Command handler for reversing a completion.
//!
//! Used by manual-correction paths. The pointer may move earlier; the alert
//! of the item it left is dismissed and the new current item gets one.

use std::sync::Arc;

use crate::domain::alert::AlertDiff;
use crate::domain::foundation::{LineItemId, Percentage, ProjectId, WorkflowType};
use crate::domain::progression::{ProgressionEngine, UncompletionOutcome};
use crate::domain::template::WorkflowPosition;
use crate::domain::tracker::ProjectWorkflowTracker;
use crate::ports::TrackerRepository;

use super::tracker_access::{engine_error, locate_tracker_for_item, write_with_retry};
use crate::application::{AlertGenerator, ProjectProjection, ProjectSnapshot, TemplateStore, TrackerLocks, WorkflowError};

/// Command to reverse a line item completion.
#[derive(Debug, Clone)]
pub struct UncompleteLineItemCommand {
    pub project_id: ProjectId,
    pub line_item_id: LineItemId,
    pub workflow_type: Option<WorkflowType>,
}

impl UncompleteLineItemCommand {
    pub fn new(project_id: ProjectId, line_item_id: LineItemId) -> Self {
        Self {
            project_id,
            line_item_id,
            workflow_type: None,
        }
    }

    pub fn with_workflow_type(mut self, workflow_type: WorkflowType) -> Self {
        self.workflow_type = Some(workflow_type);
        self
    }
}

/// Result of reversing a completion.
#[derive(Debug, Clone)]
pub struct UncompleteLineItemResult {
    pub tracker: ProjectWorkflowTracker,
    pub outcome: UncompletionOutcome,
    pub progress: Percentage,
    pub current: Option<WorkflowPosition>,
    pub alerts: AlertDiff,
    pub project: Option<ProjectSnapshot>,
}

pub struct UncompleteLineItemHandler {
    trackers: Arc<dyn TrackerRepository>,
    templates: Arc<TemplateStore>,
    locks: Arc<TrackerLocks>,
    alerts: Arc<AlertGenerator>,
    projection: Arc<ProjectProjection>,
}

impl UncompleteLineItemHandler {
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

    pub async fn handle(&self, cmd: UncompleteLineItemCommand) -> Result<UncompleteLineItemResult, WorkflowError> {
        self.projection.project(&cmd.project_id).await?;
        let located = locate_tracker_for_item(
            self.trackers.as_ref(),
            &self.templates,
            &cmd.project_id,
            cmd.line_item_id,
            cmd.workflow_type.as_ref(),
            true,
        )
        .await?;
        let template = located.template;
        let workflow_type = located.tracker.workflow_type().clone();

        let guard = self.locks.acquire(located.tracker.id()).await;
        let (tracker, (outcome, adopted)) =
            write_with_retry(self.trackers.as_ref(), &cmd.project_id, &workflow_type, |tracker| {
                let adopted = ProgressionEngine::adopt_template(tracker, &template.sequence);
                let outcome = ProgressionEngine::uncomplete_line_item(tracker, &template.sequence, cmd.line_item_id)
                    .map_err(|e| engine_error(e, cmd.line_item_id))?;
                let changed = adopted || matches!(outcome, UncompletionOutcome::Uncompleted { .. });
                Ok(((outcome, adopted), changed))
            })
            .await?;

        let progress = ProgressionEngine::compute_progress(&tracker, &template.sequence);

        let alerts = match &outcome {
            _ if adopted => self.alerts.generate_for_project(&cmd.project_id).await.unwrap_or_else(|e| {
                tracing::warn!(
                    project_id = %cmd.project_id,
                    error = %e,
                    "Alert generation failed after settling tracker"
                );
                AlertDiff::default()
            }),
            UncompletionOutcome::NotCompleted => AlertDiff::default(),
            UncompletionOutcome::Uncompleted { shift, .. } => self
                .alerts
                .reconcile_progression(&tracker, Some(&template), None, shift)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        tracker_id = %tracker.id(),
                        error = %e,
                        "Alert reconciliation failed after uncompletion"
                    );
                    AlertDiff::default()
                }),
        };

        let project = match &outcome {
            UncompletionOutcome::NotCompleted if adopted => self.projection.refresh_best_effort(&cmd.project_id).await,
            UncompletionOutcome::NotCompleted => None,
            UncompletionOutcome::Uncompleted { .. } => {
                tracing::info!(
                    project_id = %cmd.project_id,
                    tracker_id = %tracker.id(),
                    line_item_id = %cmd.line_item_id,
                    progress = %progress,
                    "Line item completion reversed"
                );
                self.projection.refresh_best_effort(&cmd.project_id).await
            }
        };

        drop(guard);

        Ok(UncompleteLineItemResult {
            current: tracker.current().copied(),
            tracker,
            outcome,
            progress,
            alerts,
            project,
        })
    }
}
