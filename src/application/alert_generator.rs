//! AlertGenerator - keeps ACTIVE alerts in sync with currently active line items.
//!
//! Reconciliation is idempotent: the dedup insert in the alert repository is
//! the only guard against duplicates, so it can run after every tracker
//! write and again from the periodic sweep.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::domain::alert::{AlertCandidate, AlertDiff};
use crate::domain::foundation::{DomainError, LineItemId, ProjectId, Timestamp};
use crate::domain::progression::PointerShift;
use crate::domain::template::WorkflowPosition;
use crate::domain::tracker::ProjectWorkflowTracker;
use crate::ports::{AlertNotifier, AlertRepository, TrackerRepository};

use super::template_store::CachedTemplate;
use super::TemplateStore;

/// Configuration for [`AlertGenerator`].
#[derive(Debug, Clone)]
pub struct AlertGeneratorConfig {
    /// Due-date offset for line items without their own `alert_days`.
    pub default_due_days: u32,

    /// Projects processed concurrently by `generate_batch_alerts`.
    pub batch_concurrency: usize,
}

impl Default for AlertGeneratorConfig {
    fn default() -> Self {
        Self {
            default_due_days: 1,
            batch_concurrency: 8,
        }
    }
}

impl AlertGeneratorConfig {
    pub fn with_default_due_days(mut self, days: u32) -> Self {
        self.default_due_days = days;
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }
}

/// What one reconciliation should change.
#[derive(Debug, Clone, Default)]
pub struct AlertChanges {
    /// Line item whose ACTIVE alert becomes COMPLETED.
    pub completed: Option<LineItemId>,
    /// Line item that stopped being active without completing; its ACTIVE
    /// alert becomes DISMISSED.
    pub superseded: Option<LineItemId>,
    /// Items that should have an ACTIVE alert. At most one per tracker.
    pub newly_active: Vec<AlertCandidate>,
}

/// Totals from one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchAlertReport {
    pub projects: usize,
    pub opened: usize,
    pub failed: usize,
}

pub struct AlertGenerator {
    alerts: Arc<dyn AlertRepository>,
    trackers: Arc<dyn TrackerRepository>,
    templates: Arc<TemplateStore>,
    notifier: Arc<dyn AlertNotifier>,
    config: AlertGeneratorConfig,
}

impl AlertGenerator {
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        trackers: Arc<dyn TrackerRepository>,
        templates: Arc<TemplateStore>,
        notifier: Arc<dyn AlertNotifier>,
        config: AlertGeneratorConfig,
    ) -> Self {
        Self {
            alerts,
            trackers,
            templates,
            notifier,
            config,
        }
    }

    /// Closes the completed item's alert and opens alerts for newly active items.
    pub async fn reconcile(
        &self,
        project_id: &ProjectId,
        newly_active: Vec<AlertCandidate>,
        completed: Option<LineItemId>,
    ) -> Result<AlertDiff, DomainError> {
        self.apply(
            project_id,
            AlertChanges {
                completed,
                superseded: None,
                newly_active,
            },
        )
        .await
    }

    /// Applies a set of alert changes and notifies the delivery layer.
    ///
    /// Missing alerts to close are not an error. Notification failures are
    /// logged only.
    pub async fn apply(&self, project_id: &ProjectId, changes: AlertChanges) -> Result<AlertDiff, DomainError> {
        let mut diff = AlertDiff::default();

        if let Some(line_item_id) = changes.completed {
            if let Some(mut alert) = self.alerts.find_active(project_id, &line_item_id).await? {
                alert.complete()?;
                self.alerts.update(&alert).await?;
                diff.closed.push(alert);
            }
        }

        if let Some(line_item_id) = changes.superseded.filter(|id| Some(*id) != changes.completed) {
            if let Some(mut alert) = self.alerts.find_active(project_id, &line_item_id).await? {
                alert.dismiss()?;
                self.alerts.update(&alert).await?;
                diff.closed.push(alert);
            }
        }

        let now = Timestamp::now();
        for candidate in changes.newly_active {
            let alert = candidate.into_alert(now);
            if self.alerts.insert_if_no_active(&alert).await? {
                diff.opened.push(alert);
            }
        }

        self.publish(project_id, &diff).await;
        Ok(diff)
    }

    /// Logs a non-empty diff and hands it to the notifier. Delivery failures
    /// are logged only.
    async fn publish(&self, project_id: &ProjectId, diff: &AlertDiff) {
        if diff.is_empty() {
            return;
        }
        tracing::debug!(
            project_id = %project_id,
            opened = diff.opened.len(),
            closed = diff.closed.len(),
            "Alerts reconciled"
        );
        if let Err(e) = self.notifier.notify(project_id, diff).await {
            tracing::warn!(project_id = %project_id, error = %e, "Alert notification failed");
        }
    }

    /// Reconciles alerts after a tracker's pointer moved.
    ///
    /// `completed` is the item just completed, if any. When the pointer
    /// left an item that was not completed (a reversal), that item's alert
    /// is dismissed.
    pub async fn reconcile_progression(
        &self,
        tracker: &ProjectWorkflowTracker,
        template: Option<&CachedTemplate>,
        completed: Option<LineItemId>,
        shift: &PointerShift,
    ) -> Result<AlertDiff, DomainError> {
        let newly_active = shift
            .newly_active()
            .map(|pos| self.candidate_for(tracker, template, pos))
            .into_iter()
            .collect();

        self.apply(
            &tracker.project_id(),
            AlertChanges {
                completed,
                superseded: shift.superseded().map(|p| p.line_item_id),
                newly_active,
            },
        )
        .await
    }

    /// Builds the alert candidate for a tracker position.
    pub fn candidate_for(
        &self,
        tracker: &ProjectWorkflowTracker,
        template: Option<&CachedTemplate>,
        position: &WorkflowPosition,
    ) -> AlertCandidate {
        let location = template.and_then(|c| c.template.locate(&position.line_item_id));
        AlertCandidate::for_position(tracker, position, location, self.config.default_due_days)
    }

    /// Ensures every tracker's current item of a project has an ACTIVE alert,
    /// and completes ACTIVE alerts whose item is already recorded complete.
    pub async fn generate_for_project(&self, project_id: &ProjectId) -> Result<AlertDiff, DomainError> {
        let trackers = self.trackers.list_for_project(project_id).await?;

        let mut stale = AlertDiff::default();
        for mut alert in self.alerts.list_active_for_project(project_id).await? {
            let done = trackers
                .iter()
                .any(|t| t.id() == alert.tracker_id() && t.is_completed(&alert.line_item_id()));
            if done {
                alert.complete()?;
                self.alerts.update(&alert).await?;
                stale.closed.push(alert);
            }
        }
        self.publish(project_id, &stale).await;

        let mut candidates = Vec::with_capacity(trackers.len());
        for tracker in &trackers {
            if let Some(position) = tracker.current() {
                let template = self.templates.try_get_template(tracker.workflow_type()).await;
                candidates.push(self.candidate_for(tracker, template.as_deref(), position));
            }
        }

        let mut diff = self.reconcile(project_id, candidates, None).await?;
        diff.merge(stale);
        Ok(diff)
    }

    /// Runs `generate_for_project` over many projects concurrently.
    ///
    /// Safe to invoke redundantly. A failing project is logged and counted;
    /// it never aborts the batch.
    pub async fn generate_batch_alerts(&self, project_ids: &[ProjectId]) -> BatchAlertReport {
        let results: Vec<(ProjectId, Result<AlertDiff, DomainError>)> = stream::iter(project_ids.iter().copied())
            .map(|project_id| async move { (project_id, self.generate_for_project(&project_id).await) })
            .buffer_unordered(self.config.batch_concurrency.max(1))
            .collect()
            .await;

        let mut report = BatchAlertReport {
            projects: results.len(),
            ..BatchAlertReport::default()
        };
        for (project_id, result) in results {
            match result {
                Ok(diff) => report.opened += diff.opened.len(),
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(project_id = %project_id, error = %e, "Batch alert generation failed for project");
                }
            }
        }
        report
    }
}
