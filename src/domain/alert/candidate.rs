//! Alert candidates and reconciliation diffs.

use crate::domain::foundation::{
    AlertPriority, LineItemId, ProjectId, ResponsibleRole, Timestamp, TrackerId, WorkflowType,
};
use crate::domain::template::{LineItemLocation, WorkflowPosition};
use crate::domain::tracker::ProjectWorkflowTracker;

use super::Alert;

/// A line item that should have an ACTIVE alert, with its alert metadata
/// resolved from the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertCandidate {
    pub project_id: ProjectId,
    pub tracker_id: TrackerId,
    pub workflow_type: WorkflowType,
    pub line_item_id: LineItemId,
    pub priority: AlertPriority,
    pub responsible_role: ResponsibleRole,
    pub title: String,
    pub description: String,
    pub due_in_days: u32,
}

impl AlertCandidate {
    /// Builds a candidate for the tracker's item at `position`.
    ///
    /// Missing metadata defaults to MEDIUM priority, the OFFICE role, and
    /// `default_due_days`. Without a location (item no longer in the
    /// template) a generic title is used.
    pub fn for_position(
        tracker: &ProjectWorkflowTracker,
        position: &WorkflowPosition,
        location: Option<LineItemLocation<'_>>,
        default_due_days: u32,
    ) -> Self {
        let (priority, responsible_role, due_in_days, title, description) = match location {
            Some(loc) => (
                loc.line_item.priority.unwrap_or_default(),
                loc.line_item.responsible_role.unwrap_or_default(),
                loc.line_item.alert_days.unwrap_or(default_due_days),
                format!("{}: {}", loc.section.name, loc.line_item.description),
                format!(
                    "{} {} - item {}",
                    tracker.workflow_type(),
                    loc.phase.phase_type.display_name(),
                    loc.line_item.letter
                ),
            ),
            None => (
                AlertPriority::default(),
                ResponsibleRole::default(),
                default_due_days,
                format!("Line item {}", position.line_item_id),
                tracker.workflow_type().to_string(),
            ),
        };

        Self {
            project_id: tracker.project_id(),
            tracker_id: tracker.id(),
            workflow_type: tracker.workflow_type().clone(),
            line_item_id: position.line_item_id,
            priority,
            responsible_role,
            title,
            description,
            due_in_days,
        }
    }

    /// Materializes an ACTIVE alert due `due_in_days` after `now`.
    pub fn into_alert(self, now: Timestamp) -> Alert {
        Alert::open(
            self.project_id,
            self.tracker_id,
            self.workflow_type,
            self.line_item_id,
            self.priority,
            self.responsible_role,
            self.title,
            self.description,
            now.plus_days(i64::from(self.due_in_days)),
        )
    }
}

/// Alerts opened and closed by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertDiff {
    pub opened: Vec<Alert>,
    pub closed: Vec<Alert>,
}

impl AlertDiff {
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.closed.is_empty()
    }

    /// Appends another diff to this one.
    pub fn merge(&mut self, other: AlertDiff) {
        self.opened.extend(other.opened);
        self.closed.extend(other.closed);
    }
}
