//! Alert aggregate - a notification meaning "this line item is actionable now".
//!
//! Alerts never expire on their own. An ACTIVE alert is closed either by the
//! line item being completed or by being dismissed (superseded or external).

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AlertId, AlertPriority, AlertStatus, DomainError, ErrorCode, LineItemId, ProjectId,
    ResponsibleRole, Timestamp, TrackerId, WorkflowType,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    id: AlertId,
    project_id: ProjectId,
    tracker_id: TrackerId,
    workflow_type: WorkflowType,
    line_item_id: LineItemId,
    status: AlertStatus,
    priority: AlertPriority,
    responsible_role: ResponsibleRole,
    title: String,
    description: String,
    due_date: Timestamp,
    created_at: Timestamp,
    closed_at: Option<Timestamp>,
}

impl Alert {
    /// Opens a new ACTIVE alert.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        project_id: ProjectId,
        tracker_id: TrackerId,
        workflow_type: WorkflowType,
        line_item_id: LineItemId,
        priority: AlertPriority,
        responsible_role: ResponsibleRole,
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: Timestamp,
    ) -> Self {
        Self {
            id: AlertId::new(),
            project_id,
            tracker_id,
            workflow_type,
            line_item_id,
            status: AlertStatus::Active,
            priority,
            responsible_role,
            title: title.into(),
            description: description.into(),
            due_date,
            created_at: Timestamp::now(),
            closed_at: None,
        }
    }

    /// Reconstitutes an alert from persisted data.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: AlertId,
        project_id: ProjectId,
        tracker_id: TrackerId,
        workflow_type: WorkflowType,
        line_item_id: LineItemId,
        status: AlertStatus,
        priority: AlertPriority,
        responsible_role: ResponsibleRole,
        title: String,
        description: String,
        due_date: Timestamp,
        created_at: Timestamp,
        closed_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id,
            project_id,
            tracker_id,
            workflow_type,
            line_item_id,
            status,
            priority,
            responsible_role,
            title,
            description,
            due_date,
            created_at,
            closed_at,
        }
    }

    pub fn id(&self) -> AlertId {
        self.id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn tracker_id(&self) -> TrackerId {
        self.tracker_id
    }

    pub fn workflow_type(&self) -> &WorkflowType {
        &self.workflow_type
    }

    pub fn line_item_id(&self) -> LineItemId {
        self.line_item_id
    }

    pub fn status(&self) -> AlertStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn priority(&self) -> AlertPriority {
        self.priority
    }

    pub fn responsible_role(&self) -> ResponsibleRole {
        self.responsible_role
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn due_date(&self) -> Timestamp {
        self.due_date
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn closed_at(&self) -> Option<Timestamp> {
        self.closed_at
    }

    /// Returns true if an ACTIVE alert is past its due date.
    pub fn is_overdue(&self, now: &Timestamp) -> bool {
        self.is_active() && self.due_date.is_before(now)
    }

    /// Closes the alert because its line item was completed.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the alert is already closed
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.close(AlertStatus::Completed)
    }

    /// Closes the alert without its line item being completed.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the alert is already closed
    pub fn dismiss(&mut self) -> Result<(), DomainError> {
        self.close(AlertStatus::Dismissed)
    }

    fn close(&mut self, target: AlertStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(&target) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Alert {} is {} and cannot become {}", self.id, self.status, target),
            ));
        }
        self.status = target;
        self.closed_at = Some(Timestamp::now());
        Ok(())
    }
}
