//! TracingAlertNotifier - delivers alert diffs to the log.
//!
//! The default delivery channel for the sweep binary, where no external
//! notification service is wired.

use async_trait::async_trait;

use crate::domain::alert::AlertDiff;
use crate::domain::foundation::{DomainError, ProjectId};
use crate::ports::AlertNotifier;

#[derive(Debug, Clone, Default)]
pub struct TracingAlertNotifier;

impl TracingAlertNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertNotifier for TracingAlertNotifier {
    async fn notify(&self, project_id: &ProjectId, diff: &AlertDiff) -> Result<(), DomainError> {
        for alert in &diff.opened {
            tracing::info!(
                project_id = %project_id,
                alert_id = %alert.id(),
                line_item_id = %alert.line_item_id(),
                priority = %alert.priority(),
                responsible_role = %alert.responsible_role(),
                due_date = %alert.due_date().as_datetime(),
                "Alert opened: {}",
                alert.title()
            );
        }
        for alert in &diff.closed {
            tracing::info!(
                project_id = %project_id,
                alert_id = %alert.id(),
                line_item_id = %alert.line_item_id(),
                status = %alert.status(),
                "Alert closed"
            );
        }
        Ok(())
    }
}
