//! Alert notifier port.
//!
//! Receives the opened/closed diff of each reconciliation. Delivery is best
//! effort: a failed notification never fails the progression event.

use async_trait::async_trait;

use crate::domain::alert::AlertDiff;
use crate::domain::foundation::{DomainError, ProjectId};

#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Deliver an alert diff for a project.
    async fn notify(&self, project_id: &ProjectId, diff: &AlertDiff) -> Result<(), DomainError>;
}
