//! Alert repository port.
//!
//! `insert_if_no_active` is the sole guard of the at-most-one-ACTIVE-alert
//! invariant, so implementations must make the check and the insert atomic.

use async_trait::async_trait;

use crate::domain::alert::Alert;
use crate::domain::foundation::{DomainError, LineItemId, ProjectId};

#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Insert an ACTIVE alert unless one already exists for its
    /// (project, line item). Returns true if inserted.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn insert_if_no_active(&self, alert: &Alert) -> Result<bool, DomainError>;

    /// Persist a status change.
    ///
    /// # Errors
    ///
    /// - `AlertNotFound` if the alert doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, alert: &Alert) -> Result<(), DomainError>;

    /// Find the ACTIVE alert for a (project, line item).
    async fn find_active(
        &self,
        project_id: &ProjectId,
        line_item_id: &LineItemId,
    ) -> Result<Option<Alert>, DomainError>;

    /// List all ACTIVE alerts of a project, oldest first.
    async fn list_active_for_project(&self, project_id: &ProjectId) -> Result<Vec<Alert>, DomainError>;
}
