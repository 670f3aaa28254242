//! Phase override port - manual display-phase overrides per project.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PhaseKey, ProjectId};

#[async_trait]
pub trait PhaseOverrideStore: Send + Sync {
    /// Find the active override for a project, if any.
    async fn find_override(&self, project_id: &ProjectId) -> Result<Option<PhaseKey>, DomainError>;
}
