//! Project store port.
//!
//! Projects are owned by an external system. The workflow core reads the
//! declared workflow types at initialization and writes back the derived
//! phase and progress after each progression event.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Percentage, PhaseKey, ProjectId, WorkflowType};

/// The project fields the workflow core reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: ProjectId,
    /// Primary workflow type, if declared.
    pub project_type: Option<WorkflowType>,
    /// External free-form status (e.g. "approved").
    pub status: Option<String>,
    /// Additional trade workflow types.
    pub trade_types: Vec<WorkflowType>,
}

impl ProjectRecord {
    pub fn new(id: ProjectId, project_type: Option<WorkflowType>) -> Self {
        Self {
            id,
            project_type,
            status: None,
            trade_types: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_trades(mut self, trades: Vec<WorkflowType>) -> Self {
        self.trade_types = trades;
        self
    }

    /// Returns every declared workflow type, primary first, without duplicates.
    pub fn declared_workflow_types(&self) -> Vec<WorkflowType> {
        let mut types: Vec<WorkflowType> = Vec::new();
        for wt in self.project_type.iter().chain(self.trade_types.iter()) {
            if !types.contains(wt) {
                types.push(wt.clone());
            }
        }
        types
    }
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Load a project. Returns `None` if it doesn't exist.
    async fn get_project(&self, id: &ProjectId) -> Result<Option<ProjectRecord>, DomainError>;

    /// Write back the derived display phase and progress.
    ///
    /// # Errors
    ///
    /// - `ProjectNotFound` if the project doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update_phase_and_progress(
        &self,
        id: &ProjectId,
        phase: PhaseKey,
        progress: Percentage,
    ) -> Result<(), DomainError>;

    /// Page through project ids in ascending order, for the healing sweep.
    ///
    /// Returns up to `limit` ids strictly greater than `after` (from the
    /// start when `None`). Every project is listed regardless of its phase:
    /// the project phase follows the main tracker only, so a finished
    /// project can still hold secondary trackers needing repair.
    async fn list_project_ids_after(
        &self,
        after: Option<ProjectId>,
        limit: u32,
    ) -> Result<Vec<ProjectId>, DomainError>;
}
