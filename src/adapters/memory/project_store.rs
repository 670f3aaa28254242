//! In-memory project store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Percentage, PhaseKey, ProjectId};
use crate::ports::{ProjectRecord, ProjectStore};

#[derive(Debug, Clone)]
struct StoredProject {
    record: ProjectRecord,
    phase: Option<PhaseKey>,
    progress: Percentage,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectStore {
    projects: Arc<RwLock<HashMap<ProjectId, StoredProject>>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a project.
    pub async fn put(&self, record: ProjectRecord) {
        self.projects.write().await.insert(
            record.id,
            StoredProject {
                record,
                phase: None,
                progress: Percentage::ZERO,
            },
        );
    }

    /// Returns the last written phase and progress.
    pub async fn phase_and_progress(&self, id: &ProjectId) -> Option<(Option<PhaseKey>, Percentage)> {
        self.projects.read().await.get(id).map(|p| (p.phase, p.progress))
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn get_project(&self, id: &ProjectId) -> Result<Option<ProjectRecord>, DomainError> {
        Ok(self.projects.read().await.get(id).map(|p| p.record.clone()))
    }

    async fn update_phase_and_progress(
        &self,
        id: &ProjectId,
        phase: PhaseKey,
        progress: Percentage,
    ) -> Result<(), DomainError> {
        let mut projects = self.projects.write().await;
        let stored = projects.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::ProjectNotFound, format!("Project {} not found", id))
        })?;
        stored.phase = Some(phase);
        stored.progress = progress;
        Ok(())
    }

    async fn list_project_ids_after(
        &self,
        after: Option<ProjectId>,
        limit: u32,
    ) -> Result<Vec<ProjectId>, DomainError> {
        let projects = self.projects.read().await;
        let mut ids: Vec<_> = projects
            .keys()
            .copied()
            .filter(|id| after.map_or(true, |a| *id > a))
            .collect();
        ids.sort();
        ids.truncate(limit as usize);
        Ok(ids)
    }
}
