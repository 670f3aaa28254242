//! In-memory phase override store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, PhaseKey, ProjectId};
use crate::ports::PhaseOverrideStore;

#[derive(Debug, Clone, Default)]
pub struct InMemoryPhaseOverrideStore {
    overrides: Arc<RwLock<HashMap<ProjectId, PhaseKey>>>,
}

impl InMemoryPhaseOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, project_id: ProjectId, phase: PhaseKey) {
        self.overrides.write().await.insert(project_id, phase);
    }

    pub async fn clear(&self, project_id: &ProjectId) {
        self.overrides.write().await.remove(project_id);
    }
}

#[async_trait]
impl PhaseOverrideStore for InMemoryPhaseOverrideStore {
    async fn find_override(&self, project_id: &ProjectId) -> Result<Option<PhaseKey>, DomainError> {
        Ok(self.overrides.read().await.get(project_id).copied())
    }
}
