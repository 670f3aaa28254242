//! In-memory template source.
//!
//! Useful for tests and local runs. Can be switched into an unavailable
//! mode to exercise the soft-fail paths of workflow initialization.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, WorkflowType};
use crate::domain::template::WorkflowTemplate;
use crate::ports::TemplateSource;

#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateSource {
    templates: Arc<RwLock<HashMap<WorkflowType, WorkflowTemplate>>>,
    unavailable: Arc<AtomicBool>,
    loads: Arc<AtomicUsize>,
}

impl InMemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores (or replaces) a template.
    pub async fn put(&self, template: WorkflowTemplate) {
        self.templates
            .write()
            .await
            .insert(template.workflow_type().clone(), template);
    }

    /// Removes a template.
    pub async fn remove(&self, workflow_type: &WorkflowType) {
        self.templates.write().await.remove(workflow_type);
    }

    /// Makes every load fail with a database error until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `load_template` calls served so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TemplateSource for InMemoryTemplateSource {
    async fn load_template(
        &self,
        workflow_type: &WorkflowType,
    ) -> Result<Option<WorkflowTemplate>, DomainError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::database("load template", "template source unavailable"));
        }
        Ok(self.templates.read().await.get(workflow_type).cloned())
    }

    async fn list_workflow_types(&self) -> Result<Vec<WorkflowType>, DomainError> {
        let mut types: Vec<_> = self.templates.read().await.keys().cloned().collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(types)
    }
}
