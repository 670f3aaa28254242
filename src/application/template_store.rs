//! TemplateStore - process-wide, read-mostly cache over a TemplateSource.
//!
//! Each entry holds a template together with its flattened sequence so the
//! progression engine never flattens on the hot path. Entries are dropped
//! explicitly with `invalidate` when the import pipeline edits a template,
//! and optionally after a TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::foundation::WorkflowType;
use crate::domain::template::{FlattenedSequence, WorkflowTemplate};
use crate::ports::TemplateSource;

use super::WorkflowError;

/// Used by `get_total_line_item_count` when a template cannot be loaded.
pub const DEFAULT_TOTAL_LINE_ITEMS: u32 = 25;

/// A loaded template and its canonical order.
#[derive(Debug)]
pub struct CachedTemplate {
    pub template: WorkflowTemplate,
    pub sequence: FlattenedSequence,
    loaded_at: Instant,
}

/// Configuration for [`TemplateStore`].
#[derive(Debug, Clone)]
pub struct TemplateStoreConfig {
    /// Progress denominator reported when a template is unavailable.
    pub default_total_line_items: u32,

    /// Cache entry lifetime; `None` keeps entries until invalidated.
    pub ttl: Option<Duration>,
}

impl Default for TemplateStoreConfig {
    fn default() -> Self {
        Self {
            default_total_line_items: DEFAULT_TOTAL_LINE_ITEMS,
            ttl: None,
        }
    }
}

impl TemplateStoreConfig {
    pub fn with_default_total(mut self, total: u32) -> Self {
        self.default_total_line_items = total;
        self
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }
}

pub struct TemplateStore {
    source: Arc<dyn TemplateSource>,
    cache: RwLock<HashMap<WorkflowType, Arc<CachedTemplate>>>,
    config: TemplateStoreConfig,
}

impl TemplateStore {
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self::with_config(source, TemplateStoreConfig::default())
    }

    pub fn with_config(source: Arc<dyn TemplateSource>, config: TemplateStoreConfig) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns the template and its sequence for a workflow type.
    ///
    /// # Errors
    ///
    /// - `TemplateUnavailable` if the template is missing, invalid, or the
    ///   source failed
    pub async fn get_template(
        &self,
        workflow_type: &WorkflowType,
    ) -> Result<Arc<CachedTemplate>, WorkflowError> {
        if let Some(hit) = self.cached(workflow_type).await {
            return Ok(hit);
        }

        let template = match self.source.load_template(workflow_type).await {
            Ok(Some(template)) => template,
            Ok(None) => {
                tracing::warn!(workflow_type = %workflow_type, "No template stored for workflow type");
                return Err(WorkflowError::TemplateUnavailable(workflow_type.clone()));
            }
            Err(e) => {
                tracing::warn!(workflow_type = %workflow_type, error = %e, "Template load failed");
                return Err(WorkflowError::TemplateUnavailable(workflow_type.clone()));
            }
        };

        let entry = Arc::new(CachedTemplate {
            sequence: template.flatten(),
            template,
            loaded_at: Instant::now(),
        });
        self.cache
            .write()
            .await
            .insert(workflow_type.clone(), Arc::clone(&entry));
        tracing::debug!(workflow_type = %workflow_type, line_items = entry.sequence.len(), "Template cached");
        Ok(entry)
    }

    /// Like `get_template`, but logs and returns `None` on failure.
    pub async fn try_get_template(&self, workflow_type: &WorkflowType) -> Option<Arc<CachedTemplate>> {
        self.get_template(workflow_type).await.ok()
    }

    /// Returns the canonical `(phase, section, line item)` order.
    pub async fn flatten_sequence(
        &self,
        workflow_type: &WorkflowType,
    ) -> Result<FlattenedSequence, WorkflowError> {
        Ok(self.get_template(workflow_type).await?.sequence.clone())
    }

    /// Returns the progress denominator for a workflow type.
    ///
    /// Never fails: an unavailable template yields the configured default
    /// estimate.
    pub async fn get_total_line_item_count(&self, workflow_type: &WorkflowType) -> u32 {
        match self.get_template(workflow_type).await {
            Ok(entry) => entry.sequence.len() as u32,
            Err(_) => self.config.default_total_line_items,
        }
    }

    /// The configured fallback denominator.
    pub fn default_total_line_items(&self) -> u32 {
        self.config.default_total_line_items
    }

    /// Drops one cached template after an edit.
    pub async fn invalidate(&self, workflow_type: &WorkflowType) {
        self.cache.write().await.remove(workflow_type);
    }

    /// Drops every cached template.
    pub async fn invalidate_all(&self) {
        self.cache.write().await.clear();
    }

    async fn cached(&self, workflow_type: &WorkflowType) -> Option<Arc<CachedTemplate>> {
        let cache = self.cache.read().await;
        let entry = cache.get(workflow_type)?;
        match self.config.ttl {
            Some(ttl) if entry.loaded_at.elapsed() >= ttl => None,
            _ => Some(Arc::clone(entry)),
        }
    }
}
