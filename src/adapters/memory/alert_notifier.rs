//! Recording alert notifier for tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::alert::AlertDiff;
use crate::domain::foundation::{DomainError, ProjectId};
use crate::ports::AlertNotifier;

/// Captures every delivered diff for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingAlertNotifier {
    delivered: Arc<Mutex<Vec<(ProjectId, AlertDiff)>>>,
}

impl RecordingAlertNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn delivered(&self) -> Vec<(ProjectId, AlertDiff)> {
        self.delivered.lock().await.clone()
    }

    /// Total alerts opened across every delivered diff.
    pub async fn opened_count(&self) -> usize {
        self.delivered.lock().await.iter().map(|(_, d)| d.opened.len()).sum()
    }
}

#[async_trait]
impl AlertNotifier for RecordingAlertNotifier {
    async fn notify(&self, project_id: &ProjectId, diff: &AlertDiff) -> Result<(), DomainError> {
        self.delivered.lock().await.push((*project_id, diff.clone()));
        Ok(())
    }
}
