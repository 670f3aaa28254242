//! In-memory alert repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::alert::Alert;
use crate::domain::foundation::{AlertId, DomainError, ErrorCode, LineItemId, ProjectId};
use crate::ports::AlertRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryAlertRepository {
    alerts: Arc<RwLock<HashMap<AlertId, Alert>>>,
}

impl InMemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored alert, any status, oldest first.
    pub async fn all(&self) -> Vec<Alert> {
        let mut alerts: Vec<_> = self.alerts.read().await.values().cloned().collect();
        alerts.sort_by_key(|a| (a.created_at(), a.id()));
        alerts
    }
}

#[async_trait]
impl AlertRepository for InMemoryAlertRepository {
    async fn insert_if_no_active(&self, alert: &Alert) -> Result<bool, DomainError> {
        // Check and insert under one write guard.
        let mut alerts = self.alerts.write().await;
        let exists = alerts.values().any(|a| {
            a.is_active()
                && a.project_id() == alert.project_id()
                && a.line_item_id() == alert.line_item_id()
        });
        if exists {
            return Ok(false);
        }
        alerts.insert(alert.id(), alert.clone());
        Ok(true)
    }

    async fn update(&self, alert: &Alert) -> Result<(), DomainError> {
        let mut alerts = self.alerts.write().await;
        match alerts.get_mut(&alert.id()) {
            Some(stored) => {
                *stored = alert.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::AlertNotFound,
                format!("Alert {} not found", alert.id()),
            )),
        }
    }

    async fn find_active(
        &self,
        project_id: &ProjectId,
        line_item_id: &LineItemId,
    ) -> Result<Option<Alert>, DomainError> {
        let alerts = self.alerts.read().await;
        Ok(alerts
            .values()
            .find(|a| a.is_active() && a.project_id() == *project_id && a.line_item_id() == *line_item_id)
            .cloned())
    }

    async fn list_active_for_project(&self, project_id: &ProjectId) -> Result<Vec<Alert>, DomainError> {
        let alerts = self.alerts.read().await;
        let mut active: Vec<_> = alerts
            .values()
            .filter(|a| a.is_active() && a.project_id() == *project_id)
            .cloned()
            .collect();
        active.sort_by_key(|a| (a.created_at(), a.id()));
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{AlertPriority, ResponsibleRole, Timestamp, TrackerId, WorkflowType};

    fn alert(project_id: ProjectId, line_item_id: LineItemId) -> Alert {
        Alert::open(
            project_id,
            TrackerId::new(),
            WorkflowType::new("ROOFING").unwrap(),
            line_item_id,
            AlertPriority::Medium,
            ResponsibleRole::Office,
            "title",
            "description",
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn second_active_alert_for_same_item_is_refused() {
        let repo = InMemoryAlertRepository::new();
        let (project, item) = (ProjectId::new(), LineItemId::new());

        assert!(repo.insert_if_no_active(&alert(project, item)).await.unwrap());
        assert!(!repo.insert_if_no_active(&alert(project, item)).await.unwrap());
        assert_eq!(repo.list_active_for_project(&project).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closed_alert_allows_a_new_active_one() {
        let repo = InMemoryAlertRepository::new();
        let (project, item) = (ProjectId::new(), LineItemId::new());
        let mut first = alert(project, item);
        repo.insert_if_no_active(&first).await.unwrap();

        first.complete().unwrap();
        repo.update(&first).await.unwrap();

        assert!(repo.find_active(&project, &item).await.unwrap().is_none());
        assert!(repo.insert_if_no_active(&alert(project, item)).await.unwrap());
        assert_eq!(repo.all().await.len(), 2);
    }

    #[tokio::test]
    async fn update_unknown_alert_fails() {
        let repo = InMemoryAlertRepository::new();
        let err = repo.update(&alert(ProjectId::new(), LineItemId::new())).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AlertNotFound);
    }
}
