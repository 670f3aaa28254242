//! PostgreSQL implementation of AlertRepository.
//!
//! The partial unique index `idx_alerts_one_active_per_item` makes
//! `insert_if_no_active` a single atomic statement.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::alert::Alert;
use crate::domain::foundation::{
    AlertId, AlertPriority, AlertStatus, DomainError, ErrorCode, LineItemId, ProjectId,
    ResponsibleRole, Timestamp, TrackerId, WorkflowType,
};
use crate::ports::AlertRepository;

const SELECT_COLUMNS: &str = r#"
    SELECT id, project_id, tracker_id, workflow_type, line_item_id, status, priority,
           responsible_role, title, description, due_date, created_at, closed_at
    FROM workflow_alerts
"#;

#[derive(Clone)]
pub struct PostgresAlertRepository {
    pool: PgPool,
}

impl PostgresAlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertRepository for PostgresAlertRepository {
    async fn insert_if_no_active(&self, alert: &Alert) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO workflow_alerts (
                id, project_id, tracker_id, workflow_type, line_item_id, status, priority,
                responsible_role, title, description, due_date, created_at, closed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (project_id, line_item_id) WHERE status = 'active' DO NOTHING
            "#,
        )
        .bind(alert.id().as_uuid())
        .bind(alert.project_id().as_uuid())
        .bind(alert.tracker_id().as_uuid())
        .bind(alert.workflow_type().as_str())
        .bind(alert.line_item_id().as_uuid())
        .bind(alert.status().as_key())
        .bind(alert.priority().as_key())
        .bind(alert.responsible_role().as_key())
        .bind(alert.title())
        .bind(alert.description())
        .bind(alert.due_date().as_datetime())
        .bind(alert.created_at().as_datetime())
        .bind(alert.closed_at().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert alert", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn update(&self, alert: &Alert) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE workflow_alerts SET status = $2, closed_at = $3
            WHERE id = $1
            "#,
        )
        .bind(alert.id().as_uuid())
        .bind(alert.status().as_key())
        .bind(alert.closed_at().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update alert", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::AlertNotFound,
                format!("Alert not found: {}", alert.id()),
            ));
        }
        Ok(())
    }

    async fn find_active(
        &self,
        project_id: &ProjectId,
        line_item_id: &LineItemId,
    ) -> Result<Option<Alert>, DomainError> {
        let sql = format!(
            "{} WHERE project_id = $1 AND line_item_id = $2 AND status = 'active'",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(project_id.as_uuid())
            .bind(line_item_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch alert", e))?;

        row.map(row_to_alert).transpose()
    }

    async fn list_active_for_project(&self, project_id: &ProjectId) -> Result<Vec<Alert>, DomainError> {
        let sql = format!(
            "{} WHERE project_id = $1 AND status = 'active' ORDER BY created_at, id",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(project_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to list alerts", e))?;

        rows.into_iter().map(row_to_alert).collect()
    }
}

fn row_to_alert(row: PgRow) -> Result<Alert, DomainError> {
    let id: Uuid = row.get("id");
    let project_id: Uuid = row.get("project_id");
    let tracker_id: Uuid = row.get("tracker_id");
    let workflow_type: String = row.get("workflow_type");
    let line_item_id: Uuid = row.get("line_item_id");
    let status: String = row.get("status");
    let priority: String = row.get("priority");
    let responsible_role: String = row.get("responsible_role");
    let title: String = row.get("title");
    let description: String = row.get("description");
    let due_date: chrono::DateTime<chrono::Utc> = row.get("due_date");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let closed_at: Option<chrono::DateTime<chrono::Utc>> = row.get("closed_at");

    Ok(Alert::reconstitute(
        AlertId::from_uuid(id),
        ProjectId::from_uuid(project_id),
        TrackerId::from_uuid(tracker_id),
        WorkflowType::new(workflow_type)?,
        LineItemId::from_uuid(line_item_id),
        status.parse::<AlertStatus>()?,
        priority.parse::<AlertPriority>()?,
        responsible_role.parse::<ResponsibleRole>()?,
        title,
        description,
        Timestamp::from_datetime(due_date),
        Timestamp::from_datetime(created_at),
        closed_at.map(Timestamp::from_datetime),
    ))
}
