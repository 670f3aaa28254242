//! PostgreSQL implementation of ProjectStore and PhaseOverrideStore.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, Percentage, PhaseKey, ProjectId, WorkflowType,
};
use crate::ports::{PhaseOverrideStore, ProjectRecord, ProjectStore};

#[derive(Clone)]
pub struct PostgresProjectStore {
    pool: PgPool,
}

impl PostgresProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PostgresProjectStore {
    async fn get_project(&self, id: &ProjectId) -> Result<Option<ProjectRecord>, DomainError> {
        let row = sqlx::query(
            "SELECT id, project_type, status, trade_types FROM projects WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch project", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: Uuid = row.get("id");
        let project_type: Option<String> = row.get("project_type");
        let status: Option<String> = row.get("status");
        let trade_types: Vec<String> = row.get("trade_types");

        let project_type = project_type
            .filter(|t| !t.trim().is_empty())
            .map(WorkflowType::new)
            .transpose()?;
        let trade_types = trade_types
            .into_iter()
            .map(WorkflowType::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ProjectRecord {
            id: ProjectId::from_uuid(id),
            project_type,
            status,
            trade_types,
        }))
    }

    async fn update_phase_and_progress(
        &self,
        id: &ProjectId,
        phase: PhaseKey,
        progress: Percentage,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE projects SET phase = $2, progress = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(phase.as_key())
        .bind(i16::from(progress.value()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update project", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ProjectNotFound,
                format!("Project not found: {}", id),
            ));
        }
        Ok(())
    }

    async fn list_project_ids_after(
        &self,
        after: Option<ProjectId>,
        limit: u32,
    ) -> Result<Vec<ProjectId>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM projects
            WHERE $1::uuid IS NULL OR id > $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(after.map(|id| *id.as_uuid()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list projects", e))?;

        Ok(rows
            .into_iter()
            .map(|row| ProjectId::from_uuid(row.get("id")))
            .collect())
    }
}

#[async_trait]
impl PhaseOverrideStore for PostgresProjectStore {
    async fn find_override(&self, project_id: &ProjectId) -> Result<Option<PhaseKey>, DomainError> {
        let row = sqlx::query("SELECT phase FROM project_phase_overrides WHERE project_id = $1")
            .bind(project_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch phase override", e))?;

        match row {
            Some(row) => {
                let phase: String = row.get("phase");
                Ok(Some(phase.parse::<PhaseKey>()?))
            }
            None => Ok(None),
        }
    }
}
