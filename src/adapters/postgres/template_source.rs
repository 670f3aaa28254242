//! PostgreSQL implementation of TemplateSource.
//!
//! Each workflow type's phases are stored as one JSONB body. Bodies are
//! re-validated through `WorkflowTemplate::new` on load.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, WorkflowType};
use crate::domain::template::{Phase, WorkflowTemplate};
use crate::ports::TemplateSource;

#[derive(Serialize, Deserialize)]
struct TemplateBody {
    phases: Vec<Phase>,
}

#[derive(Clone)]
pub struct PostgresTemplateSource {
    pool: PgPool,
}

impl PostgresTemplateSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores or replaces a template. Called by the import pipeline; the
    /// template store's cache must be invalidated afterwards.
    pub async fn upsert(&self, template: &WorkflowTemplate) -> Result<(), DomainError> {
        let body = TemplateBody {
            phases: template.phases().to_vec(),
        };
        sqlx::query(
            r#"
            INSERT INTO workflow_templates (workflow_type, body, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (workflow_type)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(template.workflow_type().as_str())
        .bind(Json(&body))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to upsert template", e))?;
        Ok(())
    }
}

#[async_trait]
impl TemplateSource for PostgresTemplateSource {
    async fn load_template(
        &self,
        workflow_type: &WorkflowType,
    ) -> Result<Option<WorkflowTemplate>, DomainError> {
        let row = sqlx::query("SELECT body FROM workflow_templates WHERE workflow_type = $1")
            .bind(workflow_type.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch template", e))?;

        match row {
            Some(row) => {
                let Json(body): Json<TemplateBody> = row.get("body");
                WorkflowTemplate::new(workflow_type.clone(), body.phases).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_workflow_types(&self) -> Result<Vec<WorkflowType>, DomainError> {
        let rows = sqlx::query("SELECT workflow_type FROM workflow_templates ORDER BY workflow_type")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to list templates", e))?;

        rows.into_iter()
            .map(|row| {
                let raw: String = row.get("workflow_type");
                WorkflowType::new(raw).map_err(DomainError::from)
            })
            .collect()
    }
}
