//! PostgreSQL implementation of TrackerRepository.
//!
//! Completed items live in a JSONB column so pointer and completions are
//! replaced in a single UPDATE guarded by the `version` column.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, LineItemId, PhaseId, PhaseKey, ProjectId, SectionId, Timestamp,
    TrackerId, WorkflowType,
};
use crate::domain::template::WorkflowPosition;
use crate::domain::tracker::{CompletedItem, ProjectWorkflowTracker};
use crate::ports::TrackerRepository;

const SELECT_COLUMNS: &str = r#"
    SELECT id, project_id, workflow_type, trade_name, is_main_workflow,
           current_phase_id, current_section_id, current_line_item_id,
           total_line_items, total_is_estimate, starting_phase,
           completed_items, version, created_at, updated_at
    FROM project_workflow_trackers
"#;

#[derive(Clone)]
pub struct PostgresTrackerRepository {
    pool: PgPool,
}

impl PostgresTrackerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackerRepository for PostgresTrackerRepository {
    async fn insert(&self, tracker: &ProjectWorkflowTracker) -> Result<(), DomainError> {
        let current = tracker.current();
        let completed: Vec<&CompletedItem> = tracker.completed_items();

        sqlx::query(
            r#"
            INSERT INTO project_workflow_trackers (
                id, project_id, workflow_type, trade_name, is_main_workflow,
                current_phase_id, current_section_id, current_line_item_id,
                total_line_items, total_is_estimate, starting_phase,
                completed_items, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(tracker.id().as_uuid())
        .bind(tracker.project_id().as_uuid())
        .bind(tracker.workflow_type().as_str())
        .bind(tracker.trade_name())
        .bind(tracker.is_main_workflow())
        .bind(current.map(|p| *p.phase_id.as_uuid()))
        .bind(current.map(|p| *p.section_id.as_uuid()))
        .bind(current.map(|p| *p.line_item_id.as_uuid()))
        .bind(tracker.total_line_items() as i32)
        .bind(tracker.is_total_estimated())
        .bind(tracker.starting_phase().map(|p| p.as_key()))
        .bind(Json(&completed))
        .bind(tracker.version() as i64)
        .bind(tracker.created_at().as_datetime())
        .bind(tracker.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return DomainError::new(
                        ErrorCode::DuplicateTracker,
                        format!(
                            "Project {} already has a {} tracker or a main tracker",
                            tracker.project_id(),
                            tracker.workflow_type()
                        ),
                    );
                }
            }
            DomainError::database("Failed to insert tracker", e)
        })?;

        Ok(())
    }

    async fn save(&self, tracker: &ProjectWorkflowTracker) -> Result<(), DomainError> {
        let current = tracker.current();
        let completed: Vec<&CompletedItem> = tracker.completed_items();

        let result = sqlx::query(
            r#"
            UPDATE project_workflow_trackers SET
                trade_name = $2,
                is_main_workflow = $3,
                current_phase_id = $4,
                current_section_id = $5,
                current_line_item_id = $6,
                total_line_items = $7,
                total_is_estimate = $8,
                starting_phase = $9,
                completed_items = $10,
                updated_at = $11,
                version = version + 1
            WHERE id = $1 AND version = $12
            "#,
        )
        .bind(tracker.id().as_uuid())
        .bind(tracker.trade_name())
        .bind(tracker.is_main_workflow())
        .bind(current.map(|p| *p.phase_id.as_uuid()))
        .bind(current.map(|p| *p.section_id.as_uuid()))
        .bind(current.map(|p| *p.line_item_id.as_uuid()))
        .bind(tracker.total_line_items() as i32)
        .bind(tracker.is_total_estimated())
        .bind(tracker.starting_phase().map(|p| p.as_key()))
        .bind(Json(&completed))
        .bind(tracker.updated_at().as_datetime())
        .bind(tracker.version() as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update tracker", e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists = sqlx::query("SELECT 1 FROM project_workflow_trackers WHERE id = $1")
            .bind(tracker.id().as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to check tracker", e))?
            .is_some();

        if exists {
            Err(DomainError::new(
                ErrorCode::ConcurrencyConflict,
                format!("Tracker {} was modified concurrently", tracker.id()),
            ))
        } else {
            Err(DomainError::new(
                ErrorCode::TrackerNotFound,
                format!("Tracker not found: {}", tracker.id()),
            ))
        }
    }

    async fn find_by_project_and_type(
        &self,
        project_id: &ProjectId,
        workflow_type: &WorkflowType,
    ) -> Result<Option<ProjectWorkflowTracker>, DomainError> {
        let sql = format!("{} WHERE project_id = $1 AND workflow_type = $2", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(project_id.as_uuid())
            .bind(workflow_type.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch tracker", e))?;

        row.map(row_to_tracker).transpose()
    }

    async fn find_main(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<ProjectWorkflowTracker>, DomainError> {
        let sql = format!("{} WHERE project_id = $1 AND is_main_workflow", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(project_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch main tracker", e))?;

        row.map(row_to_tracker).transpose()
    }

    async fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<ProjectWorkflowTracker>, DomainError> {
        let sql = format!(
            "{} WHERE project_id = $1 ORDER BY is_main_workflow DESC, created_at, id",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(project_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to list trackers", e))?;

        rows.into_iter().map(row_to_tracker).collect()
    }

    async fn delete_for_project(&self, project_id: &ProjectId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM project_workflow_trackers WHERE project_id = $1")
            .bind(project_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete trackers", e))?;
        Ok(result.rows_affected())
    }
}

fn row_to_tracker(row: PgRow) -> Result<ProjectWorkflowTracker, DomainError> {
    let id: Uuid = row.get("id");
    let project_id: Uuid = row.get("project_id");
    let workflow_type: String = row.get("workflow_type");
    let trade_name: Option<String> = row.get("trade_name");
    let is_main_workflow: bool = row.get("is_main_workflow");
    let phase_id: Option<Uuid> = row.get("current_phase_id");
    let section_id: Option<Uuid> = row.get("current_section_id");
    let line_item_id: Option<Uuid> = row.get("current_line_item_id");
    let total_line_items: i32 = row.get("total_line_items");
    let total_is_estimate: bool = row.get("total_is_estimate");
    let starting_phase: Option<String> = row.get("starting_phase");
    let Json(completed_items): Json<Vec<CompletedItem>> = row.get("completed_items");
    let version: i64 = row.get("version");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    Ok(ProjectWorkflowTracker::reconstitute(
        TrackerId::from_uuid(id),
        ProjectId::from_uuid(project_id),
        WorkflowType::new(workflow_type)?,
        trade_name,
        is_main_workflow,
        position_from_columns(phase_id, section_id, line_item_id),
        total_line_items.max(0) as u32,
        total_is_estimate,
        starting_phase.map(|p| p.parse::<PhaseKey>()).transpose()?,
        completed_items,
        version.max(0) as u64,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}

/// All three columns set, or the workflow is exhausted.
fn position_from_columns(
    phase_id: Option<Uuid>,
    section_id: Option<Uuid>,
    line_item_id: Option<Uuid>,
) -> Option<WorkflowPosition> {
    match (phase_id, section_id, line_item_id) {
        (Some(p), Some(s), Some(l)) => Some(WorkflowPosition {
            phase_id: PhaseId::from_uuid(p),
            section_id: SectionId::from_uuid(s),
            line_item_id: LineItemId::from_uuid(l),
        }),
        _ => None,
    }
}
