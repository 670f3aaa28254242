//! Shared tracker lookup and version-guarded writes for the handlers.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, LineItemId, ProjectId, WorkflowType};
use crate::domain::tracker::ProjectWorkflowTracker;
use crate::ports::TrackerRepository;

use crate::application::template_store::CachedTemplate;
use crate::application::{TemplateStore, WorkflowError};

/// A tracker together with its loaded template.
pub(crate) struct LocatedTracker {
    pub tracker: ProjectWorkflowTracker,
    pub template: Arc<CachedTemplate>,
}

/// Finds the tracker whose workflow owns `line_item_id`.
///
/// With an explicit workflow type only that tracker is considered. With
/// `include_completed`, a tracker that recorded the item is accepted even if
/// its template no longer contains it.
///
/// # Errors
///
/// - `TemplateUnavailable` if no tracker matched and a template failed to load
/// - `UnknownLineItem` otherwise when nothing matched
pub(crate) async fn locate_tracker_for_item(
    trackers: &dyn TrackerRepository,
    templates: &TemplateStore,
    project_id: &ProjectId,
    line_item_id: LineItemId,
    workflow_type: Option<&WorkflowType>,
    include_completed: bool,
) -> Result<LocatedTracker, WorkflowError> {
    let candidates = match workflow_type {
        Some(wt) => trackers
            .find_by_project_and_type(project_id, wt)
            .await?
            .into_iter()
            .collect(),
        None => trackers.list_for_project(project_id).await?,
    };

    let mut unavailable = None;
    for tracker in candidates {
        match templates.get_template(tracker.workflow_type()).await {
            Ok(template) => {
                let owns = template.sequence.contains(&line_item_id)
                    || (include_completed && tracker.is_completed(&line_item_id));
                if owns {
                    return Ok(LocatedTracker { tracker, template });
                }
            }
            Err(e) => {
                unavailable.get_or_insert(e);
            }
        }
    }

    Err(unavailable.unwrap_or(WorkflowError::UnknownLineItem(line_item_id)))
}

/// Loads a tracker, applies `mutate`, and saves it if `mutate` reports a
/// change. A version conflict reloads and retries once, then surfaces as
/// `TrackerWriteConflict`.
///
/// Callers hold the tracker's lock from `TrackerLocks`.
pub(crate) async fn write_with_retry<T>(
    trackers: &dyn TrackerRepository,
    project_id: &ProjectId,
    workflow_type: &WorkflowType,
    mut mutate: impl FnMut(&mut ProjectWorkflowTracker) -> Result<(T, bool), WorkflowError>,
) -> Result<(ProjectWorkflowTracker, T), WorkflowError> {
    let mut retried = false;
    loop {
        let mut tracker = trackers
            .find_by_project_and_type(project_id, workflow_type)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::TrackerNotFound,
                    format!("No {} tracker for project {}", workflow_type, project_id),
                )
            })?;

        let (value, changed) = mutate(&mut tracker)?;
        if !changed {
            return Ok((tracker, value));
        }

        match trackers.save(&tracker).await {
            Ok(()) => {
                tracker.mark_persisted();
                return Ok((tracker, value));
            }
            Err(e) if e.code == ErrorCode::ConcurrencyConflict && !retried => {
                tracing::warn!(tracker_id = %tracker.id(), "Tracker write conflict; retrying once");
                retried = true;
            }
            Err(e) if e.code == ErrorCode::ConcurrencyConflict => {
                return Err(WorkflowError::TrackerWriteConflict(tracker.id()));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Maps progression-engine failures to the application taxonomy.
pub(crate) fn engine_error(err: DomainError, line_item_id: LineItemId) -> WorkflowError {
    if err.code == ErrorCode::LineItemNotFound {
        WorkflowError::UnknownLineItem(line_item_id)
    } else {
        WorkflowError::Internal(err)
    }
}
