//! GetPositionHandler - Query handler for a project's current position.
//!
//! Labels are resolved from the template by stable ids. The display
//! mapper's heuristics are used only when the template cannot be loaded.

use std::sync::Arc;

use crate::domain::display::{DisplayLabel, DisplayMapper};
use crate::domain::foundation::{Percentage, PhaseKey, ProjectId, TrackerId, WorkflowType};
use crate::domain::progression::{PhaseSignals, ProgressionEngine};
use crate::domain::template::WorkflowPosition;
use crate::domain::tracker::ProjectWorkflowTracker;
use crate::ports::TrackerRepository;

use crate::application::template_store::CachedTemplate;
use crate::application::{ProjectProjection, TemplateStore, WorkflowError};

/// Query for a project's position.
#[derive(Debug, Clone)]
pub struct GetPositionQuery {
    pub project_id: ProjectId,
}

/// Position of one tracker.
#[derive(Debug, Clone)]
pub struct TrackerPosition {
    pub tracker_id: TrackerId,
    pub workflow_type: WorkflowType,
    pub trade_name: Option<String>,
    pub is_main_workflow: bool,
    pub phase: PhaseKey,
    /// `None` once the workflow is exhausted.
    pub position: Option<WorkflowPosition>,
    pub label: Option<DisplayLabel>,
    /// `None` if the template was unavailable.
    pub progress: Option<Percentage>,
}

/// A project's phase, progress, and per-tracker positions.
#[derive(Debug, Clone)]
pub struct ProjectPosition {
    pub project_id: ProjectId,
    pub phase: PhaseKey,
    pub progress: Percentage,
    /// Main tracker first.
    pub trackers: Vec<TrackerPosition>,
}

impl ProjectPosition {
    /// Position of the main tracker, or of the first one if none is flagged.
    pub fn main(&self) -> Option<&TrackerPosition> {
        self.trackers
            .iter()
            .find(|t| t.is_main_workflow)
            .or_else(|| self.trackers.first())
    }

    /// Section name of the main tracker's current item.
    pub fn section(&self) -> Option<&str> {
        self.main().and_then(|t| t.label.as_ref()).map(DisplayLabel::section)
    }

    /// Line item label of the main tracker's current item.
    pub fn line_item(&self) -> Option<&str> {
        self.main().and_then(|t| t.label.as_ref()).map(DisplayLabel::line_item)
    }
}

pub struct GetPositionHandler {
    trackers: Arc<dyn TrackerRepository>,
    templates: Arc<TemplateStore>,
    projection: Arc<ProjectProjection>,
}

impl GetPositionHandler {
    pub fn new(
        trackers: Arc<dyn TrackerRepository>,
        templates: Arc<TemplateStore>,
        projection: Arc<ProjectProjection>,
    ) -> Self {
        Self {
            trackers,
            templates,
            projection,
        }
    }

    pub async fn handle(&self, query: GetPositionQuery) -> Result<ProjectPosition, WorkflowError> {
        let project = self.projection.project(&query.project_id).await?;
        let snapshot = self.projection.compute(&project).await?;

        let trackers = self.trackers.list_for_project(&query.project_id).await?;
        let mut positions = Vec::with_capacity(trackers.len());
        for tracker in &trackers {
            let template = self.templates.try_get_template(tracker.workflow_type()).await;
            positions.push(tracker_position(tracker, template.as_deref()));
        }

        Ok(ProjectPosition {
            project_id: query.project_id,
            phase: snapshot.phase,
            progress: snapshot.progress,
            trackers: positions,
        })
    }
}

fn tracker_position(tracker: &ProjectWorkflowTracker, template: Option<&CachedTemplate>) -> TrackerPosition {
    let phase = ProgressionEngine::derive_phase_key(&PhaseSignals {
        tracker: Some(tracker),
        template: template.map(|c| &c.template),
        ..PhaseSignals::default()
    });

    let label = tracker.current().map(|pos| {
        template
            .and_then(|c| DisplayMapper::label_for_position(&c.template, pos))
            .unwrap_or_else(|| DisplayMapper::map_line_item_to_display(&pos.line_item_id.to_string(), phase))
    });

    TrackerPosition {
        tracker_id: tracker.id(),
        workflow_type: tracker.workflow_type().clone(),
        trade_name: tracker.trade_name().map(str::to_owned),
        is_main_workflow: tracker.is_main_workflow(),
        phase,
        position: tracker.current().copied(),
        label,
        progress: template.map(|c| ProgressionEngine::compute_progress(tracker, &c.sequence)),
    }
}
