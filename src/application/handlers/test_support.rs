//! In-memory wiring shared by the handler tests.

use std::sync::Arc;

use crate::adapters::memory::{
    InMemoryAlertRepository, InMemoryPhaseOverrideStore, InMemoryProjectStore, InMemoryTemplateSource,
    InMemoryTrackerRepository, RecordingAlertNotifier,
};
use crate::application::{WorkflowPorts, WorkflowServices};
use crate::domain::foundation::{LineItemId, PhaseKey, ProjectId, WorkflowType};
use crate::domain::template::{LineItem, Phase, Section, WorkflowTemplate};
use crate::ports::ProjectRecord;

pub(crate) fn workflow(kind: &str) -> WorkflowType {
    WorkflowType::new(kind).unwrap()
}

/// LEAD (A, B) then EXECUTION (A).
pub(crate) fn roofing() -> WorkflowTemplate {
    WorkflowTemplate::new(
        workflow("ROOFING"),
        vec![
            Phase::new(
                PhaseKey::Lead,
                1,
                vec![Section::new(
                    "Lead Intake",
                    1,
                    vec![LineItem::new("A", 1, "Input customer info"), LineItem::new("B", 2, "Schedule inspection")],
                )],
            ),
            Phase::new(
                PhaseKey::Execution,
                2,
                vec![Section::new("Installation", 1, vec![LineItem::new("A", 1, "Install roof")])],
            ),
        ],
    )
    .unwrap()
}

pub(crate) fn gutters() -> WorkflowTemplate {
    WorkflowTemplate::new(
        workflow("GUTTERS"),
        vec![Phase::new(
            PhaseKey::Lead,
            1,
            vec![Section::new("Measure", 1, vec![LineItem::new("A", 1, "Measure runs")])],
        )],
    )
    .unwrap()
}

pub(crate) struct Harness {
    pub roofing: WorkflowTemplate,
    pub gutters: WorkflowTemplate,
    pub source: Arc<InMemoryTemplateSource>,
    pub trackers: Arc<InMemoryTrackerRepository>,
    pub alerts: Arc<InMemoryAlertRepository>,
    pub projects: Arc<InMemoryProjectStore>,
    pub overrides: Arc<InMemoryPhaseOverrideStore>,
    pub notifier: Arc<RecordingAlertNotifier>,
    pub services: WorkflowServices,
}

impl Harness {
    pub async fn new() -> Self {
        let (roofing, gutters) = (roofing(), gutters());
        let source = Arc::new(InMemoryTemplateSource::new());
        source.put(roofing.clone()).await;
        source.put(gutters.clone()).await;

        let trackers = Arc::new(InMemoryTrackerRepository::new());
        let alerts = Arc::new(InMemoryAlertRepository::new());
        let projects = Arc::new(InMemoryProjectStore::new());
        let overrides = Arc::new(InMemoryPhaseOverrideStore::new());
        let notifier = Arc::new(RecordingAlertNotifier::new());

        let services = WorkflowServices::with_defaults(WorkflowPorts {
            templates: source.clone(),
            trackers: trackers.clone(),
            alerts: alerts.clone(),
            projects: projects.clone(),
            overrides: overrides.clone(),
            notifier: notifier.clone(),
        });

        Self {
            roofing,
            gutters,
            source,
            trackers,
            alerts,
            projects,
            overrides,
            notifier,
            services,
        }
    }

    /// Registers a project with a primary type and extra trades.
    pub async fn project(&self, primary: &str, trades: &[&str]) -> ProjectId {
        let id = ProjectId::new();
        self.projects
            .put(
                ProjectRecord::new(id, Some(workflow(primary)))
                    .with_trades(trades.iter().map(|t| workflow(t)).collect()),
            )
            .await;
        id
    }

    /// ROOFING line item ids in sequence order.
    pub fn roofing_items(&self) -> Vec<LineItemId> {
        items(&self.roofing)
    }

    pub fn gutter_items(&self) -> Vec<LineItemId> {
        items(&self.gutters)
    }
}

fn items(template: &WorkflowTemplate) -> Vec<LineItemId> {
    template.flatten().entries().iter().map(|e| e.line_item_id()).collect()
}
