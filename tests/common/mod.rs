//! Shared in-memory wiring for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use project_workflow::adapters::memory::{
    InMemoryAlertRepository, InMemoryPhaseOverrideStore, InMemoryProjectStore, InMemoryTemplateSource,
    InMemoryTrackerRepository, RecordingAlertNotifier,
};
use project_workflow::application::{WorkflowPorts, WorkflowServices};
use project_workflow::domain::foundation::{LineItemId, PhaseKey, ProjectId, WorkflowType};
use project_workflow::domain::template::{LineItem, Phase, Section, WorkflowTemplate};
use project_workflow::ports::ProjectRecord;

pub fn workflow(kind: &str) -> WorkflowType {
    WorkflowType::new(kind).unwrap()
}

/// ROOFING: LEAD (2 items), EXECUTION (1 item).
pub fn roofing() -> WorkflowTemplate {
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

pub fn gutters() -> WorkflowTemplate {
    WorkflowTemplate::new(
        workflow("GUTTERS"),
        vec![
            Phase::new(
                PhaseKey::Lead,
                1,
                vec![Section::new("Measure", 1, vec![LineItem::new("A", 1, "Measure runs")])],
            ),
            Phase::new(
                PhaseKey::Execution,
                2,
                vec![Section::new("Hang", 1, vec![LineItem::new("A", 1, "Hang gutters")])],
            ),
        ],
    )
    .unwrap()
}

/// A single-phase template with `count` line items.
pub fn long_template(kind: &str, count: u32) -> WorkflowTemplate {
    let items = (1..=count)
        .map(|n| LineItem::new(format!("{}", n), n, format!("Step {}", n)))
        .collect();
    WorkflowTemplate::new(
        workflow(kind),
        vec![Phase::new(PhaseKey::Execution, 1, vec![Section::new("Work", 1, items)])],
    )
    .unwrap()
}

pub fn item_ids(template: &WorkflowTemplate) -> Vec<LineItemId> {
    template.flatten().entries().iter().map(|e| e.line_item_id()).collect()
}

pub struct TestApp {
    pub source: Arc<InMemoryTemplateSource>,
    pub trackers: Arc<InMemoryTrackerRepository>,
    pub alerts: Arc<InMemoryAlertRepository>,
    pub projects: Arc<InMemoryProjectStore>,
    pub overrides: Arc<InMemoryPhaseOverrideStore>,
    pub notifier: Arc<RecordingAlertNotifier>,
    pub services: WorkflowServices,
}

impl TestApp {
    pub async fn with_templates(templates: &[WorkflowTemplate]) -> Self {
        let source = Arc::new(InMemoryTemplateSource::new());
        for template in templates {
            source.put(template.clone()).await;
        }
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
            source,
            trackers,
            alerts,
            projects,
            overrides,
            notifier,
            services,
        }
    }

    pub async fn project(&self, primary: &str, trades: &[&str]) -> ProjectId {
        let id = ProjectId::new();
        self.projects
            .put(ProjectRecord::new(id, Some(workflow(primary))).with_trades(trades.iter().map(|t| workflow(t)).collect()))
            .await;
        id
    }
}
