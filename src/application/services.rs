//! WorkflowServices - wires every handler over one set of ports.

use std::sync::Arc;

use crate::ports::{
    AlertNotifier, AlertRepository, PhaseOverrideStore, ProjectStore, TemplateSource, TrackerRepository,
};

use super::handlers::{
    CompleteLineItemHandler, EnsureReadyHandler, GetPositionHandler, InitializeWorkflowHandler,
    UncompleteLineItemHandler,
};
use super::{
    AlertGenerator, AlertGeneratorConfig, ProjectProjection, TemplateStore, TemplateStoreConfig, TrackerLocks,
};

/// The adapters the workflow engine runs against.
#[derive(Clone)]
pub struct WorkflowPorts {
    pub templates: Arc<dyn TemplateSource>,
    pub trackers: Arc<dyn TrackerRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub projects: Arc<dyn ProjectStore>,
    pub overrides: Arc<dyn PhaseOverrideStore>,
    pub notifier: Arc<dyn AlertNotifier>,
}

/// Handlers sharing one template cache and one lock table.
pub struct WorkflowServices {
    pub templates: Arc<TemplateStore>,
    pub alerts: Arc<AlertGenerator>,
    pub projection: Arc<ProjectProjection>,
    pub complete_line_item: CompleteLineItemHandler,
    pub uncomplete_line_item: UncompleteLineItemHandler,
    pub get_position: GetPositionHandler,
    pub initialize_workflow: Arc<InitializeWorkflowHandler>,
    pub ensure_ready: Arc<EnsureReadyHandler>,
}

impl WorkflowServices {
    pub fn new(
        ports: WorkflowPorts,
        template_config: TemplateStoreConfig,
        alert_config: AlertGeneratorConfig,
    ) -> Self {
        let templates = Arc::new(TemplateStore::with_config(ports.templates, template_config));
        let locks = Arc::new(TrackerLocks::new());
        let alerts = Arc::new(AlertGenerator::new(
            ports.alerts,
            ports.trackers.clone(),
            templates.clone(),
            ports.notifier,
            alert_config,
        ));
        let projection = Arc::new(ProjectProjection::new(
            ports.projects,
            ports.overrides,
            ports.trackers.clone(),
            templates.clone(),
        ));

        let initialize_workflow = Arc::new(InitializeWorkflowHandler::new(
            ports.trackers.clone(),
            templates.clone(),
            alerts.clone(),
            projection.clone(),
        ));
        let ensure_ready = Arc::new(EnsureReadyHandler::new(
            ports.trackers.clone(),
            templates.clone(),
            locks.clone(),
            initialize_workflow.clone(),
            alerts.clone(),
            projection.clone(),
        ));

        Self {
            complete_line_item: CompleteLineItemHandler::new(
                ports.trackers.clone(),
                templates.clone(),
                locks.clone(),
                alerts.clone(),
                projection.clone(),
            ),
            uncomplete_line_item: UncompleteLineItemHandler::new(
                ports.trackers.clone(),
                templates.clone(),
                locks,
                alerts.clone(),
                projection.clone(),
            ),
            get_position: GetPositionHandler::new(ports.trackers, templates.clone(), projection.clone()),
            initialize_workflow,
            ensure_ready,
            templates,
            alerts,
            projection,
        }
    }

    /// Builds services with default cache and alert settings.
    pub fn with_defaults(ports: WorkflowPorts) -> Self {
        Self::new(ports, TemplateStoreConfig::default(), AlertGeneratorConfig::default())
    }
}
