//! Multi-workflow tracker initialization.

use std::collections::HashSet;

use crate::domain::foundation::{PhaseKey, ProjectId, WorkflowType};
use crate::domain::template::FlattenedSequence;
use crate::domain::tracker::ProjectWorkflowTracker;

use super::ProgressionEngine;

/// One workflow to initialize for a project.
///
/// `sequence` is `None` when the template could not be loaded; the tracker is
/// still created, carrying the default estimate and no pointer, and is later
/// repaired by `ensure_ready`.
#[derive(Debug, Clone)]
pub struct WorkflowRequest<'a> {
    pub workflow_type: WorkflowType,
    pub trade_name: Option<String>,
    pub sequence: Option<&'a FlattenedSequence>,
}

impl<'a> WorkflowRequest<'a> {
    pub fn new(workflow_type: WorkflowType, sequence: Option<&'a FlattenedSequence>) -> Self {
        Self {
            workflow_type,
            trade_name: None,
            sequence,
        }
    }

    pub fn with_trade_name(mut self, trade_name: impl Into<String>) -> Self {
        self.trade_name = Some(trade_name.into());
        self
    }
}

impl ProgressionEngine {
    /// Creates one tracker per distinct requested workflow type.
    ///
    /// Exactly one tracker is flagged main: the `primary` type if it was
    /// requested, otherwise the first request. Duplicate types keep the first
    /// request. Each tracker starts at its own template's first item, or at
    /// `starting_phase` when given.
    pub fn initialize_multiple_workflows(
        project_id: ProjectId,
        requests: &[WorkflowRequest<'_>],
        primary: Option<&WorkflowType>,
        starting_phase: Option<PhaseKey>,
        default_total_line_items: u32,
    ) -> Vec<ProjectWorkflowTracker> {
        let mut seen = HashSet::new();
        let distinct: Vec<&WorkflowRequest<'_>> = requests
            .iter()
            .filter(|r| seen.insert(r.workflow_type.clone()))
            .collect();

        let main_index = primary
            .and_then(|p| distinct.iter().position(|r| &r.workflow_type == p))
            .unwrap_or(0);

        distinct
            .into_iter()
            .enumerate()
            .map(|(idx, request)| {
                let total = match request.sequence {
                    Some(seq) => seq.len() as u32,
                    None => default_total_line_items,
                };
                let mut tracker = ProjectWorkflowTracker::new(
                    project_id,
                    request.workflow_type.clone(),
                    idx == main_index,
                    total,
                )
                .with_starting_phase(starting_phase);
                if let Some(name) = &request.trade_name {
                    tracker = tracker.with_trade_name(name.clone());
                }
                match request.sequence {
                    Some(seq) => {
                        Self::start(&mut tracker, seq, starting_phase);
                    }
                    None => tracker = tracker.with_estimated_total(),
                }
                tracker
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::{LineItem, Phase, Section, WorkflowTemplate};

    fn template(kind: &str) -> WorkflowTemplate {
        WorkflowTemplate::new(
            WorkflowType::new(kind).unwrap(),
            vec![
                Phase::new(PhaseKey::Lead, 1, vec![Section::new("Intake", 1, vec![LineItem::new("A", 1, "Call")])]),
                Phase::new(PhaseKey::Execution, 2, vec![Section::new("Install", 1, vec![LineItem::new("A", 1, "Build")])]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn roofing_and_gutters_get_one_main_tracker_each_at_first_item() {
        let roofing = template("ROOFING").flatten();
        let gutters = template("GUTTERS").flatten();
        let requests = [
            WorkflowRequest::new(roofing.workflow_type().clone(), Some(&roofing)),
            WorkflowRequest::new(gutters.workflow_type().clone(), Some(&gutters)).with_trade_name("Gutters"),
        ];

        let trackers =
            ProgressionEngine::initialize_multiple_workflows(ProjectId::new(), &requests, None, None, 25);

        assert_eq!(trackers.len(), 2);
        assert_eq!(trackers.iter().filter(|t| t.is_main_workflow()).count(), 1);
        assert!(trackers[0].is_main_workflow());
        assert_eq!(trackers[0].current_line_item_id(), roofing.first().map(|e| e.line_item_id()));
        assert_eq!(trackers[1].current_line_item_id(), gutters.first().map(|e| e.line_item_id()));
        assert_eq!(trackers[1].trade_name(), Some("Gutters"));
    }

    #[test]
    fn declared_primary_becomes_main() {
        let roofing = template("ROOFING").flatten();
        let gutters = template("GUTTERS").flatten();
        let requests = [
            WorkflowRequest::new(roofing.workflow_type().clone(), Some(&roofing)),
            WorkflowRequest::new(gutters.workflow_type().clone(), Some(&gutters)),
        ];

        let trackers = ProgressionEngine::initialize_multiple_workflows(
            ProjectId::new(),
            &requests,
            Some(gutters.workflow_type()),
            None,
            25,
        );

        assert!(!trackers[0].is_main_workflow());
        assert!(trackers[1].is_main_workflow());
    }

    #[test]
    fn primary_not_requested_falls_back_to_first() {
        let roofing = template("ROOFING").flatten();
        let requests = [WorkflowRequest::new(roofing.workflow_type().clone(), Some(&roofing))];
        let siding = WorkflowType::new("SIDING").unwrap();

        let trackers =
            ProgressionEngine::initialize_multiple_workflows(ProjectId::new(), &requests, Some(&siding), None, 25);

        assert!(trackers[0].is_main_workflow());
    }

    #[test]
    fn duplicate_types_are_collapsed() {
        let roofing = template("ROOFING").flatten();
        let requests = [
            WorkflowRequest::new(roofing.workflow_type().clone(), Some(&roofing)),
            WorkflowRequest::new(roofing.workflow_type().clone(), Some(&roofing)),
        ];

        let trackers =
            ProgressionEngine::initialize_multiple_workflows(ProjectId::new(), &requests, None, None, 25);
        assert_eq!(trackers.len(), 1);
    }

    #[test]
    fn missing_template_uses_default_estimate_without_pointer() {
        let requests = [WorkflowRequest::new(WorkflowType::new("ROOFING").unwrap(), None)];

        let trackers =
            ProgressionEngine::initialize_multiple_workflows(ProjectId::new(), &requests, None, None, 25);

        assert_eq!(trackers[0].total_line_items(), 25);
        assert!(trackers[0].current().is_none());
        assert!(trackers[0].is_half_initialized());
        assert!(trackers[0].is_total_estimated());
    }

    #[test]
    fn starting_phase_is_recorded_when_template_is_missing() {
        let requests = [WorkflowRequest::new(WorkflowType::new("ROOFING").unwrap(), None)];

        let trackers = ProgressionEngine::initialize_multiple_workflows(
            ProjectId::new(),
            &requests,
            None,
            Some(PhaseKey::Execution),
            25,
        );

        assert_eq!(trackers[0].starting_phase(), Some(PhaseKey::Execution));
        assert_eq!(trackers[0].completed_count(), 0);
    }

    #[test]
    fn starting_phase_applies_to_every_tracker() {
        let roofing = template("ROOFING").flatten();
        let requests = [WorkflowRequest::new(roofing.workflow_type().clone(), Some(&roofing))];

        let trackers = ProgressionEngine::initialize_multiple_workflows(
            ProjectId::new(),
            &requests,
            None,
            Some(PhaseKey::Execution),
            25,
        );

        assert_eq!(trackers[0].current_line_item_id(), roofing.get(1).map(|e| e.line_item_id()));
        assert_eq!(trackers[0].completed_count(), 1);
    }
}
