//! ProjectWorkflowTracker aggregate - per-project, per-workflow-type progression state.
//!
//! A tracker is the unit of both identity and concurrency control: each trade
//! on a project progresses independently through its own template.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    LineItemId, PhaseId, PhaseKey, ProjectId, SectionId, Timestamp, TrackerId, WorkflowType,
};
use crate::domain::template::{FlattenedSequence, WorkflowPosition};

/// Record of one finished (or skipped) line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedItem {
    pub line_item_id: LineItemId,
    pub section_id: SectionId,
    pub phase_id: PhaseId,
    pub completed_at: Timestamp,
    #[serde(default)]
    pub notes: Option<String>,
    /// True when the item was passed over by a starting-phase skip rather
    /// than actually worked.
    #[serde(default)]
    pub skipped: bool,
}

impl CompletedItem {
    /// Creates a record for a worked line item.
    pub fn completed(position: &WorkflowPosition, at: Timestamp, notes: Option<String>) -> Self {
        Self {
            line_item_id: position.line_item_id,
            section_id: position.section_id,
            phase_id: position.phase_id,
            completed_at: at,
            notes,
            skipped: false,
        }
    }

    /// Creates a record for a line item skipped at initialization.
    pub fn skipped(position: &WorkflowPosition, at: Timestamp) -> Self {
        Self {
            skipped: true,
            ..Self::completed(position, at, None)
        }
    }
}

/// The tracker aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectWorkflowTracker {
    id: TrackerId,
    project_id: ProjectId,
    workflow_type: WorkflowType,
    trade_name: Option<String>,
    is_main_workflow: bool,
    current: Option<WorkflowPosition>,
    total_line_items: u32,
    /// True while `total_line_items` is the default estimate rather than
    /// the template's count.
    total_is_estimate: bool,
    /// Phase requested at initialization, kept so a deferred start honors it.
    starting_phase: Option<PhaseKey>,
    completed_items: HashMap<LineItemId, CompletedItem>,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl ProjectWorkflowTracker {
    /// Creates an unstarted tracker with no pointer and nothing completed.
    ///
    /// The progression engine positions it on its template's first item.
    pub fn new(
        project_id: ProjectId,
        workflow_type: WorkflowType,
        is_main_workflow: bool,
        total_line_items: u32,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: TrackerId::new(),
            project_id,
            workflow_type,
            trade_name: None,
            is_main_workflow,
            current: None,
            total_line_items,
            total_is_estimate: false,
            starting_phase: None,
            completed_items: HashMap::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitutes a tracker from persisted data.
    ///
    /// Used by repository implementations; performs no validation.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: TrackerId,
        project_id: ProjectId,
        workflow_type: WorkflowType,
        trade_name: Option<String>,
        is_main_workflow: bool,
        current: Option<WorkflowPosition>,
        total_line_items: u32,
        total_is_estimate: bool,
        starting_phase: Option<PhaseKey>,
        completed_items: Vec<CompletedItem>,
        version: u64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            project_id,
            workflow_type,
            trade_name,
            is_main_workflow,
            current,
            total_line_items,
            total_is_estimate,
            starting_phase,
            completed_items: completed_items
                .into_iter()
                .map(|c| (c.line_item_id, c))
                .collect(),
            version,
            created_at,
            updated_at,
        }
    }

    /// Sets the trade name shown for secondary workflows.
    pub fn with_trade_name(mut self, trade_name: impl Into<String>) -> Self {
        self.trade_name = Some(trade_name.into());
        self
    }

    /// Records the phase the workflow should start at.
    pub fn with_starting_phase(mut self, starting_phase: Option<PhaseKey>) -> Self {
        self.starting_phase = starting_phase;
        self
    }

    /// Marks the denominator as the default estimate, to be replaced once
    /// the template loads.
    pub fn with_estimated_total(mut self) -> Self {
        self.total_is_estimate = true;
        self
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> TrackerId {
        self.id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn workflow_type(&self) -> &WorkflowType {
        &self.workflow_type
    }

    pub fn trade_name(&self) -> Option<&str> {
        self.trade_name.as_deref()
    }

    pub fn is_main_workflow(&self) -> bool {
        self.is_main_workflow
    }

    /// Returns the pointer triple, or `None` once the workflow is exhausted.
    pub fn current(&self) -> Option<&WorkflowPosition> {
        self.current.as_ref()
    }

    /// Returns the currently actionable line item.
    pub fn current_line_item_id(&self) -> Option<LineItemId> {
        self.current.map(|p| p.line_item_id)
    }

    /// Returns the progress denominator captured at initialization.
    pub fn total_line_items(&self) -> u32 {
        self.total_line_items
    }

    /// Returns true while the denominator is the default estimate.
    pub fn is_total_estimated(&self) -> bool {
        self.total_is_estimate
    }

    pub fn starting_phase(&self) -> Option<PhaseKey> {
        self.starting_phase
    }

    /// Returns the optimistic-concurrency version of the stored row.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if the line item has been completed (or skipped).
    pub fn is_completed(&self, id: &LineItemId) -> bool {
        self.completed_items.contains_key(id)
    }

    /// Returns the completion record for a line item.
    pub fn completed_item(&self, id: &LineItemId) -> Option<&CompletedItem> {
        self.completed_items.get(id)
    }

    /// Returns the number of completed entries.
    pub fn completed_count(&self) -> usize {
        self.completed_items.len()
    }

    /// Returns the ids of every completed entry (unordered).
    pub fn completed_ids(&self) -> impl Iterator<Item = &LineItemId> {
        self.completed_items.keys()
    }

    /// Returns completion records ordered by completion time.
    pub fn completed_items(&self) -> Vec<&CompletedItem> {
        let mut items: Vec<_> = self.completed_items.values().collect();
        items.sort_by_key(|c| (c.completed_at, c.line_item_id));
        items
    }

    /// Returns true when setup never finished: no denominator, or no pointer
    /// with nothing ever completed.
    pub fn is_half_initialized(&self) -> bool {
        self.total_line_items == 0 || (self.current.is_none() && self.completed_items.is_empty())
    }

    /// Returns true when the tracker still has to be settled against its
    /// template: half-initialized, or counting against an estimate.
    pub fn awaits_template(&self) -> bool {
        self.total_is_estimate || self.is_half_initialized()
    }

    /// Returns true when every line item is done (pointer is all-null).
    pub fn is_exhausted(&self) -> bool {
        self.current.is_none() && !self.is_half_initialized()
    }

    // ───────────────────────────────────────────────────────────────
    // Mutations (driven by the progression engine)
    // ───────────────────────────────────────────────────────────────

    /// Inserts a completion record. Returns false if one already existed.
    pub(crate) fn record_completion(&mut self, item: CompletedItem) -> bool {
        if self.completed_items.contains_key(&item.line_item_id) {
            return false;
        }
        self.completed_items.insert(item.line_item_id, item);
        self.touch();
        true
    }

    /// Removes a completion record.
    pub(crate) fn remove_completion(&mut self, id: &LineItemId) -> Option<CompletedItem> {
        let removed = self.completed_items.remove(id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Points the tracker at the first incomplete entry of the sequence.
    ///
    /// Returns the new pointer (`None` when every entry is complete).
    pub(crate) fn realign_pointer(&mut self, sequence: &FlattenedSequence) -> Option<WorkflowPosition> {
        let next = sequence
            .first_incomplete(|id| self.completed_items.contains_key(id))
            .map(|e| e.position);
        if next != self.current {
            self.current = next;
            self.touch();
        }
        next
    }

    /// Replaces the progress denominator with the template's count.
    pub(crate) fn set_total_line_items(&mut self, total_line_items: u32) {
        if self.total_line_items != total_line_items || self.total_is_estimate {
            self.total_line_items = total_line_items;
            self.total_is_estimate = false;
            self.touch();
        }
    }

    /// Flags or unflags this tracker as the project's main workflow.
    pub(crate) fn set_main_workflow(&mut self, is_main: bool) {
        if self.is_main_workflow != is_main {
            self.is_main_workflow = is_main;
            self.touch();
        }
    }

    /// Picks the tracker that drives project-level phase and progress: the
    /// one flagged main, else the first listed.
    pub fn select_main(trackers: &[ProjectWorkflowTracker]) -> Option<&ProjectWorkflowTracker> {
        trackers
            .iter()
            .find(|t| t.is_main_workflow)
            .or_else(|| trackers.first())
    }

    /// Records that the stored row advanced to the next version.
    pub(crate) fn mark_persisted(&mut self) {
        self.version += 1;
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
