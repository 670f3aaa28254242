//! ProgressionEngine - pure state transitions over a tracker and its template.
//!
//! Every operation works on already-loaded data and never performs I/O.
//! Callers are responsible for loading the tracker, holding the per-tracker
//! lock, and persisting the result.

use crate::domain::foundation::{DomainError, ErrorCode, LineItemId, Percentage, PhaseKey, Timestamp};
use crate::domain::template::{FlattenedSequence, WorkflowPosition};
use crate::domain::tracker::{CompletedItem, ProjectWorkflowTracker};

use super::phase_resolution::{self, PhaseSignals};

/// Movement of a tracker's pointer caused by one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerShift {
    pub previous: Option<WorkflowPosition>,
    pub current: Option<WorkflowPosition>,
}

impl PointerShift {
    /// Returns true if the pointer changed.
    pub fn moved(&self) -> bool {
        self.previous != self.current
    }

    /// Returns the line item that became actionable, if the pointer moved onto one.
    pub fn newly_active(&self) -> Option<&WorkflowPosition> {
        if self.moved() {
            self.current.as_ref()
        } else {
            None
        }
    }

    /// Returns the line item that stopped being actionable, if the pointer left one.
    pub fn superseded(&self) -> Option<&WorkflowPosition> {
        if self.moved() {
            self.previous.as_ref()
        } else {
            None
        }
    }

    /// Returns true if the workflow is exhausted after the shift.
    pub fn is_complete(&self) -> bool {
        self.current.is_none()
    }
}

/// Result of completing a line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The item was already complete; the tracker is unchanged.
    AlreadyCompleted,
    /// The item was recorded and the pointer recomputed.
    Completed {
        completed: WorkflowPosition,
        shift: PointerShift,
    },
}

impl CompletionOutcome {
    /// Returns the newly active line item, if any.
    pub fn newly_active(&self) -> Option<&WorkflowPosition> {
        match self {
            CompletionOutcome::AlreadyCompleted => None,
            CompletionOutcome::Completed { shift, .. } => shift.newly_active(),
        }
    }

    /// Returns true if this call changed nothing.
    pub fn is_already_completed(&self) -> bool {
        matches!(self, CompletionOutcome::AlreadyCompleted)
    }
}

/// Result of reversing a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UncompletionOutcome {
    /// The item was not complete; the tracker is unchanged.
    NotCompleted,
    /// The record was removed and the pointer recomputed (possibly earlier).
    Uncompleted {
        removed: CompletedItem,
        shift: PointerShift,
    },
}

/// Namespace for the progression operations.
pub struct ProgressionEngine;

impl ProgressionEngine {
    /// Computes `round(100 * |completed ∩ sequence| / total_line_items)`, clamped to 0..=100.
    ///
    /// The denominator is the count captured from the template at
    /// initialization, so progress stays stable as templates evolve. A
    /// tracker that never captured one, or only holds the default estimate,
    /// falls back to the sequence length.
    pub fn compute_progress(
        tracker: &ProjectWorkflowTracker,
        sequence: &FlattenedSequence,
    ) -> Percentage {
        let done = sequence.count_members(tracker.completed_ids()) as u64;
        let denominator = match tracker.total_line_items() {
            total if total > 0 && !tracker.is_total_estimated() => u64::from(total),
            _ => sequence.len() as u64,
        };
        Percentage::from_ratio(done, denominator)
    }

    /// Derives the display phase using the four-tier fallback.
    pub fn derive_phase_key(signals: &PhaseSignals<'_>) -> PhaseKey {
        phase_resolution::derive_phase_key(signals)
    }

    /// Completes a line item and advances the pointer.
    ///
    /// 1. Already complete → `AlreadyCompleted`, tracker untouched.
    /// 2. Not part of the tracker's sequence → `LineItemNotFound`.
    /// 3. Records the completion.
    /// 4. Points at the first incomplete entry in sequence order (entries can
    ///    be completed out of order), or exhausts the workflow.
    ///
    /// # Errors
    ///
    /// - `InvalidTemplate` if the sequence belongs to another workflow type
    /// - `LineItemNotFound` if the line item is not in the sequence
    pub fn complete_line_item(
        tracker: &mut ProjectWorkflowTracker,
        sequence: &FlattenedSequence,
        line_item_id: LineItemId,
        notes: Option<String>,
    ) -> Result<CompletionOutcome, DomainError> {
        ensure_same_workflow(tracker, sequence)?;

        if tracker.is_completed(&line_item_id) {
            return Ok(CompletionOutcome::AlreadyCompleted);
        }

        let entry = sequence
            .entry(&line_item_id)
            .ok_or_else(|| unknown_line_item(tracker, line_item_id))?;
        let completed = entry.position;

        let previous = tracker.current().copied();
        tracker.record_completion(CompletedItem::completed(&completed, Timestamp::now(), notes));
        let current = tracker.realign_pointer(sequence);

        Ok(CompletionOutcome::Completed {
            completed,
            shift: PointerShift { previous, current },
        })
    }

    /// Removes a completion and recomputes the pointer, which may move earlier.
    ///
    /// Records whose line item has since left the template are still removed.
    ///
    /// # Errors
    ///
    /// - `InvalidTemplate` if the sequence belongs to another workflow type
    /// - `LineItemNotFound` if the item is neither completed nor in the sequence
    pub fn uncomplete_line_item(
        tracker: &mut ProjectWorkflowTracker,
        sequence: &FlattenedSequence,
        line_item_id: LineItemId,
    ) -> Result<UncompletionOutcome, DomainError> {
        ensure_same_workflow(tracker, sequence)?;

        let previous = tracker.current().copied();
        match tracker.remove_completion(&line_item_id) {
            Some(removed) => {
                let current = tracker.realign_pointer(sequence);
                Ok(UncompletionOutcome::Uncompleted {
                    removed,
                    shift: PointerShift { previous, current },
                })
            }
            None if sequence.contains(&line_item_id) => Ok(UncompletionOutcome::NotCompleted),
            None => Err(unknown_line_item(tracker, line_item_id)),
        }
    }

    /// Positions a fresh tracker on its first actionable item.
    ///
    /// With a starting phase, every entry strictly before that phase's first
    /// item is recorded as skipped so later pointer recomputation never
    /// regresses onto it. Returns the number of skipped entries.
    pub fn start(
        tracker: &mut ProjectWorkflowTracker,
        sequence: &FlattenedSequence,
        starting_phase: Option<PhaseKey>,
    ) -> usize {
        let skip_until = match starting_phase {
            Some(phase) => match sequence.first_index_of_phase(phase) {
                Some(idx) => idx,
                None => {
                    tracing::warn!(
                        tracker_id = %tracker.id(),
                        workflow_type = %tracker.workflow_type(),
                        starting_phase = %phase,
                        "Starting phase not in template; starting at first item"
                    );
                    0
                }
            },
            None => 0,
        };

        let now = Timestamp::now();
        for entry in &sequence.entries()[..skip_until] {
            tracker.record_completion(CompletedItem::skipped(&entry.position, now));
        }
        tracker.realign_pointer(sequence);
        skip_until
    }

    /// Settles a tracker created without its template.
    ///
    /// Replaces the estimated denominator with the sequence length and runs
    /// the deferred start, honoring the recorded starting phase. Completions
    /// made in the meantime are kept. Returns false if the tracker was
    /// already settled.
    pub fn adopt_template(tracker: &mut ProjectWorkflowTracker, sequence: &FlattenedSequence) -> bool {
        if !tracker.awaits_template() {
            return false;
        }
        tracker.set_total_line_items(sequence.len() as u32);
        let starting_phase = tracker.starting_phase();
        Self::start(tracker, sequence, starting_phase);
        true
    }
}

fn ensure_same_workflow(
    tracker: &ProjectWorkflowTracker,
    sequence: &FlattenedSequence,
) -> Result<(), DomainError> {
    if tracker.workflow_type() != sequence.workflow_type() {
        return Err(DomainError::new(
            ErrorCode::InvalidTemplate,
            format!(
                "Tracker {} is {} but sequence is {}",
                tracker.id(),
                tracker.workflow_type(),
                sequence.workflow_type()
            ),
        ));
    }
    Ok(())
}

fn unknown_line_item(tracker: &ProjectWorkflowTracker, line_item_id: LineItemId) -> DomainError {
    DomainError::new(
        ErrorCode::LineItemNotFound,
        format!(
            "Line item {} is not part of the {} workflow",
            line_item_id,
            tracker.workflow_type()
        ),
    )
    .with_detail("line_item_id", line_item_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ProjectId, WorkflowType};
    use crate::domain::template::{LineItem, Phase, Section, WorkflowTemplate};
    use proptest::prelude::*;

    /// ROOFING: LEAD (2 items), EXECUTION (1 item).
    fn roofing_template() -> WorkflowTemplate {
        WorkflowTemplate::new(
            WorkflowType::new("ROOFING").unwrap(),
            vec![
                Phase::new(
                    PhaseKey::Lead,
                    1,
                    vec![Section::new(
                        "Intake",
                        1,
                        vec![LineItem::new("A", 1, "Input customer info"), LineItem::new("B", 2, "Schedule inspection")],
                    )],
                ),
                Phase::new(
                    PhaseKey::Execution,
                    2,
                    vec![Section::new("Install", 1, vec![LineItem::new("A", 1, "Install roof")])],
                ),
            ],
        )
        .unwrap()
    }

    fn started_tracker(seq: &FlattenedSequence) -> ProjectWorkflowTracker {
        let mut tracker = ProjectWorkflowTracker::new(
            ProjectId::new(),
            seq.workflow_type().clone(),
            true,
            seq.len() as u32,
        );
        ProgressionEngine::start(&mut tracker, seq, None);
        tracker
    }

    fn item(seq: &FlattenedSequence, idx: usize) -> LineItemId {
        seq.entries()[idx].line_item_id()
    }

    fn phase_of(tracker: &ProjectWorkflowTracker, template: &WorkflowTemplate) -> PhaseKey {
        ProgressionEngine::derive_phase_key(&PhaseSignals {
            tracker: Some(tracker),
            template: Some(template),
            ..PhaseSignals::default()
        })
    }

    #[test]
    fn roofing_scenario_walks_through_every_phase() {
        let template = roofing_template();
        let seq = template.flatten();
        let mut tracker = started_tracker(&seq);

        assert_eq!(tracker.current_line_item_id(), Some(item(&seq, 0)));
        assert_eq!(ProgressionEngine::compute_progress(&tracker, &seq).value(), 0);
        assert_eq!(phase_of(&tracker, &template), PhaseKey::Lead);

        ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 0), None).unwrap();
        assert_eq!(tracker.current_line_item_id(), Some(item(&seq, 1)));
        assert_eq!(ProgressionEngine::compute_progress(&tracker, &seq).value(), 33);

        ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 1), None).unwrap();
        assert_eq!(tracker.current_line_item_id(), Some(item(&seq, 2)));
        assert_eq!(phase_of(&tracker, &template), PhaseKey::Execution);
        assert_eq!(ProgressionEngine::compute_progress(&tracker, &seq).value(), 67);

        let outcome =
            ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 2), None).unwrap();
        assert!(tracker.current().is_none());
        assert!(matches!(outcome, CompletionOutcome::Completed { shift, .. } if shift.is_complete()));
        assert_eq!(phase_of(&tracker, &template), PhaseKey::Completion);
        assert_eq!(ProgressionEngine::compute_progress(&tracker, &seq), Percentage::HUNDRED);
    }

    #[test]
    fn completing_twice_is_idempotent() {
        let seq = roofing_template().flatten();
        let mut tracker = started_tracker(&seq);

        ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 0), Some("done".into())).unwrap();
        let snapshot = tracker.clone();

        let outcome =
            ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 0), None).unwrap();
        assert_eq!(outcome, CompletionOutcome::AlreadyCompleted);
        assert_eq!(tracker, snapshot);
    }

    #[test]
    fn unknown_line_item_is_rejected() {
        let seq = roofing_template().flatten();
        let mut tracker = started_tracker(&seq);
        let snapshot = tracker.clone();

        let err = ProgressionEngine::complete_line_item(&mut tracker, &seq, LineItemId::new(), None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::LineItemNotFound);
        assert_eq!(tracker, snapshot);
    }

    #[test]
    fn out_of_order_completion_leaves_pointer_on_earlier_item() {
        let seq = roofing_template().flatten();
        let mut tracker = started_tracker(&seq);

        let outcome =
            ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 1), None).unwrap();

        assert_eq!(tracker.current_line_item_id(), Some(item(&seq, 0)));
        assert_eq!(outcome.newly_active(), None);

        // Finishing the gap jumps past the already-completed item.
        let outcome =
            ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 0), None).unwrap();
        assert_eq!(tracker.current_line_item_id(), Some(item(&seq, 2)));
        assert_eq!(outcome.newly_active().map(|p| p.line_item_id), Some(item(&seq, 2)));
    }

    #[test]
    fn uncomplete_moves_pointer_back() {
        let seq = roofing_template().flatten();
        let mut tracker = started_tracker(&seq);
        ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 0), None).unwrap();
        ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 1), None).unwrap();

        let outcome = ProgressionEngine::uncomplete_line_item(&mut tracker, &seq, item(&seq, 0)).unwrap();

        assert_eq!(tracker.current_line_item_id(), Some(item(&seq, 0)));
        match outcome {
            UncompletionOutcome::Uncompleted { removed, shift } => {
                assert_eq!(removed.line_item_id, item(&seq, 0));
                assert_eq!(shift.superseded().map(|p| p.line_item_id), Some(item(&seq, 2)));
                assert_eq!(shift.newly_active().map(|p| p.line_item_id), Some(item(&seq, 0)));
            }
            other => panic!("expected Uncompleted, got {:?}", other),
        }
    }

    #[test]
    fn uncomplete_of_open_item_is_noop() {
        let seq = roofing_template().flatten();
        let mut tracker = started_tracker(&seq);
        let outcome = ProgressionEngine::uncomplete_line_item(&mut tracker, &seq, item(&seq, 2)).unwrap();
        assert_eq!(outcome, UncompletionOutcome::NotCompleted);

        let err = ProgressionEngine::uncomplete_line_item(&mut tracker, &seq, LineItemId::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::LineItemNotFound);
    }

    #[test]
    fn mismatched_sequence_is_rejected() {
        let seq = roofing_template().flatten();
        let mut tracker = ProjectWorkflowTracker::new(
            ProjectId::new(),
            WorkflowType::new("GUTTERS").unwrap(),
            true,
            3,
        );
        let err = ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 0), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTemplate);
    }

    #[test]
    fn start_with_phase_skips_earlier_entries() {
        let template = roofing_template();
        let seq = template.flatten();
        let mut tracker = ProjectWorkflowTracker::new(ProjectId::new(), seq.workflow_type().clone(), true, 3);

        let skipped = ProgressionEngine::start(&mut tracker, &seq, Some(PhaseKey::Execution));

        assert_eq!(skipped, 2);
        assert_eq!(tracker.current_line_item_id(), Some(item(&seq, 2)));
        assert!(tracker.completed_item(&item(&seq, 0)).unwrap().skipped);
        assert_eq!(phase_of(&tracker, &template), PhaseKey::Execution);
    }

    #[test]
    fn start_with_missing_phase_starts_at_first_item() {
        let seq = roofing_template().flatten();
        let mut tracker = ProjectWorkflowTracker::new(ProjectId::new(), seq.workflow_type().clone(), true, 3);

        let skipped = ProgressionEngine::start(&mut tracker, &seq, Some(PhaseKey::SecondSupplement));
        assert_eq!(skipped, 0);
        assert_eq!(tracker.current_line_item_id(), Some(item(&seq, 0)));
    }

    #[test]
    fn progress_uses_captured_denominator() {
        let seq = roofing_template().flatten();
        let mut tracker = ProjectWorkflowTracker::new(ProjectId::new(), seq.workflow_type().clone(), true, 4);
        ProgressionEngine::start(&mut tracker, &seq, None);
        ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 0), None).unwrap();

        assert_eq!(ProgressionEngine::compute_progress(&tracker, &seq).value(), 25);
    }

    #[test]
    fn estimated_denominator_is_ignored_once_template_is_known() {
        let seq = roofing_template().flatten();
        let mut tracker =
            ProjectWorkflowTracker::new(ProjectId::new(), seq.workflow_type().clone(), true, 25).with_estimated_total();
        for idx in 0..seq.len() {
            ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, idx), None).unwrap();
        }

        assert_eq!(ProgressionEngine::compute_progress(&tracker, &seq), Percentage::HUNDRED);
    }

    #[test]
    fn adopt_template_replaces_estimate_and_keeps_completions() {
        let seq = roofing_template().flatten();
        let mut tracker =
            ProjectWorkflowTracker::new(ProjectId::new(), seq.workflow_type().clone(), true, 25).with_estimated_total();
        ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, 1), None).unwrap();

        assert!(ProgressionEngine::adopt_template(&mut tracker, &seq));

        assert_eq!(tracker.total_line_items(), 3);
        assert!(!tracker.awaits_template());
        assert!(tracker.is_completed(&item(&seq, 1)));
        assert_eq!(tracker.current_line_item_id(), Some(item(&seq, 0)));
        assert!(!ProgressionEngine::adopt_template(&mut tracker, &seq));
    }

    #[test]
    fn adopt_template_honors_recorded_starting_phase() {
        let template = roofing_template();
        let seq = template.flatten();
        let mut tracker = ProjectWorkflowTracker::new(ProjectId::new(), seq.workflow_type().clone(), true, 25)
            .with_estimated_total()
            .with_starting_phase(Some(PhaseKey::Execution));

        assert!(ProgressionEngine::adopt_template(&mut tracker, &seq));

        assert_eq!(tracker.current_line_item_id(), Some(item(&seq, 2)));
        assert!(tracker.completed_item(&item(&seq, 0)).unwrap().skipped);
        assert_eq!(phase_of(&tracker, &template), PhaseKey::Execution);
    }

    fn arbitrary_template() -> impl Strategy<Value = WorkflowTemplate> {
        // phases -> sections -> item counts
        proptest::collection::vec(proptest::collection::vec(1usize..4, 1..3), 1..4).prop_map(|shape| {
            let phases = shape
                .into_iter()
                .enumerate()
                .map(|(p, sections)| {
                    let sections = sections
                        .into_iter()
                        .enumerate()
                        .map(|(s, count)| {
                            let items = (0..count)
                                .map(|i| LineItem::new(format!("{}", i), i as u32, format!("item {}", i)))
                                .collect();
                            Section::new(format!("section {}", s), s as u32, items)
                        })
                        .collect();
                    Phase::new(PhaseKey::all()[p], p as u32, sections)
                })
                .collect();
            WorkflowTemplate::new(WorkflowType::new("PROP").unwrap(), phases).unwrap()
        })
    }

    proptest! {
        #[test]
        fn full_completion_reaches_hundred_and_completion_phase(
            template in arbitrary_template(),
            seed in any::<u64>(),
        ) {
            let seq = template.flatten();
            let mut tracker = started_tracker(&seq);

            // Complete in a seed-rotated order to exercise out-of-order paths.
            let n = seq.len();
            let offset = (seed as usize) % n;
            for k in 0..n {
                let id = item(&seq, (k + offset) % n);
                ProgressionEngine::complete_line_item(&mut tracker, &seq, id, None).unwrap();
            }

            prop_assert_eq!(ProgressionEngine::compute_progress(&tracker, &seq), Percentage::HUNDRED);
            prop_assert_eq!(phase_of(&tracker, &template), PhaseKey::Completion);
        }

        #[test]
        fn completing_prefix_item_advances_to_next_index(
            template in arbitrary_template(),
            pick in any::<prop::sample::Index>(),
        ) {
            let seq = template.flatten();
            let mut tracker = started_tracker(&seq);
            let i = pick.index(seq.len());

            for k in 0..i {
                ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, k), None).unwrap();
            }
            ProgressionEngine::complete_line_item(&mut tracker, &seq, item(&seq, i), None).unwrap();

            let expected = seq.get(i + 1).map(|e| e.line_item_id());
            prop_assert_eq!(tracker.current_line_item_id(), expected);
        }

        #[test]
        fn repeated_completion_never_changes_state(
            template in arbitrary_template(),
            pick in any::<prop::sample::Index>(),
        ) {
            let seq = template.flatten();
            let mut tracker = started_tracker(&seq);
            let id = item(&seq, pick.index(seq.len()));

            ProgressionEngine::complete_line_item(&mut tracker, &seq, id, None).unwrap();
            let snapshot = tracker.clone();
            let outcome = ProgressionEngine::complete_line_item(&mut tracker, &seq, id, None).unwrap();

            prop_assert!(outcome.is_already_completed());
            prop_assert_eq!(tracker, snapshot);
        }
    }
}
