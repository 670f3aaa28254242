//! FlattenedSequence - the canonical total order of a template's line items.
//!
//! Concatenating phases → sections → line items by display order yields the
//! sequence that defines "next item" and the progress denominator.
//!
//! # Usage
//!
//! ```ignore
//! let sequence = template.flatten();
//!
//! // First entry whose line item has not been completed yet
//! let next = sequence.first_incomplete(|id| completed.contains(id));
//!
//! // Where a line item sits in the order
//! let idx = sequence.index_of(&line_item_id);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{LineItemId, PhaseId, PhaseKey, SectionId, WorkflowType};

use super::WorkflowTemplate;

/// Coordinates of one line item: the tracker's pointer triple.
///
/// A tracker with no position (`None`) has exhausted its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowPosition {
    pub phase_id: PhaseId,
    pub section_id: SectionId,
    pub line_item_id: LineItemId,
}

/// One entry of the flattened sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceEntry {
    pub position: WorkflowPosition,
    pub phase_key: PhaseKey,
}

impl SequenceEntry {
    /// Returns the line item id of this entry.
    pub fn line_item_id(&self) -> LineItemId {
        self.position.line_item_id
    }
}

/// Ordered `(phase, section, line item)` entries for one workflow type.
#[derive(Debug, Clone)]
pub struct FlattenedSequence {
    workflow_type: WorkflowType,
    entries: Vec<SequenceEntry>,
    index: HashMap<LineItemId, usize>,
}

impl FlattenedSequence {
    pub(super) fn from_template(template: &WorkflowTemplate) -> Self {
        let entries: Vec<SequenceEntry> = template
            .phases()
            .iter()
            .flat_map(|phase| {
                phase.sections.iter().flat_map(move |section| {
                    section.line_items.iter().map(move |item| SequenceEntry {
                        position: WorkflowPosition {
                            phase_id: phase.id,
                            section_id: section.id,
                            line_item_id: item.id,
                        },
                        phase_key: phase.phase_type,
                    })
                })
            })
            .collect();

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.line_item_id(), i))
            .collect();

        Self {
            workflow_type: template.workflow_type().clone(),
            entries,
            index,
        }
    }

    /// Returns the workflow type the sequence was flattened from.
    pub fn workflow_type(&self) -> &WorkflowType {
        &self.workflow_type
    }

    /// Returns all entries in order.
    pub fn entries(&self) -> &[SequenceEntry] {
        &self.entries
    }

    /// Returns the number of line items in the sequence.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the sequence has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the first entry, if any.
    pub fn first(&self) -> Option<&SequenceEntry> {
        self.entries.first()
    }

    /// Returns true if the line item belongs to this sequence.
    pub fn contains(&self, id: &LineItemId) -> bool {
        self.index.contains_key(id)
    }

    /// Returns the 0-based position of a line item in the sequence.
    pub fn index_of(&self, id: &LineItemId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Returns the entry for a line item.
    pub fn entry(&self, id: &LineItemId) -> Option<&SequenceEntry> {
        self.index_of(id).map(|i| &self.entries[i])
    }

    /// Returns the entry at a 0-based index.
    pub fn get(&self, idx: usize) -> Option<&SequenceEntry> {
        self.entries.get(idx)
    }

    /// Returns the first entry, in sequence order, that is not complete.
    ///
    /// Entries may be completed out of order, so this scans from the start
    /// rather than stepping from the previous pointer.
    pub fn first_incomplete(
        &self,
        is_complete: impl Fn(&LineItemId) -> bool,
    ) -> Option<&SequenceEntry> {
        self.entries
            .iter()
            .find(|e| !is_complete(&e.position.line_item_id))
    }

    /// Returns the index of the first entry belonging to a phase of the given type.
    pub fn first_index_of_phase(&self, key: PhaseKey) -> Option<usize> {
        self.entries.iter().position(|e| e.phase_key == key)
    }

    /// Counts how many of the given line items are part of this sequence.
    pub fn count_members<'a>(&self, ids: impl IntoIterator<Item = &'a LineItemId>) -> usize {
        ids.into_iter().filter(|id| self.contains(id)).count()
    }
}
