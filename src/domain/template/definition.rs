//! WorkflowTemplate - the Phase → Section → Line Item hierarchy for one workflow type.
//!
//! Templates are produced by the import pipeline and are read-only to the
//! engine. Construction normalizes every level into display order and rejects
//! hierarchies that cannot yield one strict total order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AlertPriority, DomainError, ErrorCode, LineItemId, PhaseId, PhaseKey, ResponsibleRole,
    SectionId, WorkflowType,
};

use super::FlattenedSequence;

/// Atomic unit of work inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    /// Short ordinal label shown next to the item (e.g. "A", "B").
    pub letter: String,
    pub display_order: u32,
    pub description: String,
    #[serde(default)]
    pub responsible_role: Option<ResponsibleRole>,
    #[serde(default)]
    pub priority: Option<AlertPriority>,
    /// Days after activation the alert for this item falls due.
    #[serde(default)]
    pub alert_days: Option<u32>,
}

impl LineItem {
    /// Creates a line item with no alert metadata.
    pub fn new(letter: impl Into<String>, display_order: u32, description: impl Into<String>) -> Self {
        Self {
            id: LineItemId::new(),
            letter: letter.into(),
            display_order,
            description: description.into(),
            responsible_role: None,
            priority: None,
            alert_days: None,
        }
    }

    /// Sets the responsible role.
    pub fn with_role(mut self, role: ResponsibleRole) -> Self {
        self.responsible_role = Some(role);
        self
    }

    /// Sets the alert priority.
    pub fn with_priority(mut self, priority: AlertPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the alert due offset in days.
    pub fn with_alert_days(mut self, days: u32) -> Self {
        self.alert_days = Some(days);
        self
    }
}

/// Named grouping of line items within a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub display_order: u32,
    pub line_items: Vec<LineItem>,
}

impl Section {
    /// Creates a section.
    pub fn new(name: impl Into<String>, display_order: u32, line_items: Vec<LineItem>) -> Self {
        Self {
            id: SectionId::new(),
            name: name.into(),
            display_order,
            line_items,
        }
    }
}

/// Top-level stage of a workflow template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub phase_type: PhaseKey,
    pub display_order: u32,
    pub sections: Vec<Section>,
}

impl Phase {
    /// Creates a phase.
    pub fn new(phase_type: PhaseKey, display_order: u32, sections: Vec<Section>) -> Self {
        Self {
            id: PhaseId::new(),
            phase_type,
            display_order,
            sections,
        }
    }
}

/// Borrowed view of a line item together with its parents.
#[derive(Debug, Clone, Copy)]
pub struct LineItemLocation<'a> {
    pub phase: &'a Phase,
    pub section: &'a Section,
    pub line_item: &'a LineItem,
}

/// Hierarchy definition for one workflow type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    workflow_type: WorkflowType,
    phases: Vec<Phase>,
}

impl WorkflowTemplate {
    /// Builds a template, sorting every level by display order.
    ///
    /// # Errors
    ///
    /// - `InvalidTemplate` if a display order repeats within a parent, a line
    ///   item id repeats anywhere, or the template holds no line items.
    pub fn new(workflow_type: WorkflowType, mut phases: Vec<Phase>) -> Result<Self, DomainError> {
        phases.sort_by_key(|p| p.display_order);
        ensure_unique_orders(
            phases.iter().map(|p| p.display_order),
            || format!("phases of {}", workflow_type),
        )?;

        let mut seen_items = HashSet::new();
        for phase in &mut phases {
            phase.sections.sort_by_key(|s| s.display_order);
            ensure_unique_orders(
                phase.sections.iter().map(|s| s.display_order),
                || format!("sections of phase {}", phase.phase_type),
            )?;

            for section in &mut phase.sections {
                section.line_items.sort_by_key(|i| i.display_order);
                ensure_unique_orders(
                    section.line_items.iter().map(|i| i.display_order),
                    || format!("line items of section '{}'", section.name),
                )?;

                for item in &section.line_items {
                    if !seen_items.insert(item.id) {
                        return Err(DomainError::new(
                            ErrorCode::InvalidTemplate,
                            format!("Line item {} appears more than once", item.id),
                        )
                        .with_detail("workflow_type", workflow_type.as_str()));
                    }
                }
            }
        }

        if seen_items.is_empty() {
            return Err(DomainError::new(
                ErrorCode::InvalidTemplate,
                format!("Template {} has no line items", workflow_type),
            ));
        }

        Ok(Self {
            workflow_type,
            phases,
        })
    }

    /// Returns the workflow type this template defines.
    pub fn workflow_type(&self) -> &WorkflowType {
        &self.workflow_type
    }

    /// Returns phases in display order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Looks up a phase by id.
    pub fn phase(&self, id: &PhaseId) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == *id)
    }

    /// Returns the first phase of the given type, if the template has one.
    pub fn phase_of_type(&self, key: PhaseKey) -> Option<&Phase> {
        self.phases.iter().find(|p| p.phase_type == key)
    }

    /// Finds a line item and its parents.
    pub fn locate(&self, id: &LineItemId) -> Option<LineItemLocation<'_>> {
        self.phases.iter().find_map(|phase| {
            phase.sections.iter().find_map(|section| {
                section
                    .line_items
                    .iter()
                    .find(|item| item.id == *id)
                    .map(|line_item| LineItemLocation {
                        phase,
                        section,
                        line_item,
                    })
            })
        })
    }

    /// Returns the total number of line items across all phases.
    pub fn line_item_count(&self) -> usize {
        self.phases
            .iter()
            .flat_map(|p| &p.sections)
            .map(|s| s.line_items.len())
            .sum()
    }

    /// Flattens phases → sections → line items into the canonical order.
    pub fn flatten(&self) -> FlattenedSequence {
        FlattenedSequence::from_template(self)
    }
}

fn ensure_unique_orders(
    orders: impl Iterator<Item = u32>,
    scope: impl FnOnce() -> String,
) -> Result<(), DomainError> {
    let mut seen = HashSet::new();
    for order in orders {
        if !seen.insert(order) {
            return Err(DomainError::new(
                ErrorCode::InvalidTemplate,
                format!("Duplicate display order {} among {}", order, scope()),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roofing() -> WorkflowType {
        WorkflowType::new("ROOFING").unwrap()
    }

    #[test]
    fn new_sorts_every_level_by_display_order() {
        let late = LineItem::new("B", 2, "Second");
        let early = LineItem::new("A", 1, "First");
        let early_id = early.id;
        let template = WorkflowTemplate::new(
            roofing(),
            vec![
                Phase::new(PhaseKey::Execution, 2, vec![Section::new("Build", 1, vec![LineItem::new("A", 1, "Tear off")])]),
                Phase::new(PhaseKey::Lead, 1, vec![Section::new("Intake", 1, vec![late, early])]),
            ],
        )
        .unwrap();

        assert_eq!(template.phases()[0].phase_type, PhaseKey::Lead);
        assert_eq!(template.phases()[0].sections[0].line_items[0].id, early_id);
        assert_eq!(template.line_item_count(), 3);
    }

    #[test]
    fn rejects_duplicate_display_order_within_parent() {
        let result = WorkflowTemplate::new(
            roofing(),
            vec![Phase::new(
                PhaseKey::Lead,
                1,
                vec![Section::new(
                    "Intake",
                    1,
                    vec![LineItem::new("A", 1, "One"), LineItem::new("B", 1, "Two")],
                )],
            )],
        );

        let err = result.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTemplate);
        assert!(err.message.contains("Intake"));
    }

    #[test]
    fn allows_same_display_order_in_different_parents() {
        let result = WorkflowTemplate::new(
            roofing(),
            vec![Phase::new(
                PhaseKey::Lead,
                1,
                vec![
                    Section::new("Intake", 1, vec![LineItem::new("A", 1, "One")]),
                    Section::new("Inspection", 2, vec![LineItem::new("A", 1, "Two")]),
                ],
            )],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_repeated_line_item_id() {
        let item = LineItem::new("A", 1, "One");
        let mut copy = item.clone();
        copy.display_order = 2;
        let result = WorkflowTemplate::new(
            roofing(),
            vec![Phase::new(PhaseKey::Lead, 1, vec![Section::new("Intake", 1, vec![item, copy])])],
        );
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidTemplate);
    }

    #[test]
    fn rejects_empty_template() {
        let result = WorkflowTemplate::new(
            roofing(),
            vec![Phase::new(PhaseKey::Lead, 1, vec![Section::new("Intake", 1, vec![])])],
        );
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidTemplate);
    }

    #[test]
    fn locate_returns_parents() {
        let item = LineItem::new("A", 1, "Inspect roof").with_role(ResponsibleRole::FieldDirector);
        let id = item.id;
        let template = WorkflowTemplate::new(
            roofing(),
            vec![Phase::new(PhaseKey::Prospect, 1, vec![Section::new("Site Inspection", 1, vec![item])])],
        )
        .unwrap();

        let location = template.locate(&id).unwrap();
        assert_eq!(location.phase.phase_type, PhaseKey::Prospect);
        assert_eq!(location.section.name, "Site Inspection");
        assert_eq!(location.line_item.responsible_role, Some(ResponsibleRole::FieldDirector));
        assert!(template.locate(&LineItemId::new()).is_none());
    }
}
