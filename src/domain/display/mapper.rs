//! Display Mapper - presentation-only labels for line items.
//!
//! Labels come from the template whenever a stable position is known. The
//! heuristic path is for legacy or freeform imported names only:
//! 1. Exact key in the phase's static table
//! 2. Substring match against the phase's known section names
//! 3. Substring match against the phase's known line-item labels
//! 4. A generic per-phase fallback
//!
//! `DisplayLabel` has no public constructor and no conversion into any id
//! type, so it cannot be handed back to the progression engine.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::domain::foundation::PhaseKey;
use crate::domain::template::{WorkflowPosition, WorkflowTemplate};

/// Minimum input length considered for substring matching.
const MIN_FUZZY_LEN: usize = 3;

struct KnownItem {
    key: &'static str,
    section: &'static str,
    label: &'static str,
}

const fn item(key: &'static str, section: &'static str, label: &'static str) -> KnownItem {
    KnownItem { key, section, label }
}

static PHASE_TABLES: Lazy<HashMap<PhaseKey, Vec<KnownItem>>> = Lazy::new(|| {
    HashMap::from([
        (
            PhaseKey::Lead,
            vec![
                item("input_customer_info", "Lead Intake", "Input Customer Information"),
                item("complete_questions", "Lead Intake", "Complete Questions Checklist"),
                item("schedule_inspection", "Appointment", "Schedule Initial Inspection"),
            ],
        ),
        (
            PhaseKey::Prospect,
            vec![
                item("site_photos", "Site Inspection", "Take Site Photos"),
                item("prepare_estimate", "Estimate", "Prepare Estimate"),
                item("insurance_claim", "Insurance", "Submit Insurance Claim"),
            ],
        ),
        (
            PhaseKey::Approved,
            vec![
                item("sign_contract", "Contract", "Sign Contract"),
                item("order_materials", "Material Order", "Order Materials"),
                item("pull_permit", "Permits", "Pull Permit"),
            ],
        ),
        (
            PhaseKey::Execution,
            vec![
                item("begin_installation", "Installation", "Begin Installation"),
                item("site_cleanup", "Installation", "Site Cleanup"),
                item("final_inspection", "Quality Check", "Final Inspection"),
            ],
        ),
        (
            PhaseKey::SecondSupplement,
            vec![
                item("create_supplement", "Supplement", "Create Supplement"),
                item("adjuster_follow_up", "Adjuster Review", "Follow Up With Adjuster"),
            ],
        ),
        (
            PhaseKey::Completion,
            vec![
                item("final_invoice", "Financial Closeout", "Send Final Invoice"),
                item("issue_warranty", "Project Closeout", "Issue Warranty"),
                item("request_review", "Project Closeout", "Request Customer Review"),
            ],
        ),
    ])
});

/// How a label was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    Template,
    ExactKey,
    SectionMatch,
    LineItemMatch,
    Fallback,
}

/// Human-readable section and line item names. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLabel {
    section: String,
    line_item: String,
    source: LabelSource,
}

impl DisplayLabel {
    fn new(section: impl Into<String>, line_item: impl Into<String>, source: LabelSource) -> Self {
        Self {
            section: section.into(),
            line_item: line_item.into(),
            source,
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn line_item(&self) -> &str {
        &self.line_item
    }

    pub fn source(&self) -> LabelSource {
        self.source
    }

    /// Returns true if the label was produced by guessing rather than by
    /// template lookup or exact key.
    pub fn is_heuristic(&self) -> bool {
        matches!(
            self.source,
            LabelSource::SectionMatch | LabelSource::LineItemMatch | LabelSource::Fallback
        )
    }
}

impl fmt::Display for DisplayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.section, self.line_item)
    }
}

/// Stateless label lookups.
pub struct DisplayMapper;

impl DisplayMapper {
    /// Labels a position using the template's own names.
    pub fn label_for_position(
        template: &WorkflowTemplate,
        position: &WorkflowPosition,
    ) -> Option<DisplayLabel> {
        template.locate(&position.line_item_id).map(|loc| {
            DisplayLabel::new(
                loc.section.name.clone(),
                format!("{}. {}", loc.line_item.letter, loc.line_item.description),
                LabelSource::Template,
            )
        })
    }

    /// Labels a freeform name or legacy key within a phase.
    pub fn map_line_item_to_display(name_or_id: &str, phase: PhaseKey) -> DisplayLabel {
        let raw = name_or_id.trim();
        let needle = normalize(raw);
        let known = PHASE_TABLES.get(&phase).map(Vec::as_slice).unwrap_or_default();

        if let Some(k) = known.iter().find(|k| k.key == needle) {
            return DisplayLabel::new(k.section, k.label, LabelSource::ExactKey);
        }

        if needle.len() >= MIN_FUZZY_LEN {
            if let Some(k) = known.iter().find(|k| fuzzy_contains(k.section, &needle)) {
                return DisplayLabel::new(k.section, raw, LabelSource::SectionMatch);
            }
            if let Some(k) = known.iter().find(|k| fuzzy_contains(k.label, &needle)) {
                return DisplayLabel::new(k.section, k.label, LabelSource::LineItemMatch);
            }
        }

        DisplayLabel::new(
            format!("{} Tasks", phase.display_name()),
            format!("Next {} step", phase.display_name()),
            LabelSource::Fallback,
        )
    }
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Either string contains the other, compared in normalized form.
fn fuzzy_contains(known: &str, needle: &str) -> bool {
    let known = normalize(known);
    known.contains(needle) || needle.contains(known.as_str())
}
