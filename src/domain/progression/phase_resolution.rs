//! Display-phase derivation.
//!
//! Resolution order:
//! 1. An explicit phase override for the project
//! 2. The phase type of the tracker's current phase in its template
//! 3. COMPLETION when the tracker's pointer is exhausted
//! 4. The project's status mapped through a static table, else LEAD
//!
//! A half-initialized tracker counts as "no tracker" and falls through to
//! step 4, as does a pointer whose phase is no longer in the template.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::domain::foundation::PhaseKey;
use crate::domain::template::WorkflowTemplate;
use crate::domain::tracker::ProjectWorkflowTracker;

/// Project status → phase, used when no usable tracker exists.
static STATUS_PHASES: Lazy<HashMap<&'static str, PhaseKey>> = Lazy::new(|| {
    HashMap::from([
        ("lead", PhaseKey::Lead),
        ("new", PhaseKey::Lead),
        ("pending", PhaseKey::Lead),
        ("prospect", PhaseKey::Prospect),
        ("estimate", PhaseKey::Prospect),
        ("estimating", PhaseKey::Prospect),
        ("approved", PhaseKey::Approved),
        ("signed", PhaseKey::Approved),
        ("in_progress", PhaseKey::Execution),
        ("active", PhaseKey::Execution),
        ("execution", PhaseKey::Execution),
        ("supplement", PhaseKey::SecondSupplement),
        ("second_supplement", PhaseKey::SecondSupplement),
        ("completed", PhaseKey::Completion),
        ("complete", PhaseKey::Completion),
        ("closed", PhaseKey::Completion),
    ])
});

/// Inputs to phase derivation. Every signal is optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseSignals<'a> {
    pub override_phase: Option<PhaseKey>,
    pub tracker: Option<&'a ProjectWorkflowTracker>,
    pub template: Option<&'a WorkflowTemplate>,
    pub project_status: Option<&'a str>,
}

/// Maps a free-form project status to a phase, if the status is known.
pub fn phase_for_status(status: &str) -> Option<PhaseKey> {
    let normalized = status.trim().to_lowercase().replace([' ', '-'], "_");
    STATUS_PHASES.get(normalized.as_str()).copied()
}

pub(super) fn derive_phase_key(signals: &PhaseSignals<'_>) -> PhaseKey {
    if let Some(phase) = signals.override_phase {
        return phase;
    }

    if let Some(tracker) = signals.tracker.filter(|t| !t.is_half_initialized()) {
        match tracker.current() {
            None => return PhaseKey::Completion,
            Some(position) => {
                let resolved = signals
                    .template
                    .and_then(|t| t.phase(&position.phase_id))
                    .map(|p| p.phase_type);
                if let Some(phase) = resolved {
                    return phase;
                }
                tracing::debug!(
                    tracker_id = %tracker.id(),
                    phase_id = %position.phase_id,
                    "Tracker phase not found in template; falling back to project status"
                );
            }
        }
    }

    signals
        .project_status
        .and_then(phase_for_status)
        .unwrap_or_default()
}
