//! PhaseKey enum - the canonical top-level stages of a project.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Canonical phase of the business workflow.
///
/// Templates arrive from the import pipeline already resolved to one of these
/// keys; the engine never sees free-form phase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseKey {
    #[default]
    Lead,
    Prospect,
    Approved,
    Execution,
    SecondSupplement,
    Completion,
}

impl PhaseKey {
    /// Returns all phase keys in business order.
    pub fn all() -> &'static [PhaseKey] {
        &[
            PhaseKey::Lead,
            PhaseKey::Prospect,
            PhaseKey::Approved,
            PhaseKey::Execution,
            PhaseKey::SecondSupplement,
            PhaseKey::Completion,
        ]
    }

    /// Returns the storage/wire key (e.g. `SECOND_SUPPLEMENT`).
    pub fn as_key(&self) -> &'static str {
        match self {
            PhaseKey::Lead => "LEAD",
            PhaseKey::Prospect => "PROSPECT",
            PhaseKey::Approved => "APPROVED",
            PhaseKey::Execution => "EXECUTION",
            PhaseKey::SecondSupplement => "SECOND_SUPPLEMENT",
            PhaseKey::Completion => "COMPLETION",
        }
    }

    /// Returns the human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PhaseKey::Lead => "Lead",
            PhaseKey::Prospect => "Prospect",
            PhaseKey::Approved => "Approved",
            PhaseKey::Execution => "Execution",
            PhaseKey::SecondSupplement => "2nd Supplement",
            PhaseKey::Completion => "Completion",
        }
    }
}

impl fmt::Display for PhaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for PhaseKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        PhaseKey::all()
            .iter()
            .copied()
            .find(|p| p.as_key() == normalized)
            .ok_or_else(|| ValidationError::invalid_format("phase", format!("unknown phase '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lead() {
        assert_eq!(PhaseKey::default(), PhaseKey::Lead);
    }

    #[test]
    fn parses_keys_case_insensitively() {
        assert_eq!("execution".parse::<PhaseKey>().unwrap(), PhaseKey::Execution);
        assert_eq!(
            "second-supplement".parse::<PhaseKey>().unwrap(),
            PhaseKey::SecondSupplement
        );
        assert!("closing".parse::<PhaseKey>().is_err());
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&PhaseKey::SecondSupplement).unwrap(),
            "\"SECOND_SUPPLEMENT\""
        );
    }

    #[test]
    fn as_key_round_trips_through_from_str() {
        for phase in PhaseKey::all() {
            assert_eq!(phase.as_key().parse::<PhaseKey>().unwrap(), *phase);
        }
    }
}
