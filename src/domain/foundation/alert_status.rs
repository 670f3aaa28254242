//! Alert enums: lifecycle status, priority and responsible role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Lifecycle status of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    #[default]
    Active,
    Completed,
    Dismissed,
}

impl AlertStatus {
    /// Returns true if the alert still demands attention.
    pub fn is_active(&self) -> bool {
        matches!(self, AlertStatus::Active)
    }

    /// Validates a transition from this status to another.
    ///
    /// Valid transitions:
    /// - Active -> Completed
    /// - Active -> Dismissed
    pub fn can_transition_to(&self, target: &AlertStatus) -> bool {
        use AlertStatus::*;
        matches!((self, target), (Active, Completed) | (Active, Dismissed))
    }

    /// Returns the storage key.
    pub fn as_key(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Completed => "completed",
            AlertStatus::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertStatus::Active => "Active",
            AlertStatus::Completed => "Completed",
            AlertStatus::Dismissed => "Dismissed",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AlertStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(AlertStatus::Active),
            "completed" => Ok(AlertStatus::Completed),
            "dismissed" => Ok(AlertStatus::Dismissed),
            other => Err(ValidationError::invalid_format(
                "alert_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Urgency attached to an alert, taken from line item metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl AlertPriority {
    /// Returns the storage key.
    pub fn as_key(&self) -> &'static str {
        match self {
            AlertPriority::Low => "LOW",
            AlertPriority::Medium => "MEDIUM",
            AlertPriority::High => "HIGH",
            AlertPriority::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for AlertPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(AlertPriority::Low),
            "MEDIUM" => Ok(AlertPriority::Medium),
            "HIGH" => Ok(AlertPriority::High),
            "URGENT" => Ok(AlertPriority::Urgent),
            other => Err(ValidationError::invalid_format(
                "priority",
                format!("unknown priority '{}'", other),
            )),
        }
    }
}

/// Role expected to act on a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponsibleRole {
    #[default]
    Office,
    ProjectManager,
    FieldDirector,
    Administration,
}

impl ResponsibleRole {
    /// Returns the storage key.
    pub fn as_key(&self) -> &'static str {
        match self {
            ResponsibleRole::Office => "OFFICE",
            ResponsibleRole::ProjectManager => "PROJECT_MANAGER",
            ResponsibleRole::FieldDirector => "FIELD_DIRECTOR",
            ResponsibleRole::Administration => "ADMINISTRATION",
        }
    }
}

impl fmt::Display for ResponsibleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for ResponsibleRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "OFFICE" => Ok(ResponsibleRole::Office),
            "PROJECT_MANAGER" | "PM" => Ok(ResponsibleRole::ProjectManager),
            "FIELD_DIRECTOR" => Ok(ResponsibleRole::FieldDirector),
            "ADMINISTRATION" | "ADMIN" => Ok(ResponsibleRole::Administration),
            other => Err(ValidationError::invalid_format(
                "responsible_role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_active_alerts_can_transition() {
        assert!(AlertStatus::Active.can_transition_to(&AlertStatus::Completed));
        assert!(AlertStatus::Active.can_transition_to(&AlertStatus::Dismissed));
        assert!(!AlertStatus::Completed.can_transition_to(&AlertStatus::Active));
        assert!(!AlertStatus::Dismissed.can_transition_to(&AlertStatus::Completed));
        assert!(!AlertStatus::Active.can_transition_to(&AlertStatus::Active));
    }

    #[test]
    fn defaults_match_missing_metadata_rules() {
        assert_eq!(AlertPriority::default(), AlertPriority::Medium);
        assert_eq!(ResponsibleRole::default(), ResponsibleRole::Office);
        assert_eq!(AlertStatus::default(), AlertStatus::Active);
    }

    #[test]
    fn status_round_trips_through_storage_key() {
        for status in [AlertStatus::Active, AlertStatus::Completed, AlertStatus::Dismissed] {
            assert_eq!(status.as_key().parse::<AlertStatus>().unwrap(), status);
        }
    }

    #[test]
    fn role_accepts_common_aliases() {
        assert_eq!("pm".parse::<ResponsibleRole>().unwrap(), ResponsibleRole::ProjectManager);
        assert_eq!(
            "field director".parse::<ResponsibleRole>().unwrap(),
            ResponsibleRole::FieldDirector
        );
        assert!("janitor".parse::<ResponsibleRole>().is_err());
    }

    #[test]
    fn priority_orders_by_urgency() {
        assert!(AlertPriority::Urgent > AlertPriority::High);
        assert!(AlertPriority::Low < AlertPriority::Medium);
    }
}
