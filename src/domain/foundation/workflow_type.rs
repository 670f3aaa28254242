//! WorkflowType - the trade a template and its trackers belong to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Identifies a workflow template family, e.g. `ROOFING` or `GUTTERS`.
///
/// Stored upper-case with spaces and hyphens folded to underscores so that
/// `"Roofing"`, `"roofing"` and `"ROOFING"` name the same workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowType(String);

impl WorkflowType {
    /// Creates a normalized workflow type, rejecting blank input.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let normalized: String = value
            .as_ref()
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        if normalized.is_empty() {
            return Err(ValidationError::empty_field("workflow_type"));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "workflow_type",
                format!("'{}' contains unsupported characters", value.as_ref()),
            ));
        }
        Ok(Self(normalized))
    }

    /// Returns the normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WorkflowType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for WorkflowType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkflowType> for String {
    fn from(value: WorkflowType) -> Self {
        value.0
    }
}
