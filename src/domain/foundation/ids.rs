//! Strongly-typed identifier value objects.
//!
//! Every identifier wraps a UUID. The `uuid_id!` macro generates the shared
//! surface (random construction, UUID conversion, Display, FromStr) so each
//! id type stays a distinct type the compiler can tell apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a project (owned by the external project store).
    ProjectId
);

uuid_id!(
    /// Unique identifier for a per-project, per-workflow-type tracker.
    TrackerId
);

uuid_id!(
    /// Unique identifier for an alert record.
    AlertId
);

uuid_id!(
    /// Identifier of a phase inside a workflow template.
    PhaseId
);

uuid_id!(
    /// Identifier of a section inside a template phase.
    SectionId
);

uuid_id!(
    /// Identifier of a line item, the atomic unit of work.
    LineItemId
);
