//! Alert module - notifications for currently actionable line items.
//!
//! Invariant: at most one ACTIVE alert per (project, line item).

mod aggregate;
mod candidate;

pub use aggregate::Alert;
pub use candidate::{AlertCandidate, AlertDiff};
