//! Domain layer containing workflow progression logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `template` - Phase → Section → Line Item hierarchy and its flattened order
//! - `tracker` - Per-project, per-workflow-type progression state
//! - `progression` - Pure state transitions: completion, progress, phase derivation
//! - `alert` - Notifications for currently actionable line items
//! - `display` - Presentation-only label mapping

pub mod alert;
pub mod display;
pub mod foundation;
pub mod progression;
pub mod template;
pub mod tracker;
