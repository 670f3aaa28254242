//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `TemplateSource` - Normalized workflow templates from the import pipeline
//! - `TrackerRepository` - Tracker persistence with optimistic versioning
//! - `AlertRepository` - Alert persistence with an atomic dedup insert
//!
//! ## External Collaborator Ports
//!
//! - `ProjectStore` - Project fields read at initialization, phase/progress write-back
//! - `PhaseOverrideStore` - Manual display-phase overrides
//! - `AlertNotifier` - Delivery of opened/closed alert diffs

mod alert_notifier;
mod alert_repository;
mod phase_override_store;
mod project_store;
mod template_source;
mod tracker_repository;

pub use alert_notifier::AlertNotifier;
pub use alert_repository::AlertRepository;
pub use phase_override_store::PhaseOverrideStore;
pub use project_store::{ProjectRecord, ProjectStore};
pub use template_source::TemplateSource;
pub use tracker_repository::TrackerRepository;
