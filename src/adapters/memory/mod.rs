//! In-memory adapters for every port.
//!
//! Used by tests and local runs. Each adapter mirrors the uniqueness and
//! versioning rules of its PostgreSQL counterpart.

mod alert_notifier;
mod alert_repository;
mod phase_override_store;
mod project_store;
mod template_source;
mod tracker_repository;

pub use alert_notifier::RecordingAlertNotifier;
pub use alert_repository::InMemoryAlertRepository;
pub use phase_override_store::InMemoryPhaseOverrideStore;
pub use project_store::InMemoryProjectStore;
pub use template_source::InMemoryTemplateSource;
pub use tracker_repository::InMemoryTrackerRepository;
