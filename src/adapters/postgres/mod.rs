//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresTemplateSource` - JSONB template bodies per workflow type
//! - `PostgresTrackerRepository` - Trackers with version-guarded saves
//! - `PostgresAlertRepository` - Alerts with an atomic dedup insert
//! - `PostgresProjectStore` - Project read/write-back and phase overrides
//!
//! Schema lives in `migrations/`; `MIGRATOR` applies it.

mod alert_repository;
mod project_store;
mod template_source;
mod tracker_repository;

pub use alert_repository::PostgresAlertRepository;
pub use project_store::PostgresProjectStore;
pub use template_source::PostgresTemplateSource;
pub use tracker_repository::PostgresTrackerRepository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
