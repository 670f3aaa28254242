//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - in-memory ports for tests and local runs
//! - `postgres` - PostgreSQL ports and migrations
//! - `import` - state owned by the template import pipeline
//! - `sweep` - the periodic healing sweep

pub mod import;
pub mod memory;
pub mod postgres;
mod sweep;
mod tracing_notifier;

pub use sweep::{HealingSweep, HealingSweepConfig, SweepReport};
pub use tracing_notifier::TracingAlertNotifier;
