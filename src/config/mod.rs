//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `PROJECT_WORKFLOW`
//! prefix and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use project_workflow::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Sweeping every {:?}", config.workflow.sweep_interval());
//! ```

mod database;
mod error;
mod logging;
mod workflow;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use workflow::WorkflowConfig;

use serde::Deserialize;

/// Root configuration for the workflow service.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection
    pub database: DatabaseConfig,

    /// Engine defaults and sweep cadence
    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads variables with the `PROJECT_WORKFLOW` prefix
    /// 3. Splits nested keys on `__`
    ///
    /// # Environment Variable Format
    ///
    /// - `PROJECT_WORKFLOW__DATABASE__URL=...` -> `database.url`
    /// - `PROJECT_WORKFLOW__WORKFLOW__SWEEP_INTERVAL_SECS=60` -> `workflow.sweep_interval_secs`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PROJECT_WORKFLOW")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.workflow.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
