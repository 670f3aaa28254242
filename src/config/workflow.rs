//! Workflow engine configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::HealingSweepConfig;
use crate::application::{AlertGeneratorConfig, TemplateStoreConfig, DEFAULT_TOTAL_LINE_ITEMS};

/// Engine tuning: estimates, alert defaults, sweep cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Progress denominator used when a template cannot be loaded
    #[serde(default = "default_total_line_items")]
    pub default_total_line_items: u32,

    /// Days until an alert is due when the line item sets none
    #[serde(default = "default_alert_due_days")]
    pub default_alert_due_days: u32,

    /// Projects processed concurrently by batch alert generation
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Max projects visited per sweep cycle
    #[serde(default = "default_sweep_batch_limit")]
    pub sweep_batch_limit: u32,

    /// Template cache lifetime; 0 keeps entries until invalidated
    #[serde(default)]
    pub template_cache_ttl_secs: u64,
}

impl WorkflowConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn template_cache_ttl(&self) -> Option<Duration> {
        match self.template_cache_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn template_store(&self) -> TemplateStoreConfig {
        TemplateStoreConfig::default()
            .with_default_total(self.default_total_line_items)
            .with_ttl(self.template_cache_ttl())
    }

    pub fn alert_generator(&self) -> AlertGeneratorConfig {
        AlertGeneratorConfig::default()
            .with_default_due_days(self.default_alert_due_days)
            .with_batch_concurrency(self.batch_concurrency)
    }

    pub fn healing_sweep(&self) -> HealingSweepConfig {
        HealingSweepConfig::default()
            .with_interval(self.sweep_interval())
            .with_batch_limit(self.sweep_batch_limit)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_total_line_items == 0 {
            return Err(ValidationError::MustBePositive("workflow.default_total_line_items"));
        }
        if self.batch_concurrency == 0 {
            return Err(ValidationError::MustBePositive("workflow.batch_concurrency"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::MustBePositive("workflow.sweep_interval_secs"));
        }
        if self.sweep_batch_limit == 0 {
            return Err(ValidationError::MustBePositive("workflow.sweep_batch_limit"));
        }
        Ok(())
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_total_line_items: default_total_line_items(),
            default_alert_due_days: default_alert_due_days(),
            batch_concurrency: default_batch_concurrency(),
            sweep_interval_secs: default_sweep_interval(),
            sweep_batch_limit: default_sweep_batch_limit(),
            template_cache_ttl_secs: 0,
        }
    }
}

fn default_total_line_items() -> u32 {
    DEFAULT_TOTAL_LINE_ITEMS
}

fn default_alert_due_days() -> u32 {
    1
}

fn default_batch_concurrency() -> usize {
    8
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_sweep_batch_limit() -> u32 {
    500
}
