//! HealingSweep - Background service that repairs soft-failed workflow setup.
//!
//! Each cycle:
//! 1. Lists the next page of projects (bounded by `batch_limit`), resuming
//!    after the last id of the previous cycle and wrapping at the end
//! 2. Runs `ensure_ready` on each, creating or repairing trackers
//! 3. Runs batch alert generation over the same projects
//!
//! Both steps are idempotent, so overlapping with request traffic or with
//! another sweep instance is safe.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 300s | Time between cycles |
//! | `batch_limit` | 500 | Max projects visited per cycle |

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time;

use crate::application::{AlertGenerator, EnsureReadyHandler};
use crate::domain::foundation::{DomainError, ProjectId};
use crate::ports::ProjectStore;

/// Configuration for the HealingSweep service.
#[derive(Debug, Clone)]
pub struct HealingSweepConfig {
    pub interval: Duration,
    pub batch_limit: u32,
}

impl Default for HealingSweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            batch_limit: 500,
        }
    }
}

impl HealingSweepConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_batch_limit(mut self, limit: u32) -> Self {
        self.batch_limit = limit;
        self
    }
}

/// Totals for one sweep cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub projects: usize,
    pub trackers_created: usize,
    pub trackers_repaired: usize,
    pub alerts_opened: usize,
    pub failures: usize,
}

pub struct HealingSweep {
    projects: Arc<dyn ProjectStore>,
    ensure_ready: Arc<EnsureReadyHandler>,
    alerts: Arc<AlertGenerator>,
    config: HealingSweepConfig,
    /// Last project id visited; `None` restarts from the first project.
    cursor: Mutex<Option<ProjectId>>,
}

impl HealingSweep {
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        ensure_ready: Arc<EnsureReadyHandler>,
        alerts: Arc<AlertGenerator>,
        config: HealingSweepConfig,
    ) -> Self {
        Self {
            projects,
            ensure_ready,
            alerts,
            config,
            cursor: Mutex::new(None),
        }
    }

    /// Runs sweep cycles until the shutdown signal flips to true.
    ///
    /// A failed cycle is logged and the loop continues.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("Healing sweep stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.poll_once().await {
                        tracing::error!(error = %e, "Healing sweep cycle failed");
                    }
                }
            }
        }
    }

    /// Runs exactly one sweep cycle.
    ///
    /// # Errors
    ///
    /// Only listing projects can fail the cycle; per-project failures are
    /// counted in the report.
    pub async fn poll_once(&self) -> Result<SweepReport, DomainError> {
        let project_ids = self.next_page().await?;
        let mut report = SweepReport {
            projects: project_ids.len(),
            ..SweepReport::default()
        };

        for project_id in &project_ids {
            match self.ensure_ready.handle(*project_id).await {
                Ok(result) => {
                    report.trackers_created += result.created;
                    report.trackers_repaired += result.repaired;
                }
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(project_id = %project_id, error = %e, "Ensure-ready failed during sweep");
                }
            }
        }

        let batch = self.alerts.generate_batch_alerts(&project_ids).await;
        report.alerts_opened = batch.opened;
        report.failures += batch.failed;

        tracing::info!(
            projects = report.projects,
            trackers_created = report.trackers_created,
            trackers_repaired = report.trackers_repaired,
            alerts_opened = report.alerts_opened,
            failures = report.failures,
            "Healing sweep cycle finished"
        );
        Ok(report)
    }

    async fn next_page(&self) -> Result<Vec<ProjectId>, DomainError> {
        let limit = self.config.batch_limit.max(1);
        let mut cursor = self.cursor.lock().await;

        let mut page = self.projects.list_project_ids_after(*cursor, limit).await?;
        if page.is_empty() && cursor.is_some() {
            page = self.projects.list_project_ids_after(None, limit).await?;
        }

        *cursor = if page.len() < limit as usize {
            None
        } else {
            page.last().copied()
        };
        Ok(page)
    }
}
