//! project-workflow - runs the healing sweep against PostgreSQL.
//!
//! Loads configuration from the environment, optionally applies migrations,
//! then repairs soft-failed project workflows and regenerates missing alerts
//! on a fixed interval until Ctrl-C.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use project_workflow::adapters::postgres::{
    PostgresAlertRepository, PostgresProjectStore, PostgresTemplateSource, PostgresTrackerRepository, MIGRATOR,
};
use project_workflow::adapters::{HealingSweep, TracingAlertNotifier};
use project_workflow::application::{WorkflowPorts, WorkflowServices};
use project_workflow::config::{AppConfig, LoggingConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    config.validate()?;

    let pool = config.database.connect().await?;
    if config.database.run_migrations {
        MIGRATOR.run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let project_store = Arc::new(PostgresProjectStore::new(pool.clone()));
    let services = WorkflowServices::new(
        WorkflowPorts {
            templates: Arc::new(PostgresTemplateSource::new(pool.clone())),
            trackers: Arc::new(PostgresTrackerRepository::new(pool.clone())),
            alerts: Arc::new(PostgresAlertRepository::new(pool)),
            projects: project_store.clone(),
            overrides: project_store.clone(),
            notifier: Arc::new(TracingAlertNotifier::new()),
        },
        config.workflow.template_store(),
        config.workflow.alert_generator(),
    );

    let sweep = HealingSweep::new(
        project_store,
        services.ensure_ready.clone(),
        services.alerts.clone(),
        config.workflow.healing_sweep(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep_task = tokio::spawn(async move { sweep.run(shutdown_rx).await });

    tracing::info!(
        interval_secs = config.workflow.sweep_interval_secs,
        batch_limit = config.workflow.sweep_batch_limit,
        "Healing sweep started"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    let _ = shutdown_tx.send(true);
    sweep_task.await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
