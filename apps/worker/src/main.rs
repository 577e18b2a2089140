//! # Postline Worker
//!
//! Publishes due scheduled posts to LinkedIn on a fixed interval. Runs as its
//! own process next to the API server and shares only the database with it.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use postline_core::ports::{PostRepository, Publisher};
use postline_core::publication::PublicationWorker;
use postline_infra::LinkedInPublisher;
use postline_infra::database::{DatabaseConfig, DatabaseConnections, PostgresPostRepository};
use postline_infra::telemetry::{TelemetryConfig, init_telemetry};

mod config;
mod scheduler;

use config::WorkerSettings;
use scheduler::Scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env("worker"));

    let settings = WorkerSettings::from_env();
    let db_config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let connections = DatabaseConnections::init(&db_config).await?;

    let posts: Arc<dyn PostRepository> = Arc::new(PostgresPostRepository::new(connections.main));
    let publisher: Arc<dyn Publisher> = Arc::new(LinkedInPublisher::from_env()?);
    let worker = Arc::new(PublicationWorker::new(
        posts,
        publisher,
        settings.worker.clone(),
    ));

    tracing::info!(
        interval_secs = settings.worker.interval.as_secs(),
        max_attempts = settings.worker.max_attempts,
        "Starting Postline worker"
    );

    if settings.run_on_start {
        tick(&worker).await;
    }

    let mut scheduler = Scheduler::new().await?;
    let job_worker = worker.clone();
    scheduler
        .add_repeated(settings.worker.interval, move || {
            let worker = job_worker.clone();
            async move { tick(&worker).await }
        })
        .await?;
    scheduler.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    scheduler.shutdown().await?;

    Ok(())
}

/// One tick. Failures are logged; the next tick retries.
async fn tick(worker: &PublicationWorker) {
    match worker.run_tick(Utc::now()).await {
        Ok(report) if report.due > 0 => {
            tracing::debug!(?report, "Tick complete");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Publication tick aborted"),
    }
}
