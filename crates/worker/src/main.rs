//! Guest insights worker entry point

use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use guest_insights_config::load_settings;
use guest_insights_engine::TaggingEngine;
use guest_insights_persistence::InMemoryStore;
use guest_insights_worker::{init_metrics, init_tracing, BatchReport, RecomputeJob, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("GUEST_INSIGHTS_ENV").ok();
    let settings = load_settings(env.as_deref()).context("Failed to load settings")?;

    init_tracing(&settings);

    tracing::info!("Starting guest insights worker v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?settings.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    if settings.observability.metrics_enabled {
        if let Err(e) = init_metrics(settings.observability.metrics_port) {
            tracing::warn!(error = %e, "Failed to start Prometheus exporter, continuing without metrics");
        }
    }

    let store = match &settings.persistence.snapshot_path {
        Some(path) => InMemoryStore::from_json_file(path)
            .with_context(|| format!("Failed to load store snapshot from {}", path))?,
        None => {
            tracing::warn!("No persistence.snapshot_path configured, starting with an empty store");
            InMemoryStore::new()
        },
    };

    let job = RecomputeJob::new(
        TaggingEngine::new(settings.tagging.clone()),
        Stores::shared(Arc::new(store)),
        settings.worker.clone(),
    );

    let Some(interval_secs) = settings.worker.interval_secs else {
        let report = job.run_all(Utc::now()).await?;
        log_report(&report);
        if !report.is_success() {
            anyhow::bail!("{} restaurant batch(es) failed", report.failed.len());
        }
        return Ok(());
    };

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match job.run_all(Utc::now()).await {
                    Ok(report) => log_report(&report),
                    Err(e) => tracing::error!(error = %e, "Recompute batch failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    tracing::info!("Worker shutdown complete");
    Ok(())
}

fn log_report(report: &BatchReport) {
    for restaurant in &report.succeeded {
        tracing::info!(
            restaurant_id = %restaurant.restaurant_id,
            customers = restaurant.customers,
            triggers = restaurant.triggers,
            skipped_orders = restaurant.skipped_orders,
            skipped_reviews = restaurant.skipped_reviews,
            churn_rate = restaurant.churn_rate,
            attempts = restaurant.attempts,
            "Restaurant recomputed"
        );
    }
    for failure in &report.failed {
        tracing::error!(
            restaurant_id = %failure.restaurant_id,
            error = %failure.error,
            "Restaurant not recomputed"
        );
    }
}
