//! Logging and Prometheus metrics

use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use guest_insights_config::Settings;
use guest_insights_engine::TaggingOutcome;

/// Initialize tracing with an env filter and optional JSON output
pub fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("guest_insights={level},guest_insights_worker={level},guest_insights_engine={level},guest_insights_persistence={level}").into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}

/// Start the Prometheus exporter on `0.0.0.0:<port>`
///
/// Must be called from inside the tokio runtime.
pub fn init_metrics(port: u16) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;
    tracing::info!(metrics_port = port, "Started Prometheus exporter");
    Ok(())
}

pub fn record_restaurant_run(outcome: &'static str, elapsed: Duration) {
    metrics::counter!("guest_insights_restaurant_runs_total", "outcome" => outcome).increment(1);
    metrics::histogram!("guest_insights_restaurant_run_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}

pub fn record_retry() {
    metrics::counter!("guest_insights_restaurant_retries_total").increment(1);
}

/// Counters derived from one successful restaurant run
pub fn record_outcome(outcome: &TaggingOutcome) {
    metrics::counter!("guest_insights_customers_tagged_total").increment(outcome.customers.len() as u64);

    for trigger in &outcome.triggers {
        metrics::counter!(
            "guest_insights_triggers_emitted_total",
            "type" => trigger.trigger_type.as_str()
        )
        .increment(1);
    }

    metrics::counter!("guest_insights_skipped_records_total", "kind" => "order")
        .increment(outcome.skipped.order_count() as u64);
    metrics::counter!("guest_insights_skipped_records_total", "kind" => "review")
        .increment(outcome.skipped.review_count() as u64);
}

pub fn record_customer_recompute() {
    metrics::counter!("guest_insights_customer_recomputes_total").increment(1);
}
