//! Prometheus metrics module
//!
//! Components record through the `metrics` macros. Without an installed
//! recorder (tests, or no `METRICS_PORT`) recording is a no-op.

use crate::error::BotError;
use metrics::{counter, describe_counter, describe_gauge, gauge, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from inside the Tokio runtime; the exporter runs as a
/// task on it.
pub fn install(addr: SocketAddr) -> Result<(), BotError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| BotError::Metrics(e.to_string()))?;

    register_metrics();
    Ok(())
}

/// Register metric descriptions
fn register_metrics() {
    describe_counter!(
        "bot_interactions_total",
        Unit::Count,
        "Interactions dispatched, by command and outcome"
    );
    describe_counter!(
        "bot_presence_updates_total",
        Unit::Count,
        "Presence recomputations, by result"
    );
    describe_counter!("bot_errors_total", Unit::Count, "Total runtime errors");
    describe_counter!(
        "bot_web_requests_total",
        Unit::Count,
        "Requests answered by the request listener"
    );
    describe_gauge!(
        "bot_guilds_total",
        Unit::Count,
        "Total guilds across all shards"
    );
}

/// Record one dispatched interaction
pub fn record_interaction(command: &str, outcome: &'static str) {
    counter!(
        "bot_interactions_total",
        "command" => command.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a presence recomputation
pub fn record_presence_update(success: bool) {
    counter!(
        "bot_presence_updates_total",
        "result" => if success { "ok" } else { "error" }
    )
    .increment(1);
}

/// Record runtime error
pub fn record_error(error: &BotError) {
    counter!(
        "bot_errors_total",
        "error_type" => error.error_type_label()
    )
    .increment(1);
}

/// Record a request answered by the request listener
pub fn record_web_request() {
    counter!("bot_web_requests_total").increment(1);
}

/// Set total guild count
pub fn set_guilds_total(count: u64) {
    gauge!("bot_guilds_total").set(count as f64);
}
