//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Call once at startup before any metrics are recorded; a second install
/// in the same process fails, in which case a non-global recorder handle
/// is returned so tests can still render.
pub fn install_recorder() -> PrometheusHandle {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("prometheus metrics recorder installed");
            handle
        }
        Err(_) => PrometheusBuilder::new().build_recorder().handle(),
    }
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across modules.

/// Logs accepted and persisted (counter, labels: path).
pub const LOGS_INGESTED_TOTAL: &str = "logs_ingested_total";
/// Ingest attempts rejected before persistence (counter, labels: reason).
pub const LOGS_REJECTED_TOTAL: &str = "logs_rejected_total";
/// Rate limiter denials (counter).
pub const RATE_LIMIT_DENIALS_TOTAL: &str = "rate_limit_denials_total";
/// Sessions opened (counter).
pub const SESSIONS_TOTAL: &str = "sessions_total";
/// Live sessions (gauge).
pub const SESSIONS_ACTIVE: &str = "sessions_active";
/// Sessions evicted by the idle sweeper (counter).
pub const SESSIONS_SWEPT_TOTAL: &str = "sessions_swept_total";
/// Batch calls completed (counter, labels: outcome).
pub const BATCHES_TOTAL: &str = "batches_total";
