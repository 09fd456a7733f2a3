//! Call and paging metrics
//!
//! Uses the `metrics` facade; nothing is recorded until [`init_metrics`]
//! installs the Prometheus exporter, so library users pay nothing by default.

use anyhow::Context;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls are no-ops.
pub async fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("failed to install Prometheus exporter on {addr}"))?;

    describe_counter!(
        "rpc_calls_total",
        Unit::Count,
        "Logical calls completed, labelled by outcome"
    );
    describe_counter!(
        "rpc_retries_total",
        Unit::Count,
        "Back-off retries, labelled by reason"
    );
    describe_counter!(
        "rpc_credential_refreshes_total",
        Unit::Count,
        "Credential refreshes triggered by error classification"
    );
    describe_counter!(
        "rpc_pages_total",
        Unit::Count,
        "Pages fetched during aggregation"
    );
    describe_histogram!(
        "rpc_backoff_duration_seconds",
        Unit::Seconds,
        "Duration of retry backoff in seconds"
    );
    describe_histogram!(
        "rpc_call_duration_seconds",
        Unit::Seconds,
        "Wall time of a logical call including retries"
    );

    *initialized = true;
    info!("Metrics system initialized on {}", addr);
    Ok(())
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Timing and outcome of one logical call
pub struct CallMetrics {
    operation: String,
    start_time: Instant,
}

impl CallMetrics {
    /// Start tracking a call
    pub fn start(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            start_time: Instant::now(),
        }
    }

    /// Record the final outcome ("success", "empty", "thrown", "fatal")
    pub fn record_outcome(&self, outcome: &'static str) {
        let duration = self.start_time.elapsed();

        counter!(
            "rpc_calls_total",
            "operation" => self.operation.clone(),
            "outcome" => outcome,
        )
        .increment(1);

        histogram!(
            "rpc_call_duration_seconds",
            "operation" => self.operation.clone(),
        )
        .record(duration.as_secs_f64());

        debug!(
            operation = %self.operation,
            outcome = outcome,
            duration_ms = duration.as_millis(),
            "Call finished"
        );
    }
}

/// Record retry backoff duration
pub fn record_retry_backoff(duration: Duration, reason: &str) {
    counter!("rpc_retries_total", "reason" => reason.to_string()).increment(1);
    histogram!("rpc_backoff_duration_seconds").record(duration.as_secs_f64());
}

/// Record a credential refresh
pub fn record_credential_refresh() {
    counter!("rpc_credential_refreshes_total").increment(1);
}

/// Record one fetched page
pub fn record_page(operation: &str, items: usize) {
    counter!("rpc_pages_total", "operation" => operation.to_string()).increment(1);
    debug!(operation = operation, items = items, "Page recorded");
}
