//! Metrics for upstream provider calls
//!
//! Every chat-completion or summarization call made by the conversation
//! client is timed and counted, labeled by provider name.
//!
//! # Metrics
//!
//! - `upstream_requests_total`: Counter of calls by provider and status
//! - `upstream_request_duration_seconds`: Histogram of call latency
//! - `upstream_tokens_total`: Counter of tokens charged to sessions
//! - `upstream_in_flight`: Gauge of calls currently awaiting a response
//!
//! # Examples
//!
//! ```
//! use palaver::metrics::UpstreamCallMetrics;
//!
//! let call = UpstreamCallMetrics::new("mock", "chat");
//! call.record_success(42);
//! ```

use metrics::{counter, decrement_gauge, histogram, increment_counter, increment_gauge};
use std::cell::Cell;
use std::time::Instant;

/// Metrics collection for a single upstream call
///
/// Created immediately before the call and resolved with
/// [`record_success`](Self::record_success) or
/// [`record_error`](Self::record_error). Dropping an unresolved tracker
/// still releases the in-flight gauge.
#[derive(Debug)]
pub struct UpstreamCallMetrics {
    provider: String,
    operation: &'static str,
    start: Instant,
    recorded: Cell<bool>,
}

impl UpstreamCallMetrics {
    /// Starts tracking a call
    ///
    /// # Arguments
    ///
    /// * `provider` - Provider name label
    /// * `operation` - `chat` or `summary`
    pub fn new(provider: impl Into<String>, operation: &'static str) -> Self {
        let provider = provider.into();
        increment_gauge!("upstream_in_flight", 1.0, "provider" => provider.clone());

        Self {
            provider,
            operation,
            start: Instant::now(),
            recorded: Cell::new(false),
        }
    }

    /// Records a successful call and the tokens it consumed
    pub fn record_success(&self, tokens: usize) {
        if self.recorded.replace(true) {
            return;
        }

        self.record_duration("success");
        increment_counter!(
            "upstream_requests_total",
            "provider" => self.provider.clone(),
            "operation" => self.operation,
            "status" => "success"
        );
        counter!(
            "upstream_tokens_total",
            tokens as u64,
            "provider" => self.provider.clone(),
            "operation" => self.operation
        );
        decrement_gauge!("upstream_in_flight", 1.0, "provider" => self.provider.clone());
    }

    /// Records a failed call
    ///
    /// # Arguments
    ///
    /// * `error_kind` - Short label for the failure class
    pub fn record_error(&self, error_kind: &str) {
        if self.recorded.replace(true) {
            return;
        }

        self.record_duration("error");
        increment_counter!(
            "upstream_requests_total",
            "provider" => self.provider.clone(),
            "operation" => self.operation,
            "status" => "error",
            "error_kind" => error_kind.to_string()
        );
        decrement_gauge!("upstream_in_flight", 1.0, "provider" => self.provider.clone());
    }

    /// Returns the provider label
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns elapsed time since the call started
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }

    fn record_duration(&self, status: &'static str) {
        histogram!(
            "upstream_request_duration_seconds",
            self.start.elapsed().as_secs_f64(),
            "provider" => self.provider.clone(),
            "operation" => self.operation,
            "status" => status
        );
    }
}

impl Drop for UpstreamCallMetrics {
    fn drop(&mut self) {
        if !self.recorded.get() {
            decrement_gauge!("upstream_in_flight", 1.0, "provider" => self.provider.clone());
        }
    }
}

/// Initializes the Prometheus exporter
///
/// Only has an effect when compiled with the `prometheus` feature; otherwise
/// it is a no-op that is still safe to call.
pub fn init_metrics_exporter() {
    #[cfg(feature = "prometheus")]
    {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let _ = builder.install().map_err(|e| {
            tracing::warn!("Failed to install Prometheus exporter: {}", e);
        });
    }
}
