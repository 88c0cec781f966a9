//! # Prometheus Metrics
//!
//! Exposes operational metrics for the gateway. Scraped by Prometheus at the
//! `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use kasgate_protocol::transfer::ErrorKind;

/// Holds all Prometheus metric handles for the gateway.
///
/// Clone-friendly (prometheus handles are `Arc` internally) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Transactions accepted by the indexer.
    pub transfers_submitted_total: IntCounter,
    /// Failed build or send requests, labelled by error kind.
    pub transfers_failed_total: IntCounterVec,
    /// Successful dry-run builds.
    pub dry_run_builds_total: IntCounter,
    /// Wall-clock time of the transfer pipeline, validation through broadcast.
    pub transfer_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("kasgate".into()), None)?;

        let transfers_submitted_total = IntCounter::new(
            "transfers_submitted_total",
            "Total number of transactions accepted by the indexer",
        )?;
        registry.register(Box::new(transfers_submitted_total.clone()))?;

        let transfers_failed_total = IntCounterVec::new(
            Opts::new(
                "transfers_failed_total",
                "Total number of failed transfer requests by error kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(transfers_failed_total.clone()))?;

        let dry_run_builds_total = IntCounter::new(
            "dry_run_builds_total",
            "Total number of transactions built without broadcasting",
        )?;
        registry.register(Box::new(dry_run_builds_total.clone()))?;

        let transfer_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "transfer_latency_seconds",
                "End-to-end transfer pipeline latency in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0,
            ]),
        )?;
        registry.register(Box::new(transfer_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            transfers_submitted_total,
            transfers_failed_total,
            dry_run_builds_total,
            transfer_latency_seconds,
        })
    }

    /// Counts a failed transfer under its error kind.
    pub fn record_failure(&self, kind: ErrorKind) {
        self.transfers_failed_total
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_labelled_by_kind() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.record_failure(ErrorKind::InsufficientFunds);
        metrics.record_failure(ErrorKind::InsufficientFunds);
        metrics.record_failure(ErrorKind::Validation);

        let text = metrics.encode().unwrap();
        assert!(text.contains("kasgate_transfers_failed_total{kind=\"insufficient_funds\"} 2"));
        assert!(text.contains("kasgate_transfers_failed_total{kind=\"validation\"} 1"));
    }

    #[test]
    fn counters_are_namespaced() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.transfers_submitted_total.inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("kasgate_transfers_submitted_total 1"));
        assert!(text.contains("kasgate_transfer_latency_seconds"));
    }
}
