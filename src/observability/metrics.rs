//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the proxy metrics (request count, latency)
//! - Render them in Prometheus text format for the `/metrics` endpoint
//!
//! # Metrics
//! - `http_proxy_requests_total` (counter): requests by method, status code
//! - `http_proxy_request_duration_seconds` (histogram): forwarded request
//!   latency by method, path
//!
//! # Design Decisions
//! - The recorder is owned by a `GatewayMetrics` value, never installed as
//!   the process-wide recorder, so independent gateways do not share counters
//! - Histogram buckets match the Prometheus client defaults

use std::time::Duration;

use metrics::{describe_counter, describe_histogram, with_local_recorder, Unit};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

pub const REQUESTS_TOTAL: &str = "http_proxy_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_proxy_request_duration_seconds";

/// Prometheus default histogram buckets, in seconds.
const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// One completed request, as seen by the metrics registry.
#[derive(Debug, Clone)]
pub struct RequestSample<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub status: u16,
    /// Only forwarded requests carry a duration.
    pub duration: Option<Duration>,
}

/// Request metrics for one gateway, with pull-based exposition.
pub struct GatewayMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl GatewayMetrics {
    /// Build a standalone registry.
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                &DEFAULT_BUCKETS,
            )?
            .build_recorder();
        let handle = recorder.handle();

        with_local_recorder(&recorder, || {
            describe_counter!(
                REQUESTS_TOTAL,
                "Total number of requests redirected by the proxy"
            );
            describe_histogram!(
                REQUEST_DURATION_SECONDS,
                Unit::Seconds,
                "Histogram of request durations in seconds"
            );
        });

        Ok(Self { recorder, handle })
    }

    /// Record one completed request: always a counter sample, plus a
    /// histogram sample when the request was forwarded.
    pub fn record(&self, sample: &RequestSample<'_>) {
        with_local_recorder(&self.recorder, || {
            metrics::counter!(
                REQUESTS_TOTAL,
                "method" => sample.method.to_string(),
                "code" => sample.status.to_string()
            )
            .increment(1);

            if let Some(duration) = sample.duration {
                metrics::histogram!(
                    REQUEST_DURATION_SECONDS,
                    "method" => sample.method.to_string(),
                    "path" => sample.path.to_string()
                )
                .record(duration.as_secs_f64());
            }
        });
    }

    /// Current values in Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl std::fmt::Debug for GatewayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayMetrics").finish_non_exhaustive()
    }
}
