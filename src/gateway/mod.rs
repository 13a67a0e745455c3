//! Forwarding gateway.
//!
//! # Request Flow
//! ```text
//! inbound request
//!     → admission gate: try to take a permit (never waits)
//!         ├─ no permit → 429, counter sample, done
//!         └─ permit    → transport.forward(request)
//!                        → counter + histogram sample
//!                        → permit rides on the response body,
//!                          released when the body ends or is dropped
//! ```
//!
//! # Design Decisions
//! - Rejection is an expected outcome, logged at debug only
//! - The transport's response is returned as-is; nothing is retried
//! - Cancellation drops the permit, so a permit is never leaked
//! - A request abandoned mid-flight is still counted once, as a 502

mod body;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    response::IntoResponse,
};

use crate::admission::AdmissionGate;
use crate::http::forward::{Transport, UpstreamClient};
use crate::http::request::request_id;
use crate::observability::{GatewayMetrics, RequestSample};

pub use body::PermitBody;

/// Body of the response sent when every permit is taken.
pub const REJECTION_BODY: &str = "429: All requests are busy, try later";

/// Admits up to `capacity` concurrent requests to the upstream and sheds the rest.
pub struct Gateway<T = UpstreamClient> {
    gate: Arc<AdmissionGate>,
    metrics: Arc<GatewayMetrics>,
    transport: T,
}

impl<T: Transport> Gateway<T> {
    pub fn new(capacity: usize, metrics: Arc<GatewayMetrics>, transport: T) -> Self {
        Self {
            gate: Arc::new(AdmissionGate::new(capacity)),
            metrics,
            transport,
        }
    }

    /// The gateway's admission gate, for inspection.
    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.metrics
    }

    /// Admit-or-reject, then forward.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let method = request.method().to_string();
        let path = request.uri().path().to_string();
        let request_id = request_id(&request).to_string();

        let Some(permit) = self.gate.try_permit() else {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "All requests are busy, rejecting"
            );
            self.metrics.record(&RequestSample {
                method: &method,
                path: &path,
                status: StatusCode::TOO_MANY_REQUESTS.as_u16(),
                duration: None,
            });
            return (StatusCode::TOO_MANY_REQUESTS, REJECTION_BODY).into_response();
        };

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            in_flight = self.gate.in_flight(),
            "Redirecting request"
        );

        let abandoned = AbandonedSample {
            metrics: &self.metrics,
            method: &method,
            path: &path,
            armed: true,
        };

        let start = Instant::now();
        let response = self.transport.forward(request).await;
        let elapsed = start.elapsed();
        let status = response.status();

        abandoned.disarm();
        self.metrics.record(&RequestSample {
            method: &method,
            path: &path,
            status: status.as_u16(),
            duration: Some(elapsed),
        });

        tracing::debug!(
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = %elapsed.as_millis(),
            "Upstream responded"
        );

        let (parts, body) = response.into_parts();
        Response::from_parts(parts, Body::new(PermitBody::new(body, permit)))
    }
}

/// Counts an admitted request whose handler is dropped before the
/// upstream answers, e.g. because the client went away.
struct AbandonedSample<'a> {
    metrics: &'a GatewayMetrics,
    method: &'a str,
    path: &'a str,
    armed: bool,
}

impl AbandonedSample<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonedSample<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::debug!(
            method = %self.method,
            path = %self.path,
            "Request abandoned before upstream responded"
        );
        self.metrics.record(&RequestSample {
            method: self.method,
            path: self.path,
            status: StatusCode::BAD_GATEWAY.as_u16(),
            duration: None,
        });
    }
}

impl<T: Clone> Clone for Gateway<T> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
            metrics: Arc::clone(&self.metrics),
            transport: self.transport.clone(),
        }
    }
}
