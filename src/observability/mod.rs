//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (request counter, duration histogram)
//!
//! Consumers:
//!     → stdout
//!     → /metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

pub use self::metrics::{GatewayMetrics, RequestSample};
