//! Bounded-concurrency forwarding gateway.
//!
//! Forwards every request to a single upstream while admitting at most a
//! fixed number at a time; the rest are shed immediately with 429.
//!
//! ```text
//!     Client ──▶ http::server ──▶ gateway ──▶ admission gate
//!                                    │            │ permit
//!                                    │            ▼
//!                                    │      http::forward ──▶ Upstream
//!                                    ▼
//!                           observability::metrics ◀── GET /metrics
//! ```

// Core subsystems
pub mod admission;
pub mod config;
pub mod gateway;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
