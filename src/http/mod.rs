//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, /metrics vs. proxy route)
//!     → request.rs (assign request ID)
//!     → gateway (admission decision)
//!     → forward.rs (URI rewrite, relay to upstream)
//!     → headers.rs (hop-by-hop stripping, X-Forwarded-For)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod server;

pub use forward::{Transport, UpstreamClient};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
