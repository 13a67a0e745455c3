//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → gate.rs (try to take a permit, never wait)
//!     → permit held: forward to upstream, permit dropped on completion
//!     → no permit: shed with 429
//! ```

pub mod gate;

pub use gate::{AdmissionGate, AdmissionPermit};
