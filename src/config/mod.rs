//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! --config file (TOML, optional)
//!     → loader.rs (parse & deserialize into Settings)
//!     → cli.rs (flags overlay the file values)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once validated; there is no reload
//! - A failed validation is fatal: no listener is bound

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::ConfigError;
pub use schema::{GatewayConfig, Settings};
pub use validation::{validate, validate_target_url, ValidationError};
