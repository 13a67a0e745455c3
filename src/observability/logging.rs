//! Structured logging.
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - `RUST_LOG` takes precedence; otherwise `--debug` picks the level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "throttle_proxy=debug,tower_http=debug"
    } else {
        "throttle_proxy=info,tower_http=info"
    }
}

/// Install the global tracing subscriber. Call once, from `main`.
pub fn init_logging(debug: bool) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_raises_crate_level() {
        assert!(default_filter(true).contains("throttle_proxy=debug"));
        assert!(default_filter(false).contains("throttle_proxy=info"));
    }
}
