//! Configuration validation.
//!
//! # Responsibilities
//! - Check the upstream URL is absolute, has a host and an explicit port
//! - Check the upstream scheme is http or https
//! - Check the listen port and capacity ranges
//!
//! # Design Decisions
//! - Checks run in a fixed order and stop at the first failure
//! - Each error names the flag that carries the bad value
//! - Runs before any listener is bound

use std::time::Duration;

use axum::http::Uri;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, DEFAULT_CONNECT_TIMEOUT_SECS};

/// A rejected startup value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("target: required parameter (expected format: http://0.0.0.0:9000)")]
    MissingTarget,

    #[error("target: invalid URL `{url}`: {source} (expected format: http://0.0.0.0:9000)")]
    InvalidTarget {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("target: domain is missing in `{url}`")]
    MissingHost { url: String },

    #[error("target: port is missing in `{url}`")]
    MissingPort { url: String },

    #[error("target: unsupported scheme `{scheme}` in `{url}`, expected http or https")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("port: must be between 1 and 65535, got {0}")]
    InvalidListenPort(i64),

    #[error("requests: must be a positive integer, got {0}")]
    InvalidCapacity(i64),
}

/// Validate the upstream URL on its own.
pub fn validate_target_url(raw: &str) -> Result<Url, ValidationError> {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::EmptyHost) => {
            return Err(ValidationError::MissingHost { url: raw.to_string() })
        }
        Err(source) => {
            return Err(ValidationError::InvalidTarget {
                url: raw.to_string(),
                source,
            })
        }
    };

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MissingHost { url: raw.to_string() });
    }

    if explicit_port(raw, &url).is_none() {
        return Err(ValidationError::MissingPort { url: raw.to_string() });
    }

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    Ok(url)
}

/// Validate all startup values in order: target, listen port, capacity.
pub fn validate(
    target: &str,
    listen_port: i64,
    capacity: i64,
) -> Result<GatewayConfig, ValidationError> {
    let target = validate_target_url(target)?;

    let listen_port = u16::try_from(listen_port)
        .ok()
        .filter(|p| *p > 0)
        .ok_or(ValidationError::InvalidListenPort(listen_port))?;

    let capacity = usize::try_from(capacity)
        .ok()
        .filter(|c| *c > 0)
        .ok_or(ValidationError::InvalidCapacity(capacity))?;

    Ok(GatewayConfig {
        target,
        listen_port,
        capacity,
        debug: false,
        connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
    })
}

/// `Url` drops a port equal to the scheme default, so fall back to the
/// raw authority to tell `http://host:80` apart from `http://host`.
fn explicit_port(raw: &str, url: &Url) -> Option<u16> {
    url.port()
        .or_else(|| raw.parse::<Uri>().ok().and_then(|uri| uri.port_u16()))
}
