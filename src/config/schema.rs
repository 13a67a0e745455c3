//! Configuration schema definitions.
//!
//! `Settings` is the raw, unvalidated shape read from a config file and
//! command-line flags. `GatewayConfig` is what the rest of the proxy sees;
//! it can only be obtained through validation.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::config::validation::{validate, ValidationError};

/// Default TCP connect timeout for the upstream transport.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Raw gateway settings before validation.
///
/// Every field is optional in the file so flags can fill in the rest.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Upstream URL (e.g., "http://127.0.0.1:8000").
    pub target: Option<String>,

    /// Port the gateway listens on.
    pub port: Option<i64>,

    /// Number of requests the upstream may process in parallel.
    pub requests: Option<i64>,

    /// Verbose diagnostic logging.
    pub debug: bool,

    /// Upstream connect timeout in seconds. Defaults to
    /// [`DEFAULT_CONNECT_TIMEOUT_SECS`] when unset.
    pub connect_timeout_secs: Option<u64>,
}

impl Settings {
    /// Overlay `other` on top of `self`. Values present in `other` win.
    pub fn merge(mut self, other: Settings) -> Self {
        if other.target.is_some() {
            self.target = other.target;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.requests.is_some() {
            self.requests = other.requests;
        }
        self.debug |= other.debug;
        if other.connect_timeout_secs.is_some() {
            self.connect_timeout_secs = other.connect_timeout_secs;
        }
        self
    }

    /// Validate into an immutable [`GatewayConfig`].
    pub fn validate(&self) -> Result<GatewayConfig, ValidationError> {
        let target = self
            .target
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingTarget)?;

        let config = validate(target, self.port.unwrap_or(0), self.requests.unwrap_or(0))?;
        Ok(GatewayConfig {
            debug: self.debug,
            connect_timeout: Duration::from_secs(
                self.connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            ..config
        })
    }
}

/// Validated gateway configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub(crate) target: Url,
    pub(crate) listen_port: u16,
    pub(crate) capacity: usize,
    pub(crate) debug: bool,
    pub(crate) connect_timeout: Duration,
}

impl GatewayConfig {
    /// Upstream every admitted request is forwarded to.
    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    /// Maximum number of requests forwarded concurrently.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}
