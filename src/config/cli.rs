//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{load_settings, ConfigError};
use crate::config::schema::Settings;

#[derive(Debug, Parser)]
#[command(name = "throttle-proxy")]
#[command(about = "Forwards requests to one upstream, rejecting anything over a fixed concurrency limit")]
pub struct Cli {
    /// Target url to send requests to. Example: http://127.0.0.1:8000
    #[arg(long)]
    pub target: Option<String>,

    /// Port to listen on
    #[arg(long, allow_negative_numbers = true)]
    pub port: Option<i64>,

    /// Number of requests that can be processed in parallel by the upstream
    #[arg(long, allow_negative_numbers = true)]
    pub requests: Option<i64>,

    /// Print debug logs
    #[arg(long)]
    pub debug: bool,

    /// Upstream TCP connect timeout in seconds [default: 30]
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,

    /// Optional TOML file with the same keys; flags take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Resolve the raw settings: config file first, then flags on top.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let base = match &self.config {
            Some(path) => load_settings(path)?,
            None => Settings::default(),
        };

        Ok(base.merge(Settings {
            target: self.target.clone(),
            port: self.port,
            requests: self.requests,
            debug: self.debug,
            connect_timeout_secs: self.connect_timeout_secs,
        }))
    }
}
