//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the metrics registry and upstream transport
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and nothing is bound
//! - The listener binds last, so traffic arrives only when ready

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, Settings};
use crate::http::forward::RewriteError;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::GatewayMetrics;

/// A fatal error before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build metrics registry: {0}")]
    Metrics(#[from] BuildError),

    #[error("Failed to build upstream client: {0}")]
    Upstream(#[from] RewriteError),

    #[error("Could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not start server: {0}")]
    Serve(#[source] std::io::Error),
}

/// Validate `settings`, bind the listen port and serve until `shutdown` fires.
pub async fn start(settings: Settings, shutdown: Shutdown) -> Result<(), StartupError> {
    let config = settings.validate().map_err(ConfigError::from)?;

    tracing::info!(
        target_url = %config.target(),
        listen_port = config.listen_port(),
        capacity = config.capacity(),
        debug = config.debug(),
        "Configuration loaded"
    );

    let metrics = Arc::new(GatewayMetrics::new()?);
    let server = HttpServer::new(&config, metrics)?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.listen_port()));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(
        port = config.listen_port(),
        target_url = %config.target(),
        "Starting proxy server"
    );

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
