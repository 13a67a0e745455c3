use std::process::ExitCode;

use clap::Parser;

use throttle_proxy::config::Cli;
use throttle_proxy::lifecycle::{self, signals, Shutdown};
use throttle_proxy::observability::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(cli.debug);
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    init_logging(settings.debug);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "throttle-proxy starting");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    match lifecycle::start(settings, shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}
