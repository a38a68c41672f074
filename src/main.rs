//! temp-file-registry - A Temporary In-Memory File Registry
//!
//! This is the main entry point for the registry server.
//! It parses flags, sets up logging, starts the expiry sweeper and serves the
//! HTTP API until Ctrl+C.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use temp_file_registry::http::{router, AppState};
use temp_file_registry::storage::{start_expiry_sweeper, Registry};
use temp_file_registry::{Cli, Config, LogLevel, URL_PATH_PREFIX};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Sets up logging. `RUST_LOG` takes precedence over `--log-level`.
fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn print_banner(config: &Config) {
    println!(
        r#"
######## ######## ##     ## ########     ######## #### ##       ########
   ##    ##       ###   ### ##     ##    ##        ##  ##       ##
   ##    ##       #### #### ##     ##    ##        ##  ##       ##
   ##    ######   ## ### ## ########     ######    ##  ##       ######
   ##    ##       ##     ## ##           ##        ##  ##       ##
   ##    ##       ##     ## ##           ##        ##  ##       ##
   ##    ######## ##     ## ##           ##       #### ######## ########

temp-file-registry v{} - Temporary In-Memory File Registry
──────────────────────────────────────────────────────────────
Listening on    {}
Upload          POST {}/upload
Download        GET  {}/download?key=<key>[&delete=true]
Default expiry  {} minutes
Max upload      {} bytes

Use Ctrl+C to shutdown gracefully.
"#,
        temp_file_registry::VERSION,
        config.bind_address(),
        URL_PATH_PREFIX,
        URL_PATH_PREFIX,
        config.registry.default_expiration_minutes,
        config.registry.max_upload_bytes,
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Cli::parse()
        .into_config()
        .context("invalid configuration")?;

    init_tracing(config.log_level);

    print_banner(&config);

    // Create the registry (shared by all requests and the sweeper)
    let registry = Arc::new(Registry::new());

    // Start the background expiry sweeper
    let sweeper = start_expiry_sweeper(Arc::clone(&registry));

    let app = router(AppState::new(Arc::clone(&registry), config.registry));

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.bind_address()))?;
    info!(address = %config.bind_address(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")?;

    drop(sweeper);

    let stats = registry.stats();
    info!(
        entries = stats.entries,
        uploads = stats.put_ops,
        downloads = stats.hits,
        deleted = stats.deleted,
        expired = stats.expired,
        "Server shutdown complete"
    );
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping server..."),
        Err(e) => {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
