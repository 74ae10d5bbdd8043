use std::path::Path;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use tasklist_server::api::{self, AppState};
use tasklist_server::config::TasklistConfig;
use tasklist_server::store_factory;

/// Tasklist HTTP server.
#[derive(Parser, Debug)]
#[command(name = "tasklist-server", about = "HTTP server for to-do items with attachments")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "tasklist.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = Path::new(&cli.config);
    if !config_path.exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }
    let config = TasklistConfig::load(config_path)?;

    let storage = store_factory::create_storage(&config.storage).await?;
    info!(backend = %config.storage.backend, "storage initialized");

    let state = AppState::new(
        storage.items.clone(),
        storage.blobs.clone(),
        &config.uploads,
    );
    let app = api::router(state, &config.cors);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, max_upload_bytes = config.uploads.max_bytes, "tasklist-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    if tokio::time::timeout(shutdown_timeout, storage.shutdown())
        .await
        .is_err()
    {
        warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded while closing storage"
        );
    }

    info!("tasklist-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
