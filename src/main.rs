//! tiny-http-server: a minimal HTTP/1.1 server
//!
//! Serves a fixed set of routes over persistent TCP connections, framing
//! requests by hand from the raw byte stream:
//! - `/` and `/user-agent` probes
//! - `/echo/<text>` with optional gzip response encoding
//! - `/files/<name>` download (GET) and upload (POST) under a root directory
//!
//! Configuration via CLI arguments or TOML file.

mod buffer;
mod config;
mod connection;
mod http;
mod server;

use config::Config;
use server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        directory = ?config.directory,
        workers = ?config.workers,
        max_connections = config.max_connections,
        "Starting tiny-http-server"
    );

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.workers {
        builder.worker_threads(workers);
    }
    let runtime = builder.enable_all().build()?;

    runtime.block_on(run(config))
}

/// Serve until the listener fails or the process is interrupted.
async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server = Server::new(config);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
