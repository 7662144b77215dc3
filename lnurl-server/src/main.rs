//! LNURL-pay HTTP server backed by LND.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p lnurl-server --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p lnurl-server
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p lnurl-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG`: path to TOML configuration file (default: `config.toml`)
//! - `HOST`: override bind address (default: `0.0.0.0`)
//! - `PORT`: override port (default: `8080`)
//! - `RUST_LOG`: log level filter (default: `info`)
//!
//! A `.env` file in the working directory is loaded first.

use std::net::SocketAddr;
use std::sync::Arc;

use lnurl::PayService;
use lnurl::backend::LightningBackend;
use lnurl_lnd::LndRestClient;
use tokio_util::task::TaskTracker;
use tracing_subscriber::EnvFilter;

use lnurl_server::config::ServerConfig;
use lnurl_server::util::SigDown;
use lnurl_server::{ServiceState, app, sweeper};

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    if let Err(e) = run().await {
        tracing::error!("lnurl-server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        public_url = %config.service.base_url(),
        min_sendable = config.service.min_sendable,
        max_sendable = config.service.max_sendable,
        ttl_secs = config.commitments.ttl_secs,
        "Loaded configuration"
    );

    let lnd = LndRestClient::try_new(&config.lnd)?;
    let alias = lnd.node_alias().await?;
    tracing::info!(alias = %alias, rest_url = lnd.base_url(), "Connected to LND");

    let state: ServiceState = Arc::new(PayService::new(config.service.clone(), Arc::new(lnd))?);

    let codes = state.static_codes()?;
    tracing::info!(lnurl = %codes.lnurl, "Static LNURL");
    tracing::info!(uri = %codes.lightning_uri, "Lightning URI");
    tracing::info!(url = %codes.lnurlp, "LUD-17 URL");
    tracing::info!(address = %codes.address, "Lightning address");

    let sig_down = SigDown::try_new()?;
    let shutdown = sig_down.cancellation_token();

    let tasks = TaskTracker::new();
    tasks.spawn(sweeper::run(
        Arc::clone(&state),
        config.commitments.ttl(),
        config.commitments.sweep_interval(),
        shutdown.clone(),
    ));
    tasks.close();

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    let served = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await;

    // The server may exit on its own; release the sweeper and signal listener.
    sig_down.trigger();
    sig_down.recv().await;
    tasks.wait().await;
    served?;

    tracing::info!("Shut down gracefully");
    Ok(())
}
