//! Identity Router
//!
//! Serves a virtual location from per-user directories chosen by database
//! table membership.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                 IDENTITY ROUTER                  │
//!                       │                                                  │
//!   Client Request      │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!   ────────────────────┼─▶│  http   │───▶│ resolver │───▶│  rewriter  │   │
//!   (x-remote-user)     │  │ server  │    │          │    │            │   │
//!                       │  └─────────┘    └────┬─────┘    └─────┬──────┘   │
//!                       │                      │                │          │
//!                       │                      ▼                ▼          │
//!                       │               ┌────────────┐   ┌────────────┐    │
//!                       │               │   store    │   │  ServeDir  │    │
//!                       │               │ (sqlx Any) │   │ (doc root) │    │
//!                       │               └────────────┘   └─────┬──────┘    │
//!   Client Response     │                                      │           │
//!   ◀───────────────────┼──────────────────────────────────────┘           │
//!   (301 or content)    │                                                  │
//!                       │  config · observability · resilience · lifecycle │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use identity_router::config::load_config;
use identity_router::config::watcher::ConfigWatcher;
use identity_router::lifecycle::signals::shutdown_on_signal;
use identity_router::observability::{logging, metrics};
use identity_router::store::SqlStore;
use identity_router::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(
    name = "identity-router",
    version,
    about = "Serve a virtual location from per-user directories"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "identity-router.toml")]
    config: PathBuf,

    /// Do not watch the configuration file for changes
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init_logging(config.observability.log_format);

    tracing::info!("identity-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = ?cli.config,
        bind_address = %config.listener.bind_address,
        location = %config.rewrite.location,
        document_root = ?config.rewrite.document_root,
        resolve_timeout_ms = config.timeouts.resolve_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address parses.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let store = Arc::new(SqlStore::connect(&config.database).await?);

    let (watcher, config_updates) = ConfigWatcher::new(&cli.config);
    let _watcher = if cli.no_watch {
        None
    } else {
        match watcher.run() {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                None
            }
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, store.clone())?;

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move { shutdown_on_signal(&signal_shutdown).await });

    server.run(listener, config_updates, server_shutdown).await?;
    store.close().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
