//! Outcome Router inspector service.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                 OUTCOME ROUTER                   │
//!                     │                                                  │
//!   Inspect request   │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!   ──────────────────┼─▶│  http   │───▶│ handler  │───▶│  routing   │   │
//!                     │  │ server  │    │ registry │    │  resolver  │   │
//!                     │  └─────────┘    └────┬─────┘    └────────────┘   │
//!                     │                      │                           │
//!                     │                      ▼                           │
//!   JSON report       │                ┌────────────┐                    │
//!   ◀─────────────────┼────────────────│ navigation │                    │
//!                     │                │   engine   │                    │
//!                     │                └────────────┘                    │
//!                     │                                                  │
//!                     │  ┌─────────────────────────────────────────┐     │
//!                     │  │ config (TOML, watcher) │ observability  │     │
//!                     │  └─────────────────────────────────────────┘     │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use outcome_router::config::{load_config, ConfigWatcher};
use outcome_router::observability::{logging, metrics};
use outcome_router::InspectorServer;

#[derive(Parser)]
#[command(name = "outcome-router", about = "Dry-run route and navigation inspector")]
struct Args {
    /// Declaration file
    #[arg(env = "OUTCOME_ROUTER_CONFIG", default_value = "router.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init(&config.observability.log_level);
    tracing::info!("outcome-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = ?args.config,
        handlers = config.handlers.len(),
        modules = config.modules.len(),
        bind_address = %config.server.bind_address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = config.build_registry()?;
    registry.warm()?;
    let server = InspectorServer::new(registry, &config.server);

    let _watcher = if config.server.watch {
        let (watcher, updates) = ConfigWatcher::new(&args.config);
        server.spawn_reloader(updates);
        Some(watcher.run()?)
    } else {
        None
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
