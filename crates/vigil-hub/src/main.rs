//! # Vigil Hub Binary
//!
//! Startup sequence:
//!
//! 1. Install the tracing subscriber (`RUST_LOG` controls the filter)
//! 2. Load configuration from the TOML path in argv\[1\], or defaults
//! 3. Seed configured monitored targets into the storage gateway
//! 4. Spawn the dispatch scheduler and probe sweeper
//! 5. Serve validator WebSocket connections until failure

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vigil_hub::{serve, HubConfig, HubService, InMemoryStorage, WsTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => HubConfig::from_toml_file(Path::new(&path))
            .with_context(|| format!("loading config from {path}"))?,
        None => HubConfig::default(),
    };
    config.validate().context("invalid configuration")?;

    let storage = Arc::new(InMemoryStorage::new());
    for url in &config.monitored_targets {
        let target = storage.seed_target(url);
        info!(target_id = %target.id, url = %url, "Seeded monitored target");
    }

    let addr = config.listen_addr();
    let transport = Arc::new(WsTransport::new());
    let service = Arc::new(HubService::new(config, storage, Arc::clone(&transport)));

    let _background = service.spawn_background_tasks();

    serve(service, transport, addr)
        .await
        .context("hub transport failed")?;
    Ok(())
}
