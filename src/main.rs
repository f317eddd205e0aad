//! Quiver Game Server
//!
//! Arena server for a multiplayer archery game. Binds the pickup catalog to
//! the protocol schema at startup and runs the world tick loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use quiver_server::config::ServerConfig;
use quiver_server::game::constants::ConstantsTable;
use quiver_server::game::pickup::{CatalogView, PickupCatalog};
use quiver_server::game::world::GameWorld;
use quiver_server::protocol::ProtocolSchema;
use quiver_server::state::AppState;
use quiver_server::VERSION;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    dotenv::dotenv().ok();

    // Initialize logging
    init_logging();

    info!("Quiver Game Server v{}", VERSION);

    // Load configuration
    let config = ServerConfig::load().await?;
    info!(
        "Configuration loaded from: {}",
        config.config_path.display()
    );

    // Bind the pickup catalog; any mismatch with the schema is fatal
    let schema = ProtocolSchema::load(&config.schema_path).with_context(|| {
        format!("Failed to load protocol schema: {}", config.schema_path.display())
    })?;
    let constants = ConstantsTable::load(&config.constants_path).with_context(|| {
        format!("Failed to load constants: {}", config.constants_path.display())
    })?;
    let catalog = Arc::new(
        PickupCatalog::load(&schema, &constants).context("Failed to bind pickup catalog")?,
    );

    // Create shutdown channel
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let state = Arc::new(AppState::new(config, catalog, shutdown_tx));
    info!("Application state initialized");

    log_catalog(&state);

    // Start the game world tick
    let world_state = state.clone();
    let mut world_shutdown_rx = state.subscribe_shutdown();
    let world_handle = tokio::spawn(async move {
        GameWorld::run(&world_state.world, &mut world_shutdown_rx).await;
    });

    info!("Server startup complete!");
    info!("World {} is ready", state.config.world_id);

    // Wait for shutdown signal
    wait_for_shutdown(&state).await;

    info!("Shutting down server...");

    if let Err(e) = world_handle.await {
        error!("World task failed: {}", e);
    }

    info!("{}", state.world.lock().info());
    info!("Server shutdown complete. Goodbye!");
    Ok(())
}

/// Initialize the logging/tracing system
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quiver_server=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();
}

/// Log the bound catalog and its views
fn log_catalog(state: &AppState) {
    let catalog = &state.catalog;

    info!(schema_hash = %catalog.schema_hash(), "Protocol schema bound");
    for view in [
        CatalogView::Collectible,
        CatalogView::Arrows,
        CatalogView::Powerups,
        CatalogView::MeleeWeapons,
    ] {
        let names: Vec<&str> = catalog.view(view).iter().map(|d| d.name()).collect();
        info!(view = %view, count = names.len(), pickups = ?names, "Catalog view");
    }

    if state.config.debug {
        for descriptor in catalog.all() {
            debug!(
                kind = descriptor.name(),
                type_id = descriptor.type_id().as_u8(),
                category = descriptor.category().as_str(),
                width = descriptor.dimensions().width,
                height = descriptor.dimensions().height,
                target = descriptor.target().as_str(),
                "Pickup descriptor"
            );
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn wait_for_shutdown(state: &AppState) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Signal all tasks to shut down
    state.shutdown();
}
