//! Application state module
//!
//! Contains the state shared between the world loop and the rest of the server.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::info;

use crate::config::ServerConfig;
use crate::game::pickup::PickupCatalog;
use crate::game::world::GameWorld;

/// Application state shared across tasks
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Pickup catalog, bound once at startup
    pub catalog: Arc<PickupCatalog>,
    /// Game world state
    pub world: Mutex<GameWorld>,
    /// Shutdown signal sender
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    /// Create the application state from an already bound catalog
    pub fn new(
        config: ServerConfig,
        catalog: Arc<PickupCatalog>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        let world = GameWorld::with_settings(config.world_settings(), Arc::clone(&catalog));

        Self {
            config,
            catalog,
            world: Mutex::new(world),
            shutdown_tx,
        }
    }

    /// Receiver for the shutdown broadcast
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal every subscribed task to stop
    pub fn shutdown(&self) {
        let receivers = self.shutdown_tx.send(()).unwrap_or(0);
        info!(receivers = receivers, "Shutdown signalled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pickup::{PickupKind, Placement};
    use crate::game::world::WorldState;

    #[test]
    fn test_state_shares_catalog() {
        let catalog = Arc::new(PickupCatalog::builtin().unwrap());
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = AppState::new(ServerConfig::default(), Arc::clone(&catalog), shutdown_tx);

        assert!(Arc::ptr_eq(state.world.lock().catalog(), &catalog));
        assert_eq!(state.world.lock().settings.world_id, 1);

        let id = state
            .world
            .lock()
            .spawn_pickup(PickupKind::Shield, Placement::at(4.0, 4.0))
            .unwrap();
        assert!(state.world.lock().stage().contains(id));
    }

    #[test]
    fn test_shutdown_reaches_subscribers() {
        let catalog = Arc::new(PickupCatalog::builtin().unwrap());
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = AppState::new(ServerConfig::default(), catalog, shutdown_tx);

        let mut first = state.subscribe_shutdown();
        let mut second = state.subscribe_shutdown();
        state.shutdown();

        assert!(first.try_recv().is_ok());
        assert!(second.try_recv().is_ok());
    }

    #[test]
    fn test_shutdown_without_subscribers() {
        let catalog = Arc::new(PickupCatalog::builtin().unwrap());
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = AppState::new(ServerConfig::default(), catalog, shutdown_tx);

        // no receivers left; must not panic
        state.shutdown();
    }

    #[tokio::test]
    async fn test_world_loop_stops_via_state() {
        let catalog = Arc::new(PickupCatalog::builtin().unwrap());
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = AppState::new(ServerConfig::default(), catalog, shutdown_tx);

        let mut shutdown_rx = state.subscribe_shutdown();
        state.shutdown();
        GameWorld::run(&state.world, &mut shutdown_rx).await;

        assert_eq!(state.world.lock().state(), WorldState::Stopped);
        assert_eq!(state.catalog.len(), 15);
    }
}
