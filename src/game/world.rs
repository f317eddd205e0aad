//! World module
//!
//! Manages the arena including:
//! - Game tick loop
//! - Pickup spawning, collection and despawning
//! - Player registration
//! - Stage events drained once per tick for broadcast

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::error::{GameError, PickupError, QuiverError, Result};
use crate::game::pickup::{
    EffectContext, EffectTarget, PickupCatalog, PickupId, PickupInstance, PickupKind, Placement,
};
use crate::game::player::{PlayerManager, MAX_PLAYER_INDEX};
use crate::game::stage::{Stage, StageEvent, StageState, DEFAULT_SLOW_MOTION_TICKS};

/// Standard game tick rate in milliseconds (20 ticks per second)
pub const TICK_RATE_MS: u64 = 50;

/// Default players per arena
pub const MAX_PLAYERS: u16 = 8;

/// World settings
#[derive(Debug, Clone)]
pub struct WorldSettings {
    /// World ID, also used as the stage id
    pub world_id: u32,
    /// World name
    pub name: String,
    /// Tick rate in milliseconds
    pub tick_rate_ms: u64,
    /// Maximum players allowed
    pub max_players: u16,
    /// Slow motion duration in ticks
    pub slow_motion_ticks: u64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            world_id: 1,
            name: "Quiver".to_string(),
            tick_rate_ms: TICK_RATE_MS,
            max_players: MAX_PLAYERS,
            slow_motion_ticks: DEFAULT_SLOW_MOTION_TICKS,
        }
    }
}

impl WorldSettings {
    /// Create new world settings with a specific ID
    pub fn new(world_id: u32) -> Self {
        Self {
            world_id,
            ..Default::default()
        }
    }

    /// Set the world name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tick_rate_ms(mut self, tick_rate_ms: u64) -> Self {
        self.tick_rate_ms = tick_rate_ms;
        self
    }

    pub fn with_max_players(mut self, max_players: u16) -> Self {
        self.max_players = max_players;
        self
    }

    pub fn with_slow_motion_ticks(mut self, ticks: u64) -> Self {
        self.slow_motion_ticks = ticks;
        self
    }
}

/// World state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldState {
    /// World is initializing (map setup may spawn pickups)
    Initializing,
    /// World is running normally
    Running,
    /// World is shutting down
    ShuttingDown,
    /// World has stopped
    Stopped,
}

impl WorldState {
    /// Check if the world accepts spawns and collections
    pub fn accepting_pickups(&self) -> bool {
        matches!(self, WorldState::Initializing | WorldState::Running)
    }

    /// Check if the world is processing ticks
    pub fn is_active(&self) -> bool {
        matches!(self, WorldState::Running)
    }
}

/// Game world - owns the stage, live pickups and players
pub struct GameWorld {
    /// World settings
    pub settings: WorldSettings,
    /// Current world state
    state: WorldState,
    /// Current tick number
    tick: u64,
    /// Time the world started
    start_time: Option<Instant>,
    /// The arena's pickup collection and slow motion
    stage: StageState,
    /// Live pickup instances by id
    pickups: HashMap<PickupId, PickupInstance>,
    /// Player manager
    pub players: PlayerManager,
    /// Shared pickup catalog
    catalog: Arc<PickupCatalog>,
    /// Next pickup id to hand out
    next_pickup_id: PickupId,
}

impl GameWorld {
    /// Create a new game world with default settings
    pub fn new(world_id: u32, catalog: Arc<PickupCatalog>) -> Self {
        Self::with_settings(WorldSettings::new(world_id), catalog)
    }

    /// Create a new game world with custom settings
    pub fn with_settings(mut settings: WorldSettings, catalog: Arc<PickupCatalog>) -> Self {
        // the tick interval needs a non-zero period
        settings.tick_rate_ms = settings.tick_rate_ms.max(1);

        info!(
            world_id = settings.world_id,
            name = %settings.name,
            "Creating game world"
        );

        let max_players = settings.max_players.min(MAX_PLAYER_INDEX);

        Self {
            stage: StageState::new(settings.world_id, settings.slow_motion_ticks),
            settings,
            state: WorldState::Initializing,
            tick: 0,
            start_time: None,
            pickups: HashMap::new(),
            players: PlayerManager::new(max_players),
            catalog,
            next_pickup_id: 1,
        }
    }

    /// Get the current world state
    pub fn state(&self) -> WorldState {
        self.state
    }

    /// Set the world state
    pub fn set_state(&mut self, new_state: WorldState) {
        let old_state = self.state;
        self.state = new_state;
        info!(
            old_state = ?old_state,
            new_state = ?new_state,
            "World state changed"
        );
    }

    /// Get the current tick number
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Get the uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    pub fn stage(&self) -> &StageState {
        &self.stage
    }

    pub fn catalog(&self) -> &Arc<PickupCatalog> {
        &self.catalog
    }

    pub fn pickup(&self, id: PickupId) -> Option<&PickupInstance> {
        self.pickups.get(&id)
    }

    /// Number of live pickups
    pub fn pickup_count(&self) -> usize {
        self.pickups.len()
    }

    /// Register a player in the arena
    pub fn join(&mut self, username: &str) -> Result<u16> {
        if self.players.is_full() {
            return Err(GameError::WorldFull.into());
        }
        self.players.register(username)
    }

    /// Remove a player from the arena
    pub fn leave(&mut self, index: u16) {
        self.players.unregister(index);
    }

    fn ensure_accepting(&self) -> Result<()> {
        if !self.state.accepting_pickups() {
            return Err(GameError::WorldNotReady.into());
        }
        Ok(())
    }

    /// Build a pickup of `kind` through the catalog and register it on the stage
    pub fn spawn_pickup(&mut self, kind: PickupKind, placement: Placement) -> Result<PickupId> {
        self.ensure_accepting()?;

        let id = self.next_pickup_id;
        self.next_pickup_id += 1;

        let mut pickup = self.catalog.build(&mut self.stage, id, kind, placement);
        pickup.register(&mut self.stage)?;
        self.pickups.insert(id, pickup);

        debug!(id = id, kind = kind.name(), x = placement.x, y = placement.y, "Spawned pickup");
        Ok(id)
    }

    /// Apply a pickup on behalf of a player, then remove it from the world
    ///
    /// Player-targeted effects go to the collecting player; world-targeted
    /// effects go to the stage.
    pub fn collect_pickup(&mut self, pickup_id: PickupId, player_index: u16) -> Result<PickupKind> {
        self.ensure_accepting()?;

        if self.players.get(player_index).is_none() {
            return Err(GameError::PlayerNotFound(player_index).into());
        }

        let pickup = self
            .pickups
            .get_mut(&pickup_id)
            .ok_or(PickupError::NotFound(pickup_id))?;

        let context = match pickup.descriptor().target() {
            EffectTarget::World => EffectContext::World(&mut self.stage),
            EffectTarget::Player | EffectTarget::None => {
                let player = self
                    .players
                    .get_mut(player_index)
                    .ok_or(GameError::PlayerNotFound(player_index))?;
                EffectContext::Player(player)
            }
        };

        pickup.apply(context)?;
        pickup.remove(&mut self.stage)?;

        let kind = pickup.kind();
        self.pickups.remove(&pickup_id);

        info!(
            id = pickup_id,
            kind = kind.name(),
            player = player_index,
            "Pickup collected"
        );
        Ok(kind)
    }

    /// Remove a pickup without applying it
    pub fn despawn_pickup(&mut self, pickup_id: PickupId) -> Result<()> {
        let mut pickup = self
            .pickups
            .remove(&pickup_id)
            .ok_or(QuiverError::Pickup(PickupError::NotFound(pickup_id)))?;

        pickup.remove(&mut self.stage)?;
        debug!(id = pickup_id, kind = pickup.kind().name(), "Despawned pickup");
        Ok(())
    }

    /// Despawn every live pickup (round end or shutdown)
    pub fn despawn_all(&mut self) {
        let mut ids: Vec<PickupId> = self.pickups.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            if let Err(e) = self.despawn_pickup(id) {
                warn!(id = id, error = %e, "Failed to despawn pickup");
            }
        }
    }

    /// Process a single game tick, returning the events to broadcast
    pub fn process_tick(&mut self) -> Vec<StageEvent> {
        self.tick += 1;
        self.stage.process_tick();
        let events = self.stage.drain_events();

        trace!(tick = self.tick, events = events.len(), "Processed tick");

        if self.tick % 1000 == 0 {
            debug!(
                tick = self.tick,
                players = self.players.count(),
                pickups = self.pickups.len(),
                "Game tick milestone"
            );
        }

        events
    }

    /// Run the world tick loop until shutdown is signalled
    ///
    /// The lock is taken once per tick and never held across an await.
    pub async fn run(world: &Mutex<GameWorld>, shutdown_rx: &mut broadcast::Receiver<()>) {
        let tick_rate_ms = {
            let mut world = world.lock();
            info!(
                world_id = world.settings.world_id,
                tick_rate_ms = world.settings.tick_rate_ms,
                "Starting game world"
            );
            world.start_time = Some(Instant::now());
            world.set_state(WorldState::Running);
            world.settings.tick_rate_ms
        };

        let mut tick_interval = interval(Duration::from_millis(tick_rate_ms));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let mut world = world.lock();
                    if !world.state().is_active() {
                        break;
                    }

                    let events = world.process_tick();
                    if !events.is_empty() {
                        debug!(tick = world.tick(), events = events.len(), "Stage events pending broadcast");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        let mut world = world.lock();
        world.set_state(WorldState::ShuttingDown);
        world.despawn_all();
        world.stage.drain_events();
        world.set_state(WorldState::Stopped);

        info!(
            total_ticks = world.tick(),
            uptime_secs = world.uptime_secs(),
            "Game world stopped"
        );
    }

    /// Get world info as a string
    pub fn info(&self) -> String {
        format!(
            "World {} ({}) - {} players - {} pickups - Tick {} - Uptime {}s",
            self.settings.world_id,
            self.settings.name,
            self.players.count(),
            self.pickups.len(),
            self.tick,
            self.uptime_secs()
        )
    }
}

impl std::fmt::Debug for GameWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameWorld")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("tick", &self.tick)
            .field("players", &self.players.count())
            .field("pickups", &self.pickups.len())
            .field("slowed", &self.stage.is_time_slowed())
            .field("uptime_secs", &self.uptime_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pickup::PickupState;
    use crate::game::player::PlayerBuffs;
    use crate::protocol::{EquipmentType, ProjectileType};

    fn world() -> GameWorld {
        let catalog = Arc::new(PickupCatalog::builtin().unwrap());
        GameWorld::with_settings(WorldSettings::new(1).with_slow_motion_ticks(5), catalog)
    }

    #[test]
    fn test_world_settings_builder() {
        let settings = WorldSettings::new(5)
            .with_name("Test Arena")
            .with_tick_rate_ms(20)
            .with_max_players(4);

        assert_eq!(settings.world_id, 5);
        assert_eq!(settings.name, "Test Arena");
        assert_eq!(settings.tick_rate_ms, 20);
        assert_eq!(settings.max_players, 4);
        assert_eq!(settings.slow_motion_ticks, DEFAULT_SLOW_MOTION_TICKS);
    }

    #[test]
    fn test_world_state() {
        let mut world = world();
        assert_eq!(world.state(), WorldState::Initializing);
        assert!(world.state().accepting_pickups());
        assert!(!world.state().is_active());

        world.set_state(WorldState::Running);
        assert!(world.state().is_active());

        world.set_state(WorldState::Stopped);
        assert!(!world.state().accepting_pickups());
    }

    #[test]
    fn test_spawn_registers_on_stage() {
        let mut world = world();
        let a = world.spawn_pickup(PickupKind::Wing, Placement::at(1.0, 1.0)).unwrap();
        let b = world.spawn_pickup(PickupKind::IceArrow, Placement::at(2.0, 2.0)).unwrap();

        assert_ne!(a, b);
        assert_eq!(world.stage().pickup_ids(), vec![a, b]);
        assert_eq!(world.pickup(a).unwrap().state(), PickupState::Registered);
    }

    #[test]
    fn test_collect_player_pickup() {
        let mut world = world();
        let player = world.join("archer").unwrap();
        let id = world.spawn_pickup(PickupKind::BoltArrow, Placement::at(0.0, 0.0)).unwrap();

        let kind = world.collect_pickup(id, player).unwrap();
        assert_eq!(kind, PickupKind::BoltArrow);
        assert!(world.pickup(id).is_none());
        assert!(!world.stage().contains(id));

        let player = world.players.get(player).unwrap();
        assert_eq!(player.arrow_type(), ProjectileType(4));
        assert_eq!(player.reload_count(), 1);
    }

    #[test]
    fn test_collect_dagger_equips() {
        let mut world = world();
        let player = world.join("archer").unwrap();
        let id = world.spawn_pickup(PickupKind::Dagger, Placement::at(0.0, 0.0)).unwrap();

        world.collect_pickup(id, player).unwrap();
        assert_eq!(world.players.get(player).unwrap().equip(), EquipmentType(1));
    }

    #[test]
    fn test_collect_time_orb_slows_world() {
        let mut world = world();
        let player = world.join("archer").unwrap();
        let id = world.spawn_pickup(PickupKind::TimeOrb, Placement::at(0.0, 0.0)).unwrap();

        world.collect_pickup(id, player).unwrap();
        assert!(world.stage().is_time_slowed());
        assert!(world.players.get(player).unwrap().buffs().is_empty());

        // a second orb toggles slow motion off
        let id = world.spawn_pickup(PickupKind::TimeOrb, Placement::at(0.0, 0.0)).unwrap();
        world.collect_pickup(id, player).unwrap();
        assert!(!world.stage().is_time_slowed());
    }

    #[test]
    fn test_collect_soul_has_no_effect() {
        let mut world = world();
        let player = world.join("archer").unwrap();
        let id = world.spawn_pickup(PickupKind::Soul, Placement::at(0.0, 0.0)).unwrap();

        assert_eq!(world.collect_pickup(id, player).unwrap(), PickupKind::Soul);
        let player = world.players.get(player).unwrap();
        assert!(player.buffs().is_empty());
        assert_eq!(player.reload_count(), 0);
    }

    #[test]
    fn test_collect_twice_not_found() {
        let mut world = world();
        let player = world.join("archer").unwrap();
        let id = world.spawn_pickup(PickupKind::Shield, Placement::at(0.0, 0.0)).unwrap();

        world.collect_pickup(id, player).unwrap();
        let err = world.collect_pickup(id, player).unwrap_err();
        assert!(matches!(err, QuiverError::Pickup(PickupError::NotFound(n)) if n == id));

        assert_eq!(world.players.get(player).unwrap().buffs(), PlayerBuffs::SHIELD);
    }

    #[test]
    fn test_collect_unknown_player() {
        let mut world = world();
        let id = world.spawn_pickup(PickupKind::Shield, Placement::at(0.0, 0.0)).unwrap();

        let err = world.collect_pickup(id, 9).unwrap_err();
        assert!(matches!(err, QuiverError::Game(GameError::PlayerNotFound(9))));
        // the pickup stays available
        assert!(world.stage().contains(id));
    }

    #[test]
    fn test_despawn() {
        let mut world = world();
        let id = world.spawn_pickup(PickupKind::Boots, Placement::at(0.0, 0.0)).unwrap();
        world.process_tick();

        world.despawn_pickup(id).unwrap();
        assert_eq!(world.pickup_count(), 0);
        assert_eq!(world.stage().count(), 0);

        let events = world.process_tick();
        assert!(matches!(
            events.as_slice(),
            [StageEvent::PickupUpdated { state: PickupState::Removed, .. }]
        ));

        assert!(world.despawn_pickup(id).is_err());
    }

    #[test]
    fn test_slow_motion_expires_with_ticks() {
        let mut world = world();
        let player = world.join("archer").unwrap();
        let id = world.spawn_pickup(PickupKind::TimeOrb, Placement::at(0.0, 0.0)).unwrap();
        world.collect_pickup(id, player).unwrap();
        world.process_tick();

        for _ in 0..3 {
            assert!(world.process_tick().is_empty());
        }
        assert_eq!(world.process_tick(), vec![StageEvent::SlowMotionEnded]);
        assert!(!world.stage().is_time_slowed());
    }

    #[test]
    fn test_stopped_world_rejects_spawn() {
        let mut world = world();
        world.set_state(WorldState::Stopped);
        let err = world.spawn_pickup(PickupKind::Soul, Placement::at(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, QuiverError::Game(GameError::WorldNotReady)));
    }

    #[test]
    fn test_join_full_world() {
        let catalog = Arc::new(PickupCatalog::builtin().unwrap());
        let mut world = GameWorld::with_settings(WorldSettings::new(1).with_max_players(1), catalog);
        world.join("a").unwrap();
        assert!(matches!(
            world.join("b").unwrap_err(),
            QuiverError::Game(GameError::WorldFull)
        ));
    }

    #[test]
    fn test_world_info() {
        let world = world();
        let info = world.info();
        assert!(info.contains("World 1"));
        assert!(info.contains("Quiver"));
    }

    #[test]
    fn test_zero_tick_rate_clamped() {
        let catalog = Arc::new(PickupCatalog::builtin().unwrap());
        let world = GameWorld::with_settings(WorldSettings::new(1).with_tick_rate_ms(0), catalog);
        assert_eq!(world.settings.tick_rate_ms, 1);
    }

    #[tokio::test]
    async fn test_run_with_zero_tick_rate() {
        let catalog = Arc::new(PickupCatalog::builtin().unwrap());
        let world = Mutex::new(GameWorld::with_settings(
            WorldSettings::new(1).with_tick_rate_ms(0),
            catalog,
        ));

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        shutdown_tx.send(()).unwrap();

        GameWorld::run(&world, &mut shutdown_rx).await;
        assert_eq!(world.lock().state(), WorldState::Stopped);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let world = Mutex::new(world());
        world
            .lock()
            .spawn_pickup(PickupKind::Wing, Placement::at(0.0, 0.0))
            .unwrap();

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        shutdown_tx.send(()).unwrap();

        GameWorld::run(&world, &mut shutdown_rx).await;

        let world = world.lock();
        assert_eq!(world.state(), WorldState::Stopped);
        assert_eq!(world.pickup_count(), 0);
        assert_eq!(world.stage().count(), 0);
    }
}
