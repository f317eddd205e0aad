//! Player module
//!
//! Manages player entities and the capability slots pickups write to:
//! - Active projectile type and ammo
//! - Melee equipment slot
//! - Buff flags (haste, shield, wings, ...)
//! - Player index allocation and lookup

use std::collections::{BTreeMap, HashMap};

use bitflags::bitflags;
use tracing::{debug, info};

use crate::error::{GameError, Result, QuiverError};
use crate::protocol::{EquipmentType, ProjectileType};

/// Maximum player index value
pub const MAX_PLAYER_INDEX: u16 = 64;

/// Arrows held after a reload
pub const MAX_AMMO: u8 = 3;

bitflags! {
    /// Buffs currently active on a player
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PlayerBuffs: u8 {
        /// Faster movement
        const HASTE = 1 << 0;
        /// Two projectiles per shot
        const DOUBLE_SHOT = 1 << 1;
        /// Hidden from other players
        const INVISIBLE = 1 << 2;
        /// Dart orbiting the player
        const ROTATING_DART = 1 << 3;
        /// Absorbs one hit
        const SHIELD = 1 << 4;
        /// Flight and glide
        const WING = 1 << 5;
    }
}

impl Default for PlayerBuffs {
    fn default() -> Self {
        Self::empty()
    }
}

/// Capability slots a pickup effect may write to
///
/// Anything collecting pickups must provide every slot; the compiler rules
/// out targets that lack one.
pub trait PlayerCapabilities {
    fn set_arrow_type(&mut self, projectile: ProjectileType);
    fn reload_ammo(&mut self);
    fn set_equip(&mut self, equipment: EquipmentType);
    fn add_haste(&mut self);
    fn add_double_shot(&mut self);
    fn add_invisible(&mut self);
    fn add_rotating_dart(&mut self);
    fn add_shield(&mut self);
    fn add_wing(&mut self);
}

/// A player entity in the game
pub struct Player {
    /// Player index (1-64)
    pub index: u16,
    /// Username
    pub username: String,
    arrow_type: ProjectileType,
    ammo: u8,
    equip: EquipmentType,
    buffs: PlayerBuffs,
    reload_count: u32,
}

impl Player {
    /// Create a new player with the default arrow and no buffs
    pub fn new(index: u16, username: impl Into<String>) -> Self {
        Self {
            index,
            username: username.into(),
            arrow_type: ProjectileType::default(),
            ammo: MAX_AMMO,
            equip: EquipmentType::default(),
            buffs: PlayerBuffs::empty(),
            reload_count: 0,
        }
    }

    pub fn arrow_type(&self) -> ProjectileType {
        self.arrow_type
    }

    pub fn ammo(&self) -> u8 {
        self.ammo
    }

    /// Spend one arrow, returning false when the quiver is empty
    pub fn fire(&mut self) -> bool {
        if self.ammo == 0 {
            return false;
        }
        self.ammo -= 1;
        true
    }

    pub fn equip(&self) -> EquipmentType {
        self.equip
    }

    pub fn buffs(&self) -> PlayerBuffs {
        self.buffs
    }

    /// Number of reloads since the player spawned
    pub fn reload_count(&self) -> u32 {
        self.reload_count
    }

    /// Drop every buff and restore the default loadout (on death or respawn)
    pub fn reset(&mut self) {
        self.arrow_type = ProjectileType::default();
        self.ammo = MAX_AMMO;
        self.equip = EquipmentType::default();
        self.buffs = PlayerBuffs::empty();
        debug!(index = self.index, "Player loadout reset");
    }

    fn grant(&mut self, buff: PlayerBuffs) {
        self.buffs.insert(buff);
        debug!(index = self.index, buffs = ?self.buffs, "Buff granted");
    }
}

impl PlayerCapabilities for Player {
    fn set_arrow_type(&mut self, projectile: ProjectileType) {
        self.arrow_type = projectile;
        debug!(index = self.index, arrow = projectile.as_u8(), "Arrow type changed");
    }

    fn reload_ammo(&mut self) {
        self.ammo = MAX_AMMO;
        self.reload_count += 1;
    }

    fn set_equip(&mut self, equipment: EquipmentType) {
        self.equip = equipment;
        debug!(index = self.index, equip = equipment.as_u8(), "Equipment changed");
    }

    fn add_haste(&mut self) {
        self.grant(PlayerBuffs::HASTE);
    }

    fn add_double_shot(&mut self) {
        self.grant(PlayerBuffs::DOUBLE_SHOT);
    }

    fn add_invisible(&mut self) {
        self.grant(PlayerBuffs::INVISIBLE);
    }

    fn add_rotating_dart(&mut self) {
        self.grant(PlayerBuffs::ROTATING_DART);
    }

    fn add_shield(&mut self) {
        self.grant(PlayerBuffs::SHIELD);
    }

    fn add_wing(&mut self) {
        self.grant(PlayerBuffs::WING);
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("index", &self.index)
            .field("username", &self.username)
            .field("arrow_type", &self.arrow_type)
            .field("ammo", &self.ammo)
            .field("equip", &self.equip)
            .field("buffs", &self.buffs)
            .finish()
    }
}

/// Player manager - handles player lifecycle and indexing
pub struct PlayerManager {
    /// Map of player index to player
    players: BTreeMap<u16, Player>,
    /// Map of username to player index
    username_to_index: HashMap<String, u16>,
    /// Next available player index
    next_index: u16,
    /// Maximum player count
    max_players: u16,
}

impl PlayerManager {
    /// Create a new player manager
    pub fn new(max_players: u16) -> Self {
        Self {
            players: BTreeMap::new(),
            username_to_index: HashMap::new(),
            next_index: 1, // Index 0 is reserved
            max_players: max_players.clamp(1, MAX_PLAYER_INDEX),
        }
    }

    /// Register a new player
    pub fn register(&mut self, username: impl Into<String>) -> Result<u16> {
        let username = username.into();
        let key = username.to_lowercase();

        if self.username_to_index.contains_key(&key) {
            return Err(QuiverError::Game(GameError::PlayerAlreadyRegistered(
                username,
            )));
        }

        let index = self.allocate_index()?;
        self.players.insert(index, Player::new(index, username.clone()));
        self.username_to_index.insert(key, index);

        info!(index = index, username = %username, "Player registered");

        Ok(index)
    }

    /// Unregister a player
    pub fn unregister(&mut self, index: u16) {
        if let Some(player) = self.players.remove(&index) {
            self.username_to_index
                .remove(&player.username.to_lowercase());

            info!(
                index = index,
                username = %player.username,
                "Player unregistered"
            );
        }
    }

    /// Get a player by index
    pub fn get(&self, index: u16) -> Option<&Player> {
        self.players.get(&index)
    }

    pub fn get_mut(&mut self, index: u16) -> Option<&mut Player> {
        self.players.get_mut(&index)
    }

    /// Get a player by username
    pub fn get_by_username(&self, username: &str) -> Option<&Player> {
        self.username_to_index
            .get(&username.to_lowercase())
            .and_then(|idx| self.get(*idx))
    }

    /// Get the player count
    pub fn count(&self) -> usize {
        self.players.len()
    }

    /// Check if the arena is full
    pub fn is_full(&self) -> bool {
        self.count() >= self.max_players as usize
    }

    /// Allocate a player index
    fn allocate_index(&mut self) -> Result<u16> {
        for _ in 0..self.max_players {
            let index = self.next_index;
            self.next_index += 1;

            // Wrap around if needed
            if self.next_index > self.max_players {
                self.next_index = 1;
            }

            if !self.players.contains_key(&index) {
                return Ok(index);
            }
        }

        Err(QuiverError::Game(GameError::WorldFull))
    }

    /// Iterate over all players in index order
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Player),
    {
        for player in self.players.values() {
            f(player);
        }
    }
}

impl Default for PlayerManager {
    fn default() -> Self {
        Self::new(MAX_PLAYER_INDEX)
    }
}
