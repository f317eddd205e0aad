//! Game module
//!
//! This module contains the core game logic for the Quiver server:
//! - Pickup catalog, variants and lifecycle
//! - Stage (pickup collection, slow motion)
//! - Player capabilities and management
//! - World management (game tick, spawning and collection)

pub mod constants;
pub mod pickup;
pub mod player;
pub mod stage;
pub mod world;
