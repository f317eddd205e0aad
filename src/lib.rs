//! Quiver Game Server Library
//!
//! This library provides the core functionality for the Quiver game server:
//! binding pickups to the protocol schema, their lifecycle on a stage, and the
//! world that spawns and collects them.
//!
//! ## Modules
//!
//! - `config` - Server configuration management
//! - `error` - Error types and result definitions
//! - `game` - Pickups, stage, players and the game world
//! - `protocol` - Protocol schema binding
//! - `state` - Shared application state

pub mod config;
pub mod error;
pub mod game;
pub mod protocol;
pub mod state;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{QuiverError, Result};
pub use game::pickup::{PickupCatalog, PickupKind};
pub use state::AppState;

/// Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
