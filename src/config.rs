//! Server configuration module
//!
//! Handles loading and parsing of server configuration from files and environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::QuiverError;
use crate::game::player::MAX_PLAYER_INDEX;
use crate::game::world::WorldSettings;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Server name displayed to players
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// World ID, also the stage id
    #[serde(default = "default_world_id")]
    pub world_id: u32,

    /// Game tick rate in milliseconds
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,

    /// Maximum number of players per arena
    #[serde(default = "default_max_players")]
    pub max_players: u16,

    /// Path to the protocol schema (JSON)
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    /// Path to the pickup constants table (TOML)
    #[serde(default = "default_constants_path")]
    pub constants_path: PathBuf,

    /// Slow motion duration in ticks
    #[serde(default = "default_slow_motion_ticks")]
    pub slow_motion_ticks: u64,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

// Default value functions
fn default_server_name() -> String {
    "Quiver".to_string()
}

fn default_world_id() -> u32 {
    1
}

fn default_tick_rate() -> u64 {
    50 // 20 ticks per second
}

fn default_max_players() -> u16 {
    8
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("./data/protocol.json")
}

fn default_constants_path() -> PathBuf {
    PathBuf::from("./data/constants.toml")
}

fn default_slow_motion_ticks() -> u64 {
    100 // 5 seconds at the default tick rate
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config/server.toml"),
            server_name: default_server_name(),
            world_id: default_world_id(),
            tick_rate_ms: default_tick_rate(),
            max_players: default_max_players(),
            schema_path: default_schema_path(),
            constants_path: default_constants_path(),
            slow_motion_ticks: default_slow_motion_ticks(),
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from file and environment variables
    pub async fn load() -> Result<Self> {
        // Determine config path from environment or use default
        let config_path = env::var("QUIVER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/server.toml"));

        // Try to load from file
        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path)
                .await
                .with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                })?;

            Self::from_toml(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.config_path = config_path;

        // Override with environment variables
        config.apply_env_overrides();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML source, filling defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("QUIVER_SERVER_NAME") {
            self.server_name = val;
        }
        if let Ok(val) = env::var("QUIVER_WORLD_ID") {
            if let Ok(id) = val.parse() {
                self.world_id = id;
            }
        }
        if let Ok(val) = env::var("QUIVER_TICK_RATE_MS") {
            if let Ok(rate) = val.parse() {
                self.tick_rate_ms = rate;
            }
        }
        if let Ok(val) = env::var("QUIVER_MAX_PLAYERS") {
            if let Ok(max) = val.parse() {
                self.max_players = max;
            }
        }
        if let Ok(val) = env::var("QUIVER_SCHEMA_PATH") {
            self.schema_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("QUIVER_CONSTANTS_PATH") {
            self.constants_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("QUIVER_SLOW_MOTION_TICKS") {
            if let Ok(ticks) = val.parse() {
                self.slow_motion_ticks = ticks;
            }
        }
        if let Ok(val) = env::var("QUIVER_DEBUG") {
            self.debug = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.world_id == 0 {
            return Err(QuiverError::Config("World ID must be non-zero".to_string()));
        }

        // Max players must fit the player index range
        if self.max_players == 0 || self.max_players > MAX_PLAYER_INDEX {
            return Err(QuiverError::Config(format!(
                "Max players must be between 1 and {}",
                MAX_PLAYER_INDEX
            )));
        }

        // Tick rate must be reasonable
        if self.tick_rate_ms < 10 || self.tick_rate_ms > 1000 {
            return Err(QuiverError::Config(
                "Tick rate must be between 10ms and 1000ms".to_string(),
            ));
        }

        if self.slow_motion_ticks == 0 {
            return Err(QuiverError::Config(
                "Slow motion duration must be at least one tick".to_string(),
            ));
        }

        Ok(())
    }

    /// Build world settings from this configuration
    pub fn world_settings(&self) -> WorldSettings {
        WorldSettings::new(self.world_id)
            .with_name(self.server_name.clone())
            .with_tick_rate_ms(self.tick_rate_ms)
            .with_max_players(self.max_players)
            .with_slow_motion_ticks(self.slow_motion_ticks)
    }
}
