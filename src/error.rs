//! Error handling module
//!
//! Defines custom error types for the Quiver server.

use std::io;

use thiserror::Error;

/// Main error type for the Quiver server
#[derive(Error, Debug)]
pub enum QuiverError {
    /// Protocol schema errors
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Constants table errors
    #[error("Constants error: {0}")]
    Constants(#[from] ConstantsError),

    /// Pickup lifecycle and catalog errors
    #[error("Pickup error: {0}")]
    Pickup(#[from] PickupError),

    /// Game logic errors
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Protocol schema binding errors
///
/// All of these indicate a mismatch between the code and the schema it was
/// built against. None of them are recoverable at runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Name {name} is not declared in schema enum {table}")]
    UnknownName { table: &'static str, name: String },

    #[error("Schema enum {table} maps both {first} and {second} to id {id}")]
    DuplicateId {
        table: &'static str,
        id: u8,
        first: String,
        second: String,
    },

    #[error("Schema source carries no hash")]
    MissingHash,

    #[error("Malformed schema source: {0}")]
    Malformed(String),
}

/// Constants table errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstantsError {
    #[error("No constants declared for pickup {0}")]
    MissingEntry(String),

    #[error("Invalid dimensions for pickup {name}: {width}x{height}")]
    InvalidDimensions { name: String, width: f32, height: f32 },

    #[error("Malformed constants source: {0}")]
    Malformed(String),
}

/// Pickup lifecycle, dispatch and catalog errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PickupError {
    #[error("Unsupported option: {0}")]
    UnsupportedOption(String),

    #[error("Pickup {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: u64,
        from: &'static str,
        to: &'static str,
    },

    #[error("Pickup {0} was never registered")]
    NotRegistered(u64),

    #[error("Pickup {0} was already acquired")]
    AlreadyAcquired(u64),

    #[error("Pickup {kind} acts on the {expected}, not the {actual}")]
    WrongTarget {
        kind: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Pickup {id} belongs to stage {expected}, not stage {actual}")]
    StageMismatch { id: u64, expected: u32, actual: u32 },

    #[error("Pickup {0} not found")]
    NotFound(u64),
}

/// Game logic errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Player not found: {0}")]
    PlayerNotFound(u16),

    #[error("Player already registered: {0}")]
    PlayerAlreadyRegistered(String),

    #[error("World full")]
    WorldFull,

    #[error("World not ready")]
    WorldNotReady,
}

/// Result type alias for Quiver operations
pub type Result<T> = std::result::Result<T, QuiverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::UnknownName {
            table: "PickupType",
            name: "MegaArrow".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Name MegaArrow is not declared in schema enum PickupType"
        );

        let err = PickupError::UnsupportedOption("swords".to_string());
        assert_eq!(err.to_string(), "Unsupported option: swords");

        let err = ConstantsError::MissingEntry("Wing".to_string());
        assert_eq!(err.to_string(), "No constants declared for pickup Wing");
    }

    #[test]
    fn test_error_conversion() {
        let err: QuiverError = PickupError::NotRegistered(7).into();
        assert!(matches!(err, QuiverError::Pickup(PickupError::NotRegistered(7))));
        assert_eq!(err.to_string(), "Pickup error: Pickup 7 was never registered");

        let err: QuiverError = GameError::PlayerNotFound(3).into();
        assert_eq!(err.to_string(), "Game error: Player not found: 3");
    }
}
