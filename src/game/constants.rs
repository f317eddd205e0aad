//! Per-pickup constants
//!
//! Static parameters keyed by pickup name, loaded once at startup from
//! `data/constants.toml`. Coverage of every declared pickup is checked on
//! load so a missing entry aborts startup instead of failing on first use.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConstantsError, Result};

/// Constants source embedded at build time
const BUILTIN_CONSTANTS: &str = include_str!("../../data/constants.toml");

/// Bounding box of a pickup in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Deserialize)]
struct ConstantsSource {
    #[serde(default)]
    pickups: HashMap<String, Dimensions>,
}

/// Lookup table of pickup dimensions
#[derive(Debug, Clone, Default)]
pub struct ConstantsTable {
    pickups: HashMap<String, Dimensions>,
}

impl ConstantsTable {
    /// Parse a constants table from TOML
    pub fn from_toml(source: &str) -> std::result::Result<Self, ConstantsError> {
        let source: ConstantsSource =
            toml::from_str(source).map_err(|e| ConstantsError::Malformed(e.to_string()))?;

        for (name, dims) in &source.pickups {
            if !dims.is_valid() {
                return Err(ConstantsError::InvalidDimensions {
                    name: name.clone(),
                    width: dims.width,
                    height: dims.height,
                });
            }
        }

        Ok(Self {
            pickups: source.pickups,
        })
    }

    /// Load the table from a file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_toml(&content)?;

        info!(path = %path.display(), entries = table.len(), "Loaded pickup constants");

        Ok(table)
    }

    /// Table compiled into the binary
    pub fn builtin() -> std::result::Result<Self, ConstantsError> {
        Self::from_toml(BUILTIN_CONSTANTS)
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, name: impl Into<String>, dimensions: Dimensions) {
        self.pickups.insert(name.into(), dimensions);
    }

    /// Dimensions of a pickup by name
    pub fn dimensions_of(&self, name: &str) -> std::result::Result<Dimensions, ConstantsError> {
        self.pickups
            .get(name)
            .copied()
            .ok_or_else(|| ConstantsError::MissingEntry(name.to_string()))
    }

    /// Fail on the first declared name without an entry
    pub fn validate_covers<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> std::result::Result<(), ConstantsError> {
        for name in names {
            self.dimensions_of(name)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pickups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pickups.is_empty()
    }
}
