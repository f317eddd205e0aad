//! Protocol schema binding
//!
//! Resolves variant names to the stable wire identifiers declared by the
//! shared protocol schema:
//! - `PickupType` for collectible entities
//! - `ProjectileType` for the arrow a player fires
//! - `EquipmentType` for the melee slot
//!
//! The schema source is produced by the build pipeline together with its
//! content hash. This module only reads it; the hash is carried through
//! verbatim for client compatibility checks and never recomputed here.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SchemaError};

/// Schema source embedded at build time
const BUILTIN_SCHEMA: &str = include_str!("../../data/protocol.json");

const PICKUP_TABLE: &str = "PickupType";
const PROJECTILE_TABLE: &str = "ProjectileType";
const EQUIPMENT_TABLE: &str = "EquipmentType";

/// Wire identifier of a collectible entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PickupType(pub u8);

/// Wire identifier of a projectile kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ProjectileType(pub u8);

/// Wire identifier of an equipment kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EquipmentType(pub u8);

impl PickupType {
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl ProjectileType {
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl EquipmentType {
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PickupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// On-disk layout of the canonical schema source
#[derive(Debug, Deserialize)]
struct SchemaSource {
    #[serde(default)]
    hash: String,
    enums: SchemaEnums,
}

#[derive(Debug, Deserialize)]
struct SchemaEnums {
    #[serde(rename = "PickupType")]
    pickup_type: BTreeMap<String, u8>,
    #[serde(rename = "ProjectileType")]
    projectile_type: BTreeMap<String, u8>,
    #[serde(rename = "EquipmentType")]
    equipment_type: BTreeMap<String, u8>,
}

/// One name <-> id table of the schema
#[derive(Debug, Clone)]
struct EnumTable {
    table: &'static str,
    by_name: BTreeMap<String, u8>,
    by_id: BTreeMap<u8, String>,
}

impl EnumTable {
    fn new(table: &'static str, by_name: BTreeMap<String, u8>) -> std::result::Result<Self, SchemaError> {
        let mut by_id: BTreeMap<u8, String> = BTreeMap::new();
        for (name, &id) in &by_name {
            if let Some(first) = by_id.get(&id) {
                return Err(SchemaError::DuplicateId {
                    table,
                    id,
                    first: first.clone(),
                    second: name.clone(),
                });
            }
            by_id.insert(id, name.clone());
        }

        Ok(Self {
            table,
            by_name,
            by_id,
        })
    }

    fn id_of(&self, name: &str) -> std::result::Result<u8, SchemaError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownName {
                table: self.table,
                name: name.to_string(),
            })
    }

    fn name_of(&self, id: u8) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.by_name.len()
    }
}

/// Read-only, version-locked view of the protocol schema
#[derive(Debug, Clone)]
pub struct ProtocolSchema {
    hash: String,
    pickups: EnumTable,
    projectiles: EnumTable,
    equipment: EnumTable,
}

impl ProtocolSchema {
    /// Parse a schema from its canonical JSON source
    pub fn from_json(source: &str) -> std::result::Result<Self, SchemaError> {
        let source: SchemaSource =
            serde_json::from_str(source).map_err(|e| SchemaError::Malformed(e.to_string()))?;

        if source.hash.trim().is_empty() {
            return Err(SchemaError::MissingHash);
        }

        let schema = Self {
            hash: source.hash,
            pickups: EnumTable::new(PICKUP_TABLE, source.enums.pickup_type)?,
            projectiles: EnumTable::new(PROJECTILE_TABLE, source.enums.projectile_type)?,
            equipment: EnumTable::new(EQUIPMENT_TABLE, source.enums.equipment_type)?,
        };

        debug!(
            hash = %schema.hash,
            pickups = schema.pickups.len(),
            projectiles = schema.projectiles.len(),
            equipment = schema.equipment.len(),
            "Parsed protocol schema"
        );

        Ok(schema)
    }

    /// Load the schema from a file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let schema = Self::from_json(&content)?;

        info!(path = %path.display(), hash = %schema.hash, "Loaded protocol schema");

        Ok(schema)
    }

    /// Schema compiled into the binary
    pub fn builtin() -> std::result::Result<Self, SchemaError> {
        Self::from_json(BUILTIN_SCHEMA)
    }

    /// Content hash of the schema source, as written by the build pipeline
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Check a client-reported schema hash against ours
    pub fn is_compatible(&self, client_hash: &str) -> bool {
        self.hash == client_hash
    }

    pub fn type_id_of(&self, name: &str) -> std::result::Result<PickupType, SchemaError> {
        self.pickups.id_of(name).map(PickupType)
    }

    pub fn projectile_type_id_of(
        &self,
        name: &str,
    ) -> std::result::Result<ProjectileType, SchemaError> {
        self.projectiles.id_of(name).map(ProjectileType)
    }

    pub fn equipment_type_id_of(
        &self,
        name: &str,
    ) -> std::result::Result<EquipmentType, SchemaError> {
        self.equipment.id_of(name).map(EquipmentType)
    }

    /// Reverse lookup, mostly for logging
    pub fn pickup_name_of(&self, pickup_type: PickupType) -> Option<&str> {
        self.pickups.name_of(pickup_type.0)
    }

    pub fn projectile_name_of(&self, projectile_type: ProjectileType) -> Option<&str> {
        self.projectiles.name_of(projectile_type.0)
    }

    /// Number of declared pickup types
    pub fn pickup_type_count(&self) -> usize {
        self.pickups.len()
    }
}
