//! Pickup kinds
//!
//! The closed set of collectible kinds the server knows about, each with an
//! explicit category tag and a description of the effect it grants. Wire ids
//! are not hard-coded here; they are bound through the protocol schema when
//! the catalog is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::effect::{PickupEffect, PlayerBuff};
use crate::error::{PickupError, SchemaError};
use crate::protocol::ProtocolSchema;

/// Equipment slot name granted by melee pickups
const DAGGER_EQUIPMENT: &str = "Dagger";

/// Category tag assigned to every kind at declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupCategory {
    /// Dropped on death, carries no effect
    Soul,
    /// Replaces the player's active projectile
    Arrow,
    /// Everything else a player can collect
    Powerup,
}

impl PickupCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soul => "soul",
            Self::Arrow => "arrow",
            Self::Powerup => "powerup",
        }
    }
}

/// Every kind of pickup, in catalog declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PickupKind {
    Soul,
    TimeOrb,
    Shield,
    Wing,
    Boots,
    DoubleShot,
    Invisibility,
    RotatingDart,
    Dagger,
    BombArrow,
    LaserArrow,
    IceArrow,
    BoltArrow,
    DrillArrow,
    PoisonArrow,
}

impl PickupKind {
    /// Total number of kinds
    pub const COUNT: usize = 15;

    /// All kinds in declaration order
    pub const ALL: [PickupKind; Self::COUNT] = [
        Self::Soul,
        Self::TimeOrb,
        Self::Shield,
        Self::Wing,
        Self::Boots,
        Self::DoubleShot,
        Self::Invisibility,
        Self::RotatingDart,
        Self::Dagger,
        Self::BombArrow,
        Self::LaserArrow,
        Self::IceArrow,
        Self::BoltArrow,
        Self::DrillArrow,
        Self::PoisonArrow,
    ];

    /// Name used by the protocol schema and the constants table
    pub fn name(&self) -> &'static str {
        match self {
            Self::Soul => "Soul",
            Self::TimeOrb => "TimeOrb",
            Self::Shield => "Shield",
            Self::Wing => "Wing",
            Self::Boots => "Boots",
            Self::DoubleShot => "DoubleShot",
            Self::Invisibility => "Invisibility",
            Self::RotatingDart => "RotatingDart",
            Self::Dagger => "Dagger",
            Self::BombArrow => "BombArrow",
            Self::LaserArrow => "LaserArrow",
            Self::IceArrow => "IceArrow",
            Self::BoltArrow => "BoltArrow",
            Self::DrillArrow => "DrillArrow",
            Self::PoisonArrow => "PoisonArrow",
        }
    }

    pub fn category(&self) -> PickupCategory {
        match self {
            Self::Soul => PickupCategory::Soul,
            Self::BombArrow
            | Self::LaserArrow
            | Self::IceArrow
            | Self::BoltArrow
            | Self::DrillArrow
            | Self::PoisonArrow => PickupCategory::Arrow,
            Self::TimeOrb
            | Self::Shield
            | Self::Wing
            | Self::Boots
            | Self::DoubleShot
            | Self::Invisibility
            | Self::RotatingDart
            | Self::Dagger => PickupCategory::Powerup,
        }
    }

    pub fn is_melee_weapon(&self) -> bool {
        matches!(self, Self::Dagger)
    }

    /// Look up a kind by its schema name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Bind this kind's effect to wire ids from the schema
    pub fn bind_effect(&self, schema: &ProtocolSchema) -> Result<PickupEffect, SchemaError> {
        let effect = match self {
            Self::Soul => PickupEffect::None,
            Self::TimeOrb => PickupEffect::ToggleSlowMotion,
            Self::Shield => PickupEffect::Grant(PlayerBuff::Shield),
            Self::Wing => PickupEffect::Grant(PlayerBuff::Wing),
            Self::Boots => PickupEffect::Grant(PlayerBuff::Haste),
            Self::DoubleShot => PickupEffect::Grant(PlayerBuff::DoubleShot),
            Self::Invisibility => PickupEffect::Grant(PlayerBuff::Invisible),
            Self::RotatingDart => PickupEffect::Grant(PlayerBuff::RotatingDart),
            Self::Dagger => PickupEffect::Equip(schema.equipment_type_id_of(DAGGER_EQUIPMENT)?),
            Self::BombArrow
            | Self::LaserArrow
            | Self::IceArrow
            | Self::BoltArrow
            | Self::DrillArrow
            | Self::PoisonArrow => PickupEffect::SetArrow(schema.projectile_type_id_of(self.name())?),
        };
        Ok(effect)
    }
}

impl fmt::Display for PickupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PickupKind {
    type Err = PickupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| PickupError::UnsupportedOption(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{EquipmentType, ProjectileType};

    #[test]
    fn test_all_kinds_unique() {
        let mut names: Vec<&str> = PickupKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PickupKind::COUNT);
    }

    #[test]
    fn test_from_name() {
        for kind in PickupKind::ALL {
            assert_eq!(PickupKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PickupKind::from_name("Sword"), None);
        assert_eq!(PickupKind::from_name("bombarrow"), None);
    }

    #[test]
    fn test_from_str_unsupported() {
        assert_eq!("Wing".parse::<PickupKind>().unwrap(), PickupKind::Wing);
        assert_eq!(
            "Sword".parse::<PickupKind>().unwrap_err(),
            PickupError::UnsupportedOption("Sword".to_string())
        );
    }

    #[test]
    fn test_categories() {
        let arrows: Vec<PickupKind> = PickupKind::ALL
            .into_iter()
            .filter(|k| k.category() == PickupCategory::Arrow)
            .collect();
        assert_eq!(
            arrows,
            vec![
                PickupKind::BombArrow,
                PickupKind::LaserArrow,
                PickupKind::IceArrow,
                PickupKind::BoltArrow,
                PickupKind::DrillArrow,
                PickupKind::PoisonArrow,
            ]
        );
        assert_eq!(PickupKind::Soul.category(), PickupCategory::Soul);
        assert_eq!(PickupKind::Dagger.category(), PickupCategory::Powerup);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(PickupKind::Soul.category().as_str(), "soul");
        assert_eq!(PickupKind::DrillArrow.category().as_str(), "arrow");
        assert_eq!(PickupKind::TimeOrb.category().as_str(), "powerup");
    }

    #[test]
    fn test_melee_weapon() {
        let melee: Vec<PickupKind> = PickupKind::ALL
            .into_iter()
            .filter(|k| k.is_melee_weapon())
            .collect();
        assert_eq!(melee, vec![PickupKind::Dagger]);
    }

    #[test]
    fn test_bind_effect() {
        let schema = ProtocolSchema::builtin().unwrap();
        assert_eq!(
            PickupKind::IceArrow.bind_effect(&schema).unwrap(),
            PickupEffect::SetArrow(ProjectileType(3))
        );
        assert_eq!(
            PickupKind::Dagger.bind_effect(&schema).unwrap(),
            PickupEffect::Equip(EquipmentType(1))
        );
        assert_eq!(
            PickupKind::TimeOrb.bind_effect(&schema).unwrap(),
            PickupEffect::ToggleSlowMotion
        );
        assert_eq!(
            PickupKind::Soul.bind_effect(&schema).unwrap(),
            PickupEffect::None
        );
    }
}
