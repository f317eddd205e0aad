//! Pickup descriptors
//!
//! A descriptor is the shared, read-only record for one kind once it has been
//! bound to the protocol schema and the constants table.

use serde::Serialize;

use super::effect::{EffectTarget, PickupEffect};
use super::kind::{PickupCategory, PickupKind};
use crate::error::Result;
use crate::game::constants::{ConstantsTable, Dimensions};
use crate::protocol::{PickupType, ProtocolSchema};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickupDescriptor {
    kind: PickupKind,
    pickup_type: PickupType,
    category: PickupCategory,
    melee_weapon: bool,
    dimensions: Dimensions,
    #[serde(skip)]
    effect: PickupEffect,
}

impl PickupDescriptor {
    /// Resolve a kind against the schema and constants
    ///
    /// Fails if either source does not know the kind.
    pub fn bind(
        kind: PickupKind,
        schema: &ProtocolSchema,
        constants: &ConstantsTable,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            pickup_type: schema.type_id_of(kind.name())?,
            category: kind.category(),
            melee_weapon: kind.is_melee_weapon(),
            dimensions: constants.dimensions_of(kind.name())?,
            effect: kind.bind_effect(schema)?,
        })
    }

    pub fn kind(&self) -> PickupKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn type_id(&self) -> PickupType {
        self.pickup_type
    }

    pub fn category(&self) -> PickupCategory {
        self.category
    }

    pub fn is_arrow(&self) -> bool {
        self.category == PickupCategory::Arrow
    }

    pub fn is_soul(&self) -> bool {
        self.category == PickupCategory::Soul
    }

    pub fn is_melee_weapon(&self) -> bool {
        self.melee_weapon
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn effect(&self) -> PickupEffect {
        self.effect
    }

    pub fn target(&self) -> EffectTarget {
        self.effect.target()
    }
}
