//! Pickup catalog
//!
//! Registry of every pickup kind bound to the protocol schema and constants
//! table. Built once at startup and shared by `Arc`; construction either
//! yields a complete catalog or fails.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use super::descriptor::PickupDescriptor;
use super::instance::{PickupId, PickupInstance, Placement};
use super::kind::{PickupCategory, PickupKind};
use crate::error::{PickupError, Result};
use crate::game::constants::ConstantsTable;
use crate::game::stage::Stage;
use crate::protocol::{PickupType, ProtocolSchema};

/// Named subsets of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogView {
    All,
    Collectible,
    Arrows,
    Powerups,
    MeleeWeapons,
}

impl CatalogView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Collectible => "collectible",
            Self::Arrows => "arrows",
            Self::Powerups => "powerups",
            Self::MeleeWeapons => "melee",
        }
    }
}

impl fmt::Display for CatalogView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogView {
    type Err = PickupError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "collectible" => Ok(Self::Collectible),
            "arrows" => Ok(Self::Arrows),
            "powerups" => Ok(Self::Powerups),
            "melee" => Ok(Self::MeleeWeapons),
            other => Err(PickupError::UnsupportedOption(other.to_string())),
        }
    }
}

/// All pickup descriptors, in declaration order
#[derive(Debug)]
pub struct PickupCatalog {
    descriptors: Vec<Arc<PickupDescriptor>>,
    by_type: HashMap<PickupType, usize>,
    schema_hash: String,
}

impl PickupCatalog {
    /// Bind every kind against the schema and constants
    pub fn load(schema: &ProtocolSchema, constants: &ConstantsTable) -> Result<Self> {
        constants.validate_covers(PickupKind::ALL.iter().map(|kind| kind.name()))?;

        let mut descriptors = Vec::with_capacity(PickupKind::COUNT);
        let mut by_type = HashMap::with_capacity(PickupKind::COUNT);

        for kind in PickupKind::ALL {
            let descriptor = PickupDescriptor::bind(kind, schema, constants)?;
            by_type.insert(descriptor.type_id(), descriptors.len());
            descriptors.push(Arc::new(descriptor));
        }

        let catalog = Self {
            descriptors,
            by_type,
            schema_hash: schema.hash().to_string(),
        };

        info!(
            pickups = catalog.len(),
            arrows = catalog.arrows().len(),
            powerups = catalog.powerups().len(),
            schema_hash = %catalog.schema_hash,
            "Pickup catalog loaded"
        );

        Ok(catalog)
    }

    /// Catalog bound to the embedded schema and constants
    pub fn builtin() -> Result<Self> {
        let schema = ProtocolSchema::builtin()?;
        let constants = ConstantsTable::builtin()?;
        Self::load(&schema, &constants)
    }

    /// Hash of the schema this catalog was bound against
    pub fn schema_hash(&self) -> &str {
        &self.schema_hash
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptor(&self, kind: PickupKind) -> &Arc<PickupDescriptor> {
        // descriptors are pushed in PickupKind::ALL order
        &self.descriptors[kind as usize]
    }

    pub fn descriptor_by_type(&self, pickup_type: PickupType) -> Option<&Arc<PickupDescriptor>> {
        self.by_type
            .get(&pickup_type)
            .map(|&index| &self.descriptors[index])
    }

    pub fn kind_by_name(&self, name: &str) -> std::result::Result<PickupKind, PickupError> {
        name.parse()
    }

    /// Build an instance of `kind`, stamping its type onto the placement
    pub fn build(
        &self,
        stage: &mut dyn Stage,
        id: PickupId,
        kind: PickupKind,
        mut placement: Placement,
    ) -> PickupInstance {
        let descriptor = self.descriptor(kind);
        placement.pickup_type = Some(descriptor.type_id());
        PickupInstance::new(stage, id, Arc::clone(descriptor), placement)
    }

    fn filtered(&self, keep: impl Fn(&PickupDescriptor) -> bool) -> Vec<&PickupDescriptor> {
        self.descriptors
            .iter()
            .map(Arc::as_ref)
            .filter(|&descriptor| keep(descriptor))
            .collect()
    }

    pub fn all(&self) -> Vec<&PickupDescriptor> {
        self.filtered(|_| true)
    }

    /// Everything except souls
    pub fn collectible(&self) -> Vec<&PickupDescriptor> {
        self.filtered(|d| !d.is_soul())
    }

    pub fn arrows(&self) -> Vec<&PickupDescriptor> {
        self.filtered(|d| d.category() == PickupCategory::Arrow)
    }

    /// Everything except souls and arrows
    pub fn powerups(&self) -> Vec<&PickupDescriptor> {
        self.filtered(|d| !d.is_soul() && !d.is_arrow())
    }

    pub fn melee_weapons(&self) -> Vec<&PickupDescriptor> {
        self.filtered(|d| d.is_melee_weapon())
    }

    pub fn view(&self, view: CatalogView) -> Vec<&PickupDescriptor> {
        match view {
            CatalogView::All => self.all(),
            CatalogView::Collectible => self.collectible(),
            CatalogView::Arrows => self.arrows(),
            CatalogView::Powerups => self.powerups(),
            CatalogView::MeleeWeapons => self.melee_weapons(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConstantsError, QuiverError};
    use crate::game::constants::Dimensions;
    use crate::game::pickup::PickupState;
    use crate::game::stage::StageState;

    fn kinds(descriptors: &[&PickupDescriptor]) -> Vec<PickupKind> {
        descriptors.iter().map(|d| d.kind()).collect()
    }

    #[test]
    fn test_catalog_loads_all_kinds() {
        let catalog = PickupCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 15);
        assert_eq!(kinds(&catalog.all()), PickupKind::ALL.to_vec());
    }

    #[test]
    fn test_descriptor_lookup_matches_kind() {
        let catalog = PickupCatalog::builtin().unwrap();
        for kind in PickupKind::ALL {
            let descriptor = catalog.descriptor(kind);
            assert_eq!(descriptor.kind(), kind);
            assert_eq!(
                catalog.descriptor_by_type(descriptor.type_id()).unwrap().kind(),
                kind
            );
        }
        assert!(catalog.descriptor_by_type(PickupType(200)).is_none());
    }

    #[test]
    fn test_build_stamps_type() {
        let catalog = PickupCatalog::builtin().unwrap();
        let mut stage = StageState::new(1, 10);

        for (id, kind) in PickupKind::ALL.into_iter().enumerate() {
            let pickup = catalog.build(&mut stage, id as PickupId, kind, Placement::at(1.0, 2.0));
            let expected = catalog.descriptor(kind).type_id();
            assert_eq!(pickup.type_id(), expected);
            assert_eq!(pickup.placement().pickup_type, Some(expected));
            assert_eq!(pickup.state(), PickupState::Constructed);
        }
        assert_eq!(stage.drain_events().len(), PickupKind::COUNT);
    }

    #[test]
    fn test_collectible_excludes_soul() {
        let catalog = PickupCatalog::builtin().unwrap();
        let collectible = kinds(&catalog.collectible());
        assert_eq!(collectible.len(), catalog.all().len() - 1);
        assert!(!collectible.contains(&PickupKind::Soul));
    }

    #[test]
    fn test_arrows() {
        let catalog = PickupCatalog::builtin().unwrap();
        assert_eq!(
            kinds(&catalog.arrows()),
            vec![
                PickupKind::BombArrow,
                PickupKind::LaserArrow,
                PickupKind::IceArrow,
                PickupKind::BoltArrow,
                PickupKind::DrillArrow,
                PickupKind::PoisonArrow,
            ]
        );
    }

    #[test]
    fn test_powerups() {
        let catalog = PickupCatalog::builtin().unwrap();
        assert_eq!(
            kinds(&catalog.powerups()),
            vec![
                PickupKind::TimeOrb,
                PickupKind::Shield,
                PickupKind::Wing,
                PickupKind::Boots,
                PickupKind::DoubleShot,
                PickupKind::Invisibility,
                PickupKind::RotatingDart,
                PickupKind::Dagger,
            ]
        );
    }

    #[test]
    fn test_melee_weapons() {
        let catalog = PickupCatalog::builtin().unwrap();
        assert_eq!(kinds(&catalog.melee_weapons()), vec![PickupKind::Dagger]);
    }

    #[test]
    fn test_views_partition_catalog() {
        let catalog = PickupCatalog::builtin().unwrap();
        let arrows = kinds(&catalog.arrows());
        let powerups = kinds(&catalog.powerups());

        for kind in PickupKind::ALL {
            let in_arrows = arrows.contains(&kind);
            let in_powerups = powerups.contains(&kind);
            let is_soul = kind == PickupKind::Soul;
            assert_eq!(
                [in_arrows, in_powerups, is_soul]
                    .iter()
                    .filter(|&&hit| hit)
                    .count(),
                1,
                "{kind} must be in exactly one partition"
            );
        }
    }

    #[test]
    fn test_view_by_name() {
        let catalog = PickupCatalog::builtin().unwrap();
        let view: CatalogView = "melee".parse().unwrap();
        assert_eq!(kinds(&catalog.view(view)), vec![PickupKind::Dagger]);
        assert_eq!(catalog.view("all".parse().unwrap()).len(), 15);
        assert_eq!(catalog.view("collectible".parse().unwrap()).len(), 14);

        let err = "swords".parse::<CatalogView>().unwrap_err();
        assert_eq!(err, PickupError::UnsupportedOption("swords".to_string()));
    }

    #[test]
    fn test_kind_by_name() {
        let catalog = PickupCatalog::builtin().unwrap();
        assert_eq!(catalog.kind_by_name("Boots").unwrap(), PickupKind::Boots);
        assert_eq!(
            catalog.kind_by_name("Jetpack").unwrap_err(),
            PickupError::UnsupportedOption("Jetpack".to_string())
        );
    }

    #[test]
    fn test_missing_constants_aborts() {
        let schema = ProtocolSchema::builtin().unwrap();
        let mut constants = ConstantsTable::default();
        for kind in PickupKind::ALL.iter().take(PickupKind::COUNT - 1) {
            constants.insert(kind.name(), Dimensions::new(1.0, 1.0));
        }

        let err = PickupCatalog::load(&schema, &constants).unwrap_err();
        assert!(matches!(
            err,
            QuiverError::Constants(ConstantsError::MissingEntry(ref name)) if name == "PoisonArrow"
        ));
    }

    #[test]
    fn test_schema_hash_carried() {
        let schema = ProtocolSchema::builtin().unwrap();
        let catalog = PickupCatalog::builtin().unwrap();
        assert_eq!(catalog.schema_hash(), schema.hash());
    }
}
