//! Pickup module
//!
//! Collectible world entities: arrows, power-ups, melee weapons and souls.
//! - `kind` - the closed set of kinds and their category tags
//! - `effect` - tagged effects and their dispatch to player or world
//! - `descriptor` - per-kind record bound to schema ids and constants
//! - `instance` - runtime lifecycle shared by every kind
//! - `catalog` - registry and categorized views

pub mod catalog;
pub mod descriptor;
pub mod effect;
pub mod instance;
pub mod kind;

pub use catalog::{CatalogView, PickupCatalog};
pub use descriptor::PickupDescriptor;
pub use effect::{EffectContext, EffectTarget, PickupEffect, PlayerBuff};
pub use instance::{PickupId, PickupInstance, PickupState, Placement};
pub use kind::{PickupCategory, PickupKind};
