//! Protocol module
//!
//! Bindings to the shared protocol schema. Wire encoding of entity state is
//! owned by the transport layer; this module only resolves identifiers.

pub mod schema;

pub use schema::{EquipmentType, PickupType, ProjectileType, ProtocolSchema};
