//! Pickup instances
//!
//! Runtime lifecycle shared by every kind:
//! - Constructed: built by the catalog, stage already notified
//! - Registered: present in the stage's pickup collection
//! - Applied: effect granted, `acquired` is set
//! - Unregistered: taken out of the collection
//! - Removed: terminal
//!
//! An instance never owns its stage. It keeps the stage id as a handle and
//! receives the stage by `&mut` for each transition.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::descriptor::PickupDescriptor;
use super::effect::EffectContext;
use super::kind::PickupKind;
use crate::error::PickupError;
use crate::game::constants::Dimensions;
use crate::game::stage::{Stage, StageId};
use crate::protocol::PickupType;

/// Unique identifier for a pickup instance, assigned by the world
pub type PickupId = u64;

/// Spawn data handed to the catalog by the world's spawn logic
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    /// Stamped by the catalog before construction
    pub pickup_type: Option<PickupType>,
}

impl Placement {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            pickup_type: None,
        }
    }
}

/// Lifecycle state of a pickup instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupState {
    Constructed,
    Registered,
    Applied,
    Unregistered,
    Removed,
}

impl PickupState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constructed => "constructed",
            Self::Registered => "registered",
            Self::Applied => "applied",
            Self::Unregistered => "unregistered",
            Self::Removed => "removed",
        }
    }

    /// Whether the instance is currently in its stage's collection
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Registered | Self::Applied)
    }
}

/// A pickup in the world
#[derive(Debug)]
pub struct PickupInstance {
    id: PickupId,
    pickup_type: PickupType,
    acquired: bool,
    state: PickupState,
    placement: Placement,
    descriptor: Arc<PickupDescriptor>,
    stage: StageId,
}

impl PickupInstance {
    /// Construct an instance and announce it to the stage
    ///
    /// The stage sees the update before the instance is registered.
    pub fn new(
        stage: &mut dyn Stage,
        id: PickupId,
        descriptor: Arc<PickupDescriptor>,
        placement: Placement,
    ) -> Self {
        let instance = Self {
            id,
            pickup_type: descriptor.type_id(),
            acquired: false,
            state: PickupState::Constructed,
            placement,
            descriptor,
            stage: stage.id(),
        };

        debug!(
            id = id,
            kind = instance.kind().name(),
            pickup_type = %instance.pickup_type,
            x = placement.x,
            y = placement.y,
            "Constructed pickup"
        );

        stage.on_pickup_updated(&instance);
        instance
    }

    pub fn id(&self) -> PickupId {
        self.id
    }

    pub fn type_id(&self) -> PickupType {
        self.pickup_type
    }

    pub fn kind(&self) -> PickupKind {
        self.descriptor.kind()
    }

    pub fn descriptor(&self) -> &PickupDescriptor {
        &self.descriptor
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn dimensions(&self) -> Dimensions {
        self.descriptor.dimensions()
    }

    pub fn state(&self) -> PickupState {
        self.state
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    pub fn stage_id(&self) -> StageId {
        self.stage
    }

    fn check_stage(&self, stage: &dyn Stage) -> Result<(), PickupError> {
        if stage.id() != self.stage {
            return Err(PickupError::StageMismatch {
                id: self.id,
                expected: self.stage,
                actual: stage.id(),
            });
        }
        Ok(())
    }

    fn invalid(&self, to: PickupState) -> PickupError {
        PickupError::InvalidTransition {
            id: self.id,
            from: self.state.as_str(),
            to: to.as_str(),
        }
    }

    /// Add the instance to its stage's pickup collection
    pub fn register(&mut self, stage: &mut dyn Stage) -> Result<(), PickupError> {
        self.check_stage(stage)?;
        if self.state != PickupState::Constructed {
            return Err(self.invalid(PickupState::Registered));
        }

        self.state = PickupState::Registered;
        stage.add_pickup(self);

        debug!(
            id = self.id,
            kind = self.kind().name(),
            category = self.descriptor.category().as_str(),
            "Registered pickup"
        );
        Ok(())
    }

    /// Mark the pickup acquired and run its effect
    ///
    /// Only valid once, while registered. A second call is rejected and the
    /// effect is not granted again.
    pub fn apply(&mut self, context: EffectContext<'_>) -> Result<(), PickupError> {
        match self.state {
            PickupState::Registered => {}
            PickupState::Applied => return Err(PickupError::AlreadyAcquired(self.id)),
            PickupState::Constructed => return Err(PickupError::NotRegistered(self.id)),
            PickupState::Unregistered | PickupState::Removed => {
                return Err(self.invalid(PickupState::Applied))
            }
        }

        let effect = self.descriptor.effect();
        if !effect.accepts(&context) {
            return Err(PickupError::WrongTarget {
                kind: self.kind().name(),
                expected: effect.target().as_str(),
                actual: context.target().as_str(),
            });
        }

        self.acquired = true;
        self.state = PickupState::Applied;
        effect.dispatch(context);

        debug!(id = self.id, kind = self.kind().name(), "Applied pickup");
        Ok(())
    }

    /// Take the instance out of its stage's collection
    ///
    /// Safe to call when the stage no longer holds it; that case is logged.
    pub fn unregister(&mut self, stage: &mut dyn Stage) -> Result<(), PickupError> {
        self.check_stage(stage)?;
        match self.state {
            PickupState::Registered | PickupState::Applied => {
                self.detach(stage);
                self.state = PickupState::Unregistered;
                Ok(())
            }
            PickupState::Constructed => Err(PickupError::NotRegistered(self.id)),
            PickupState::Unregistered | PickupState::Removed => {
                warn!(
                    id = self.id,
                    state = self.state.as_str(),
                    "Pickup unregistered twice"
                );
                Ok(())
            }
        }
    }

    /// Announce the removal, then leave the stage for good
    ///
    /// Removing twice is a no-op: no second notification is sent.
    pub fn remove(&mut self, stage: &mut dyn Stage) -> Result<(), PickupError> {
        self.check_stage(stage)?;
        match self.state {
            PickupState::Constructed => return Err(PickupError::NotRegistered(self.id)),
            PickupState::Removed => {
                warn!(id = self.id, "Pickup removed twice");
                return Ok(());
            }
            PickupState::Registered | PickupState::Applied | PickupState::Unregistered => {}
        }

        let was_live = self.state.is_live();
        self.state = PickupState::Removed;
        stage.on_pickup_updated(self);
        if was_live {
            self.detach(stage);
        }

        debug!(
            id = self.id,
            kind = self.kind().name(),
            acquired = self.acquired,
            "Removed pickup"
        );
        Ok(())
    }

    fn detach(&self, stage: &mut dyn Stage) {
        if !stage.remove_pickup(self) {
            warn!(
                id = self.id,
                stage = self.stage,
                "Pickup was not in its stage's collection"
            );
        }
    }
}
