//! Pickup effects
//!
//! An effect is a tagged value that names its own target. Most effects act
//! on the collecting player; the time orb acts on the stage instead. The
//! caller supplies an [`EffectContext`] and dispatch refuses a context of the
//! wrong kind rather than guessing.

use tracing::error;

use crate::game::player::PlayerCapabilities;
use crate::game::stage::Stage;
use crate::protocol::{EquipmentType, ProjectileType};

/// Timed or permanent buff granted to a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerBuff {
    Haste,
    DoubleShot,
    Invisible,
    RotatingDart,
    Shield,
    Wing,
}

/// What an effect acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTarget {
    None,
    Player,
    World,
}

impl EffectTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "nothing",
            Self::Player => "player",
            Self::World => "world",
        }
    }
}

/// Resolved effect of a pickup kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupEffect {
    /// No effect (souls)
    None,
    /// Switch the active projectile, then reload
    SetArrow(ProjectileType),
    /// Put a weapon in the melee slot
    Equip(EquipmentType),
    /// Grant a buff
    Grant(PlayerBuff),
    /// Start slow motion, or stop it if already running
    ToggleSlowMotion,
}

/// The thing an effect is applied to
pub enum EffectContext<'a> {
    Player(&'a mut dyn PlayerCapabilities),
    World(&'a mut dyn Stage),
}

impl EffectContext<'_> {
    pub fn target(&self) -> EffectTarget {
        match self {
            Self::Player(_) => EffectTarget::Player,
            Self::World(_) => EffectTarget::World,
        }
    }
}

impl PickupEffect {
    pub fn target(&self) -> EffectTarget {
        match self {
            Self::None => EffectTarget::None,
            Self::SetArrow(_) | Self::Equip(_) | Self::Grant(_) => EffectTarget::Player,
            Self::ToggleSlowMotion => EffectTarget::World,
        }
    }

    /// Whether `context` is an acceptable target for this effect
    ///
    /// Effects without a target accept anything.
    pub fn accepts(&self, context: &EffectContext<'_>) -> bool {
        match self.target() {
            EffectTarget::None => true,
            target => target == context.target(),
        }
    }

    /// Run the effect against a context already checked with [`Self::accepts`]
    ///
    /// A mismatched context is a bug in the caller: it is logged at `error!`
    /// and panics in debug builds.
    pub(crate) fn dispatch(&self, context: EffectContext<'_>) {
        match (self, context) {
            (Self::None, _) => {}
            (Self::SetArrow(projectile), EffectContext::Player(player)) => {
                player.set_arrow_type(*projectile);
                player.reload_ammo();
            }
            (Self::Equip(equipment), EffectContext::Player(player)) => {
                player.set_equip(*equipment);
            }
            (Self::Grant(buff), EffectContext::Player(player)) => match buff {
                PlayerBuff::Haste => player.add_haste(),
                PlayerBuff::DoubleShot => player.add_double_shot(),
                PlayerBuff::Invisible => player.add_invisible(),
                PlayerBuff::RotatingDart => player.add_rotating_dart(),
                PlayerBuff::Shield => player.add_shield(),
                PlayerBuff::Wing => player.add_wing(),
            },
            (Self::ToggleSlowMotion, EffectContext::World(stage)) => {
                if stage.is_time_slowed() {
                    stage.stop_slow_motion();
                } else {
                    stage.start_slow_motion();
                }
            }
            (effect, context) => {
                error!(
                    effect = ?effect,
                    target = context.target().as_str(),
                    "Effect dispatched to the wrong target"
                );
                debug_assert!(
                    false,
                    "{:?} dispatched to the {}",
                    effect,
                    context.target().as_str()
                );
            }
        }
    }
}
