//! Stage module
//!
//! The stage owns the authoritative collection of live pickups for one arena:
//! - Ordered pickup collection (insertion order drives broadcast order)
//! - Pending update events, drained once per tick for network sync
//! - World-level slow motion with a tick countdown

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::game::pickup::{
    PickupCategory, PickupId, PickupInstance, PickupKind, PickupState, Placement,
};
use crate::protocol::PickupType;

/// Identifier of a stage; pickups hold this instead of a reference
pub type StageId = u32;

/// Default slow motion duration in ticks
pub const DEFAULT_SLOW_MOTION_TICKS: u64 = 100;

/// Services a pickup needs from the stage it lives in
pub trait Stage {
    fn id(&self) -> StageId;

    /// Append a pickup to the live collection
    fn add_pickup(&mut self, pickup: &PickupInstance);

    /// Drop a pickup from the live collection, returning whether it was there
    fn remove_pickup(&mut self, pickup: &PickupInstance) -> bool;

    /// Notification sink for construction and removal
    fn on_pickup_updated(&mut self, pickup: &PickupInstance);

    fn is_time_slowed(&self) -> bool;

    fn start_slow_motion(&mut self);

    fn stop_slow_motion(&mut self);
}

/// A pickup as seen by the stage's collection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupEntry {
    pub id: PickupId,
    pub pickup_type: PickupType,
    pub kind: PickupKind,
    pub placement: Placement,
}

impl PickupEntry {
    fn of(pickup: &PickupInstance) -> Self {
        Self {
            id: pickup.id(),
            pickup_type: pickup.type_id(),
            kind: pickup.kind(),
            placement: pickup.placement(),
        }
    }
}

/// Event emitted when stage state changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageEvent {
    /// A pickup was constructed or removed (send entity update)
    PickupUpdated {
        id: PickupId,
        pickup_type: PickupType,
        state: PickupState,
        placement: Placement,
    },
    /// Slow motion began
    SlowMotionStarted { ticks: u64 },
    /// Slow motion ended, either toggled off or timed out
    SlowMotionEnded,
}

/// Reference stage used by the game world
#[derive(Debug)]
pub struct StageState {
    id: StageId,
    pickups: Vec<PickupEntry>,
    pending_events: Vec<StageEvent>,
    slow_motion_ticks: u64,
    slow_motion_remaining: u64,
}

impl StageState {
    /// Create an empty stage
    pub fn new(id: StageId, slow_motion_ticks: u64) -> Self {
        Self {
            id,
            pickups: Vec::with_capacity(32),
            pending_events: Vec::with_capacity(16),
            slow_motion_ticks: slow_motion_ticks.max(1),
            slow_motion_remaining: 0,
        }
    }

    /// Live pickups in registration order
    pub fn pickups(&self) -> &[PickupEntry] {
        &self.pickups
    }

    pub fn pickup_ids(&self) -> Vec<PickupId> {
        self.pickups.iter().map(|entry| entry.id).collect()
    }

    pub fn contains(&self, id: PickupId) -> bool {
        self.pickups.iter().any(|entry| entry.id == id)
    }

    pub fn count(&self) -> usize {
        self.pickups.len()
    }

    /// Ticks of slow motion left, zero when time runs normally
    pub fn slow_motion_remaining(&self) -> u64 {
        self.slow_motion_remaining
    }

    /// Advance slow motion by one tick
    pub fn process_tick(&mut self) {
        if self.slow_motion_remaining == 0 {
            return;
        }

        self.slow_motion_remaining -= 1;
        trace!(
            stage = self.id,
            remaining = self.slow_motion_remaining,
            "Slow motion tick"
        );

        if self.slow_motion_remaining == 0 {
            self.pending_events.push(StageEvent::SlowMotionEnded);
            info!(stage = self.id, "Slow motion expired");
        }
    }

    /// Get pending events and clear the queue
    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Forget every pickup and event (for round resets or testing)
    pub fn clear(&mut self) {
        self.pickups.clear();
        self.pending_events.clear();
        self.slow_motion_remaining = 0;
        info!(stage = self.id, "Cleared stage");
    }

    /// Get statistics about the stage
    pub fn stats(&self) -> StageStats {
        let arrows = self
            .pickups
            .iter()
            .filter(|entry| entry.kind.category() == PickupCategory::Arrow)
            .count();
        let souls = self
            .pickups
            .iter()
            .filter(|entry| entry.kind == PickupKind::Soul)
            .count();

        StageStats {
            total: self.pickups.len(),
            arrows,
            souls,
            powerups: self.pickups.len() - arrows - souls,
            pending_events: self.pending_events.len(),
            slowed: self.is_time_slowed(),
        }
    }
}

impl Stage for StageState {
    fn id(&self) -> StageId {
        self.id
    }

    fn add_pickup(&mut self, pickup: &PickupInstance) {
        if self.contains(pickup.id()) {
            warn!(stage = self.id, id = pickup.id(), "Pickup added twice");
            return;
        }
        self.pickups.push(PickupEntry::of(pickup));
    }

    fn remove_pickup(&mut self, pickup: &PickupInstance) -> bool {
        match self.pickups.iter().position(|entry| entry.id == pickup.id()) {
            Some(index) => {
                // keep the remaining order intact
                self.pickups.remove(index);
                true
            }
            None => false,
        }
    }

    fn on_pickup_updated(&mut self, pickup: &PickupInstance) {
        self.pending_events.push(StageEvent::PickupUpdated {
            id: pickup.id(),
            pickup_type: pickup.type_id(),
            state: pickup.state(),
            placement: pickup.placement(),
        });
    }

    fn is_time_slowed(&self) -> bool {
        self.slow_motion_remaining > 0
    }

    fn start_slow_motion(&mut self) {
        self.slow_motion_remaining = self.slow_motion_ticks;
        self.pending_events.push(StageEvent::SlowMotionStarted {
            ticks: self.slow_motion_ticks,
        });
        debug!(stage = self.id, ticks = self.slow_motion_ticks, "Slow motion started");
    }

    fn stop_slow_motion(&mut self) {
        self.slow_motion_remaining = 0;
        self.pending_events.push(StageEvent::SlowMotionEnded);
        debug!(stage = self.id, "Slow motion stopped");
    }
}

/// Statistics about a stage
#[derive(Debug, Clone)]
pub struct StageStats {
    pub total: usize,
    pub arrows: usize,
    pub souls: usize,
    pub powerups: usize,
    pub pending_events: usize,
    pub slowed: bool,
}
