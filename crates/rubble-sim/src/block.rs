use glam::Affine2;
use rubble_core::types::BlockTypeId;

/// Block lifecycle: `Created -> Enabled <-> Disabled`.
///
/// No state gives back the block id, shape index or instance slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Bookkeeping done, not yet visible or collidable.
    Created,
    /// Shape active, instance drawn at the block transform.
    Enabled,
    /// Shape inactive (or queued to become so), instance hidden.
    Disabled,
}

/// One destructible sub-part of a cluster.
#[derive(Debug, Clone)]
pub struct Block {
    /// Archetype in the world catalog.
    pub block_type: BlockTypeId,
    /// Placement on the cluster body.
    pub local_transform: Affine2,
    /// Remaining health. Disabled at or below zero.
    pub health: f32,
    pub state: BlockState,
}

impl Block {
    pub fn new(block_type: BlockTypeId, local_transform: Affine2, health: f32) -> Self {
        Self {
            block_type,
            local_transform,
            health,
            state: BlockState::Created,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state == BlockState::Enabled
    }

    /// Move to Enabled. Returns false if already enabled.
    pub fn enable(&mut self) -> bool {
        if self.is_enabled() {
            return false;
        }
        self.state = BlockState::Enabled;
        true
    }

    /// Move to Disabled. Returns false unless the block was enabled.
    pub fn disable(&mut self) -> bool {
        if self.state != BlockState::Enabled {
            return false;
        }
        self.state = BlockState::Disabled;
        true
    }

    /// Subtract `amount` from health. Returns true if health is now depleted.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        self.health <= 0.0
    }
}
