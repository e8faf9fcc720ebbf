//! Collision-shape changes that must wait for a safe point.
//!
//! Contacts are reported while the physics collaborator may still be walking
//! its shape lists, so no shape may be switched on or off from inside the
//! contact hook or anywhere else mid-step. Requests are queued here and
//! drained by the host after the step.
//!
//! An entry exists only while the requested state differs from the shape's
//! physics state. A request opposite to the queued one therefore removes it.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use rubble_core::types::BlockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeUpdate {
    Enable,
    Disable,
}

impl ShapeUpdate {
    pub fn enabled(self) -> bool {
        self == ShapeUpdate::Enable
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShapeUpdateQueue {
    updates: BTreeMap<BlockId, ShapeUpdate>,
}

impl ShapeUpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_enable(&mut self, id: BlockId) {
        self.push(id, ShapeUpdate::Enable);
    }

    pub fn push_disable(&mut self, id: BlockId) {
        self.push(id, ShapeUpdate::Disable);
    }

    /// Queue `update` for `id`. The latest request wins; one that undoes the
    /// queued request leaves nothing to apply.
    pub fn push(&mut self, id: BlockId, update: ShapeUpdate) {
        match self.updates.entry(id) {
            Entry::Occupied(e) if *e.get() != update => {
                e.remove();
            }
            Entry::Occupied(mut e) => {
                e.insert(update);
            }
            Entry::Vacant(e) => {
                e.insert(update);
            }
        }
    }

    pub fn pending(&self, id: BlockId) -> Option<ShapeUpdate> {
        self.updates.get(&id).copied()
    }

    pub fn is_pending(&self, id: BlockId) -> bool {
        self.updates.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Take every queued update in block id order.
    pub fn drain(&mut self) -> Vec<(BlockId, ShapeUpdate)> {
        std::mem::take(&mut self.updates).into_iter().collect()
    }
}
