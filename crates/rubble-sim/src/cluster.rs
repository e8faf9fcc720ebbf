use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Affine2;
use rubble_core::catalog::BlockCatalog;
use rubble_core::config::{DrawMode, WorldConfig};
use rubble_core::error::RubbleError;
use rubble_core::types::{BlockId, BlockTypeId, BodyHandle, Contact, InstanceSlot};
use rubble_render::backend::RenderBackend;
use rubble_render::instance_buffer::GrowableInstanceBuffer;

use crate::allocator::BlockAllocator;
use crate::block::{Block, BlockState};
use crate::deferred::{ShapeUpdate, ShapeUpdateQueue};
use crate::physics::PhysicsBackend;

/// Counters for debug display and the benchmark report.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClusterStats {
    pub blocks: u32,
    pub enabled: u32,
    pub disabled: u32,
    pub buffers: u32,
    pub expand_events: u32,
    pub capacity_bytes: u64,
    pub pending_shape_updates: u32,
}

/// A rigid body made of destructible blocks.
///
/// Block id, collision-shape index and append order are the same integer.
/// Each BlockType in use owns one instance buffer whose live slots are the
/// blocks of that type in append order.
///
/// Per tick the host calls, in order: `on_physics_step` with the contacts of
/// the step, `flush_shape_updates` once the physics engine is no longer
/// iterating shapes, then `on_draw_requested` for every frame drawn.
pub struct Cluster {
    catalog: Arc<BlockCatalog>,
    config: WorldConfig,
    body: BodyHandle,
    blocks: Vec<Block>,
    allocator: BlockAllocator,
    buffers: BTreeMap<BlockTypeId, GrowableInstanceBuffer>,
    pending: ShapeUpdateQueue,
}

impl Cluster {
    /// Create an empty cluster with its own rigid body.
    pub fn new(physics: &mut dyn PhysicsBackend, catalog: Arc<BlockCatalog>, config: WorldConfig) -> Self {
        let body = physics.create_body();
        Self {
            catalog,
            config,
            body,
            blocks: Vec::new(),
            allocator: BlockAllocator::new(),
            buffers: BTreeMap::new(),
            pending: ShapeUpdateQueue::new(),
        }
    }

    /// Append a block of `block_type` placed at `local_transform` and enable it.
    ///
    /// Fails with `InvalidReference` for an unregistered type and with
    /// `OutOfMemory` when its instance buffer cannot grow. On failure the
    /// cluster is unchanged.
    pub fn add_block(
        &mut self,
        physics: &mut dyn PhysicsBackend,
        renderer: &mut dyn RenderBackend,
        block_type: BlockTypeId,
        local_transform: Affine2,
    ) -> Result<BlockId, RubbleError> {
        let catalog = Arc::clone(&self.catalog);
        let archetype = catalog.get(block_type)?;
        let reservation = self.allocator.reserve(block_type);

        let created = !self.buffers.contains_key(&block_type);
        let buffer = match self.buffers.entry(block_type) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let mut buffer = GrowableInstanceBuffer::new(
                    renderer,
                    self.config.record_format,
                    self.config.initial_instance_capacity,
                )?;
                buffer.set_source_mesh(renderer, archetype.mesh());
                e.insert(buffer)
            }
        };
        let grown = buffer.set_live_count(renderer, reservation.live_count());
        if let Err(err) = grown {
            if created {
                if let Some(mut buffer) = self.buffers.remove(&block_type) {
                    buffer.release(renderer);
                }
            }
            return Err(err);
        }

        let shape_index = physics.append_shape(self.body, archetype.shape());
        assert_eq!(
            shape_index,
            reservation.block_id.shape_index(),
            "shape index diverged from block id"
        );
        self.allocator.commit(reservation);
        self.blocks
            .push(Block::new(block_type, local_transform, archetype.health()));
        physics.set_shape_transform(self.body, shape_index, local_transform);

        // Adding happens outside a step, so the first enable is immediate.
        let id = reservation.block_id;
        self.block_mut(id).enable();
        physics.set_shape_enabled(self.body, shape_index, true);
        self.show_instance(renderer, id, local_transform);
        Ok(id)
    }

    /// Draw the block's instance at its transform and queue its shape for
    /// activation.
    ///
    /// No-op if the block is already enabled. The shape becomes active at the
    /// next `flush_shape_updates`, or stays active if its disable was still
    /// queued.
    pub fn enable_block(&mut self, renderer: &mut dyn RenderBackend, id: BlockId) {
        let block = self.block_mut(id);
        if !block.enable() {
            return;
        }
        let transform = block.local_transform;

        self.pending.push_enable(id);
        self.show_instance(renderer, id, transform);
    }

    /// Hide the block's instance and queue its shape for deactivation.
    ///
    /// No-op unless the block is enabled. The shape stays active until the
    /// next `flush_shape_updates`.
    pub fn disable_block(&mut self, renderer: &mut dyn RenderBackend, id: BlockId) {
        if !self.block_mut(id).disable() {
            return;
        }
        log::debug!("Cluster {:?}: block {} disabled", self.body, id.0);

        self.pending.push_disable(id);
        let (block_type, slot) = self.allocator.slot_of(id);
        let buffer = self.buffer_mut(block_type);
        buffer.hide(slot);
        buffer.flush(renderer);
    }

    /// Remove `amount` health from an enabled block, disabling it once depleted.
    /// Returns true if this call disabled the block.
    pub fn apply_damage(&mut self, renderer: &mut dyn RenderBackend, id: BlockId, amount: f32) -> bool {
        let block = self.block_mut(id);
        if !block.is_enabled() {
            return false;
        }
        if !block.take_damage(amount) {
            return false;
        }
        self.disable_block(renderer, id);
        true
    }

    /// Physics hook: apply the damage of one step's contacts on this body.
    ///
    /// Takes no physics collaborator; shape changes caused here wait for
    /// `flush_shape_updates`. Returns the blocks this step disabled, in the
    /// order they broke.
    pub fn on_physics_step(&mut self, renderer: &mut dyn RenderBackend, contacts: &[Contact]) -> Vec<BlockId> {
        let mut broken = Vec::new();
        for contact in contacts {
            let id = contact.block_id();
            let block = self.block(id);
            if !block.is_enabled() {
                log::trace!(
                    "Cluster {:?}: contact on disabled block {} ignored",
                    self.body,
                    id.0
                );
                continue;
            }

            let amount = if self.catalog.get(block.block_type).is_ok_and(|t| t.is_weak()) {
                block.health
            } else {
                self.config.damage.damage(contact.impact)
            };
            if self.apply_damage(renderer, id, amount) {
                broken.push(id);
            }
        }
        broken
    }

    /// Apply queued shape enables and disables. Call at a safe point after
    /// the physics step. Returns the number of shapes changed.
    pub fn flush_shape_updates(&mut self, physics: &mut dyn PhysicsBackend) -> usize {
        let updates = self.pending.drain();
        for (id, update) in &updates {
            physics.set_shape_enabled(self.body, id.shape_index(), update.enabled());
        }
        updates.len()
    }

    /// Draw hook: submit this cluster in the world's draw mode.
    pub fn on_draw_requested(&mut self, physics: &dyn PhysicsBackend, renderer: &mut dyn RenderBackend) {
        match self.config.draw_mode {
            DrawMode::Batched => {
                for buffer in self.buffers.values_mut() {
                    buffer.draw(renderer);
                }
            }
            DrawMode::Immediate => {
                for (i, block) in self.blocks.iter().enumerate() {
                    if !block.is_enabled() {
                        continue;
                    }
                    let Ok(archetype) = self.catalog.get(block.block_type) else {
                        continue;
                    };
                    let transform = physics.shape_transform(self.body, i as u32);
                    renderer.draw_immediate(archetype.mesh(), archetype.shape(), transform);
                }
            }
        }
    }

    /// Restore a block to full archetype health and enable it. Safe to call
    /// mid-step; the shape follows at the next `flush_shape_updates`.
    pub fn repair_block(&mut self, renderer: &mut dyn RenderBackend, id: BlockId) {
        let block_type = self.block(id).block_type;
        if let Ok(archetype) = self.catalog.get(block_type) {
            self.block_mut(id).health = archetype.health();
        }
        self.enable_block(renderer, id);
    }

    /// Release every instance buffer and destroy the body.
    pub fn destroy(mut self, physics: &mut dyn PhysicsBackend, renderer: &mut dyn RenderBackend) {
        for buffer in self.buffers.values_mut() {
            buffer.release(renderer);
        }
        physics.destroy_body(self.body);
        log::debug!(
            "Cluster {:?} destroyed ({} blocks, {} buffers)",
            self.body,
            self.blocks.len(),
            self.buffers.len()
        );
    }

    pub fn stats(&self) -> ClusterStats {
        let enabled = self.blocks.iter().filter(|b| b.is_enabled()).count() as u32;
        let disabled = self
            .blocks
            .iter()
            .filter(|b| b.state == BlockState::Disabled)
            .count() as u32;
        ClusterStats {
            blocks: self.blocks.len() as u32,
            enabled,
            disabled,
            buffers: self.buffers.len() as u32,
            expand_events: self.buffers.values().map(|b| b.expand_count()).sum(),
            capacity_bytes: self.buffers.values().map(|b| b.capacity_bytes()).sum(),
            pending_shape_updates: self.pending.len() as u32,
        }
    }

    /// Total archetype mass of the enabled blocks.
    pub fn enabled_mass(&self) -> f32 {
        self.blocks
            .iter()
            .filter(|b| b.is_enabled())
            .filter_map(|b| self.catalog.get(b.block_type).ok())
            .map(|t| t.mass())
            .sum()
    }

    /// Block by id. Panics if `id` was never assigned.
    pub fn block(&self, id: BlockId) -> &Block {
        let count = self.blocks.len();
        self.blocks
            .get(id.index())
            .unwrap_or_else(|| panic!("block id {} out of range (block count {count})", id.0))
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (BlockId(i as u32), b))
    }

    pub fn block_count(&self) -> u32 {
        self.blocks.len() as u32
    }

    /// BlockType and buffer slot of a block.
    pub fn instance_slot(&self, id: BlockId) -> (BlockTypeId, InstanceSlot) {
        self.allocator.slot_of(id)
    }

    pub fn buffer(&self, block_type: BlockTypeId) -> Option<&GrowableInstanceBuffer> {
        self.buffers.get(&block_type)
    }

    /// BlockTypes with at least one block, in id order.
    pub fn used_block_types(&self) -> impl Iterator<Item = BlockTypeId> + '_ {
        self.buffers.keys().copied()
    }

    /// Shape change for `id` waiting for `flush_shape_updates`, if any.
    pub fn pending_shape_update(&self, id: BlockId) -> Option<ShapeUpdate> {
        self.pending.pending(id)
    }

    pub fn is_shape_update_pending(&self, id: BlockId) -> bool {
        self.pending.is_pending(id)
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<BlockCatalog> {
        &self.catalog
    }

    fn block_mut(&mut self, id: BlockId) -> &mut Block {
        let count = self.blocks.len();
        self.blocks
            .get_mut(id.index())
            .unwrap_or_else(|| panic!("block id {} out of range (block count {count})", id.0))
    }

    fn show_instance(&mut self, renderer: &mut dyn RenderBackend, id: BlockId, transform: Affine2) {
        let (block_type, slot) = self.allocator.slot_of(id);
        let buffer = self.buffer_mut(block_type);
        buffer.set_transform(slot, transform);
        buffer.flush(renderer);
    }

    fn buffer_mut(&mut self, block_type: BlockTypeId) -> &mut GrowableInstanceBuffer {
        self.buffers
            .get_mut(&block_type)
            .unwrap_or_else(|| panic!("no instance buffer for block type {}", block_type.0))
    }
}
