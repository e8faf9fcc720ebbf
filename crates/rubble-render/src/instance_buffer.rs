//! Capacity-doubling buffer of fixed-stride per-instance render records.
//!
//! A CPU mirror holds every record; the renderer-side storage is kept in
//! step by uploading the dirty span on `flush`. Growth reallocates the
//! renderer storage and preserves the written prefix, so a record written
//! before an Expand reads back unchanged afterwards.

use std::ops::Range;

use glam::Affine2;
use rubble_core::config::RecordFormat;
use rubble_core::constants::{DEFAULT_INSTANCE_COLOR, FLOAT_BYTES};
use rubble_core::error::RubbleError;
use rubble_core::math::{decode_transform, encode_transform, is_hidden_transform};
use rubble_core::types::{InstanceHandle, InstanceSlot, MeshRef};

use crate::backend::RenderBackend;

/// New capacity in bytes for a buffer that must hold `required` bytes.
///
/// Doubles `current`, clamps the doubled size to the largest whole number of
/// records under `max`, and falls back to `required` when the doubled size is
/// still too small (first allocation, or one large request).
pub fn expanded_capacity(
    current: u64,
    required: u64,
    stride: u64,
    max: u64,
) -> Result<u64, RubbleError> {
    if required > max {
        return Err(RubbleError::OutOfMemory {
            requested: required,
            max,
        });
    }

    let max_whole = max / stride * stride;
    let doubled = current.saturating_mul(2).min(max_whole);
    Ok(doubled.max(required))
}

/// Instance records for one BlockType inside one cluster.
pub struct GrowableInstanceBuffer {
    handle: InstanceHandle,
    format: RecordFormat,
    stride: u64,
    capacity_bytes: u64,
    live_count: u32,
    /// CPU mirror of the renderer storage; `capacity_bytes / 4` floats.
    records: Vec<f32>,
    /// Float range written since the last flush.
    dirty: Option<Range<usize>>,
    mesh: Option<MeshRef>,
    expand_count: u32,
    released: bool,
}

impl GrowableInstanceBuffer {
    /// Create the renderer resource and reserve room for `initial_capacity` instances.
    pub fn new(
        backend: &mut dyn RenderBackend,
        format: RecordFormat,
        initial_capacity: u32,
    ) -> Result<Self, RubbleError> {
        let stride = format.stride();
        let initial_bytes = initial_capacity as u64 * stride;
        let max = backend.max_buffer_size();
        if initial_bytes > max {
            return Err(RubbleError::OutOfMemory {
                requested: initial_bytes,
                max,
            });
        }

        let handle = backend.create_instanced(format);
        backend.reallocate(handle, initial_bytes, 0);
        log::info!(
            "Instance buffer {:?}: {} instances x {} bytes",
            handle,
            initial_capacity,
            stride
        );

        Ok(Self {
            handle,
            format,
            stride,
            capacity_bytes: initial_bytes,
            live_count: 0,
            records: vec![0.0; (initial_bytes / FLOAT_BYTES as u64) as usize],
            dirty: None,
            mesh: None,
            expand_count: 0,
            released: false,
        })
    }

    /// Guarantee room for `n` live instances and make `n` the live count.
    ///
    /// Within capacity this only updates the count. Beyond it the buffer is
    /// expanded (see [`expanded_capacity`]). Newly live records start hidden,
    /// with the default color when the format carries one.
    pub fn set_live_count(&mut self, backend: &mut dyn RenderBackend, n: u32) -> Result<(), RubbleError> {
        self.assert_live();
        let required = n as u64 * self.stride;
        if required > self.capacity_bytes {
            self.expand(backend, required)?;
        }

        if n > self.live_count {
            for slot in self.live_count..n {
                self.init_record(slot);
            }
        }
        self.live_count = n;
        Ok(())
    }

    fn expand(&mut self, backend: &mut dyn RenderBackend, required: u64) -> Result<(), RubbleError> {
        let new_capacity = expanded_capacity(
            self.capacity_bytes,
            required,
            self.stride,
            backend.max_buffer_size(),
        )?;
        log::debug!(
            "Instance buffer {:?}: expand {} -> {} bytes",
            self.handle,
            self.capacity_bytes,
            new_capacity
        );

        // Unflushed records are part of the mirror, so upload them before the
        // renderer copies its old storage into the new allocation.
        self.flush_records(backend);
        backend.reallocate(self.handle, new_capacity, self.capacity_bytes);

        self.records
            .resize((new_capacity / FLOAT_BYTES as u64) as usize, 0.0);
        self.capacity_bytes = new_capacity;
        self.expand_count += 1;
        Ok(())
    }

    fn init_record(&mut self, slot: u32) {
        let range = self.slot_range(slot);
        self.records[range.clone()].fill(0.0);
        if let Some(offset) = self.format.color_offset() {
            let start = range.start + offset as usize;
            self.records[start..start + 4].copy_from_slice(&DEFAULT_INSTANCE_COLOR);
        }
        self.mark_dirty(range);
    }

    /// Overwrite the whole record at `slot`.
    ///
    /// Panics if `slot` is not live or `record` is not exactly one stride long.
    pub fn set_record(&mut self, slot: InstanceSlot, record: &[f32]) {
        let range = self.checked_slot_range(slot);
        assert_eq!(
            record.len(),
            range.len(),
            "record must be {} floats",
            range.len()
        );
        self.records[range.clone()].copy_from_slice(record);
        self.mark_dirty(range);
    }

    /// Overwrite only the transform portion of the record at `slot`.
    pub fn set_transform(&mut self, slot: InstanceSlot, transform: Affine2) {
        let range = self.checked_slot_range(slot);
        encode_transform(self.format.transform, transform, &mut self.records[range.clone()]);
        self.mark_dirty(range);
    }

    /// Replace the transform at `slot` with the all-zero transform.
    ///
    /// The record keeps its slot and its color/custom data; it simply draws
    /// as a degenerate primitive.
    pub fn hide(&mut self, slot: InstanceSlot) {
        let range = self.checked_slot_range(slot);
        let floats = self.format.transform.floats() as usize;
        self.records[range.start..range.start + floats].fill(0.0);
        self.mark_dirty(range);
    }

    /// Set the per-instance color. Panics if the format has no color block.
    pub fn set_color(&mut self, slot: InstanceSlot, color: [f32; 4]) {
        let offset = self
            .format
            .color_offset()
            .unwrap_or_else(|| panic!("record format {:?} carries no color", self.format));
        self.write_block(slot, offset, &color);
    }

    /// Set the per-instance custom data. Panics if the format has none.
    pub fn set_custom_data(&mut self, slot: InstanceSlot, data: [f32; 4]) {
        let offset = self
            .format
            .custom_data_offset()
            .unwrap_or_else(|| panic!("record format {:?} carries no custom data", self.format));
        self.write_block(slot, offset, &data);
    }

    fn write_block(&mut self, slot: InstanceSlot, offset: u32, values: &[f32; 4]) {
        let range = self.checked_slot_range(slot);
        let start = range.start + offset as usize;
        self.records[start..start + 4].copy_from_slice(values);
        self.mark_dirty(range);
    }

    /// Floats of the record at `slot`.
    pub fn record(&self, slot: InstanceSlot) -> &[f32] {
        &self.records[self.checked_slot_range(slot)]
    }

    /// Decoded transform of the record at `slot`.
    pub fn transform(&self, slot: InstanceSlot) -> Affine2 {
        decode_transform(self.record(slot))
    }

    /// Whether the instance at `slot` currently draws as the zero transform.
    pub fn is_hidden(&self, slot: InstanceSlot) -> bool {
        let floats = self.format.transform.floats() as usize;
        is_hidden_transform(&self.record(slot)[..floats])
    }

    /// Associate the visual geometry drawn for every instance.
    pub fn set_source_mesh(&mut self, backend: &mut dyn RenderBackend, mesh: &MeshRef) {
        self.assert_live();
        backend.set_mesh(self.handle, mesh);
        self.mesh = Some(mesh.clone());
    }

    /// Upload records written since the last flush and request a redraw.
    pub fn flush(&mut self, backend: &mut dyn RenderBackend) {
        self.assert_live();
        if self.flush_records(backend) {
            backend.request_redraw(self.handle);
        }
    }

    fn flush_records(&mut self, backend: &mut dyn RenderBackend) -> bool {
        let Some(range) = self.dirty.take() else {
            return false;
        };
        let offset = range.start as u64 * FLOAT_BYTES as u64;
        backend.write(
            self.handle,
            offset,
            bytemuck::cast_slice(&self.records[range]),
        );
        true
    }

    /// Flush, then submit one instanced draw covering every live instance.
    pub fn draw(&mut self, backend: &mut dyn RenderBackend) {
        self.flush(backend);
        if self.live_count > 0 {
            backend.draw_instanced(self.handle, self.live_count);
        }
    }

    /// Free the renderer resource. Must be called exactly once.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        assert!(!self.released, "instance buffer {:?} released twice", self.handle);
        backend.destroy(self.handle);
        self.released = true;
    }

    pub fn handle(&self) -> InstanceHandle {
        self.handle
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Bytes per record.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// Whole records that fit in the current allocation.
    pub fn capacity(&self) -> u32 {
        (self.capacity_bytes / self.stride) as u32
    }

    pub fn live_count(&self) -> u32 {
        self.live_count
    }

    pub fn mesh(&self) -> Option<&MeshRef> {
        self.mesh.as_ref()
    }

    /// Number of reallocations after the initial one.
    pub fn expand_count(&self) -> u32 {
        self.expand_count
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn slot_range(&self, slot: u32) -> Range<usize> {
        let floats = (self.stride / FLOAT_BYTES as u64) as usize;
        let start = slot as usize * floats;
        start..start + floats
    }

    fn checked_slot_range(&self, slot: InstanceSlot) -> Range<usize> {
        assert!(
            slot.0 < self.live_count,
            "instance slot {} out of range (live count {})",
            slot.0,
            self.live_count
        );
        self.slot_range(slot.0)
    }

    fn mark_dirty(&mut self, range: Range<usize>) {
        self.dirty = Some(match self.dirty.take() {
            Some(d) => d.start.min(range.start)..d.end.max(range.end),
            None => range,
        });
    }

    fn assert_live(&self) {
        assert!(!self.released, "instance buffer {:?} used after release", self.handle);
    }
}

impl Drop for GrowableInstanceBuffer {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "Instance buffer {:?} dropped without release; renderer handle leaked",
                self.handle
            );
        }
    }
}
