use std::collections::HashMap;

use glam::Affine2;
use rubble_core::config::RecordFormat;
use rubble_core::shape::ShapeDescriptor;
use rubble_core::types::{InstanceHandle, MeshRef};

use crate::backend::RenderBackend;

/// Default limit, matching wgpu's default `max_buffer_size` (256 MiB).
pub const DEFAULT_MAX_BUFFER_SIZE: u64 = 256 * 1024 * 1024;

/// Headless storage for one instanced drawable.
#[derive(Debug, Clone)]
pub struct MemoryInstanced {
    pub format: RecordFormat,
    pub mesh: Option<MeshRef>,
    pub bytes: Vec<u8>,
    pub reallocations: u32,
    pub writes: u32,
    pub redraws: u32,
    pub draws: u32,
}

/// One immediate-mode draw recorded by the headless renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImmediateDraw {
    pub mesh: MeshRef,
    pub transform: Affine2,
}

/// CPU-only renderer keeping a byte-exact copy of every instance buffer.
///
/// Used by headless hosts, the benchmark runner and tests.
#[derive(Debug)]
pub struct MemoryRenderer {
    resources: HashMap<InstanceHandle, MemoryInstanced>,
    next_handle: u64,
    max_buffer_size: u64,
    destroyed: u32,
    /// Instanced draws submitted since the last `clear_frame`: (handle, count).
    pub instanced_draws: Vec<(InstanceHandle, u32)>,
    /// Immediate draws submitted since the last `clear_frame`.
    pub immediate_draws: Vec<ImmediateDraw>,
}

impl Default for MemoryRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::with_max_buffer_size(DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_max_buffer_size(max_buffer_size: u64) -> Self {
        Self {
            resources: HashMap::new(),
            next_handle: 1,
            max_buffer_size,
            destroyed: 0,
            instanced_draws: Vec::new(),
            immediate_draws: Vec::new(),
        }
    }

    /// Live resource for a handle, if it has not been destroyed.
    pub fn resource(&self, handle: InstanceHandle) -> Option<&MemoryInstanced> {
        self.resources.get(&handle)
    }

    /// Floats of one record as the renderer currently sees them.
    pub fn record_floats(&self, handle: InstanceHandle, slot: u32) -> Vec<f32> {
        let res = self.expect(handle);
        let stride = res.format.stride() as usize;
        let start = slot as usize * stride;
        bytemuck::pod_collect_to_vec(&res.bytes[start..start + stride])
    }

    /// Number of live (not destroyed) resources.
    pub fn live_resources(&self) -> usize {
        self.resources.len()
    }

    /// Number of resources destroyed so far.
    pub fn destroyed_count(&self) -> u32 {
        self.destroyed
    }

    /// Forget the draws recorded for the previous frame.
    pub fn clear_frame(&mut self) {
        self.instanced_draws.clear();
        self.immediate_draws.clear();
    }

    fn expect(&self, handle: InstanceHandle) -> &MemoryInstanced {
        self.resources
            .get(&handle)
            .unwrap_or_else(|| panic!("unknown or destroyed instance handle {handle:?}"))
    }

    fn expect_mut(&mut self, handle: InstanceHandle) -> &mut MemoryInstanced {
        self.resources
            .get_mut(&handle)
            .unwrap_or_else(|| panic!("unknown or destroyed instance handle {handle:?}"))
    }
}

impl RenderBackend for MemoryRenderer {
    fn max_buffer_size(&self) -> u64 {
        self.max_buffer_size
    }

    fn create_instanced(&mut self, format: RecordFormat) -> InstanceHandle {
        let handle = InstanceHandle(self.next_handle);
        self.next_handle += 1;
        self.resources.insert(
            handle,
            MemoryInstanced {
                format,
                mesh: None,
                bytes: Vec::new(),
                reallocations: 0,
                writes: 0,
                redraws: 0,
                draws: 0,
            },
        );
        handle
    }

    fn set_mesh(&mut self, handle: InstanceHandle, mesh: &MeshRef) {
        self.expect_mut(handle).mesh = Some(mesh.clone());
    }

    fn reallocate(&mut self, handle: InstanceHandle, capacity_bytes: u64, preserve_bytes: u64) {
        assert!(capacity_bytes <= self.max_buffer_size, "allocation over limit");
        let res = self.expect_mut(handle);
        assert!(preserve_bytes <= res.bytes.len() as u64, "preserving past old storage");
        assert!(preserve_bytes <= capacity_bytes, "preserving past new storage");

        let mut bytes = vec![0u8; capacity_bytes as usize];
        bytes[..preserve_bytes as usize].copy_from_slice(&res.bytes[..preserve_bytes as usize]);
        res.bytes = bytes;
        res.reallocations += 1;
    }

    fn write(&mut self, handle: InstanceHandle, offset: u64, bytes: &[u8]) {
        let res = self.expect_mut(handle);
        let start = offset as usize;
        let end = start + bytes.len();
        assert!(end <= res.bytes.len(), "write past end of instance storage");
        res.bytes[start..end].copy_from_slice(bytes);
        res.writes += 1;
    }

    fn request_redraw(&mut self, handle: InstanceHandle) {
        self.expect_mut(handle).redraws += 1;
    }

    fn draw_instanced(&mut self, handle: InstanceHandle, instance_count: u32) {
        self.expect_mut(handle).draws += 1;
        self.instanced_draws.push((handle, instance_count));
    }

    fn draw_immediate(&mut self, mesh: &MeshRef, _shape: &ShapeDescriptor, transform: Affine2) {
        self.immediate_draws.push(ImmediateDraw {
            mesh: mesh.clone(),
            transform,
        });
    }

    fn destroy(&mut self, handle: InstanceHandle) {
        if self.resources.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }
}
