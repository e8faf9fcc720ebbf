use std::collections::HashMap;

use glam::Affine2;
use rubble_core::config::RecordFormat;
use rubble_core::shape::ShapeDescriptor;
use rubble_core::types::{InstanceHandle, MeshRef};

use crate::backend::RenderBackend;
use crate::outline::{shape_outline, LineVertex, OUTLINE_COLOR};

/// An instanced draw queued for the host's render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub handle: InstanceHandle,
    pub mesh: Option<MeshRef>,
    pub instance_count: u32,
}

/// One instanced drawable on the GPU.
struct GpuInstanced {
    format: RecordFormat,
    mesh: Option<MeshRef>,
    /// None until the first allocation.
    buffer: Option<wgpu::Buffer>,
    capacity_bytes: u64,
    needs_redraw: bool,
}

/// Renderer collaborator backed by wgpu vertex buffers.
///
/// Instance storage is a `VERTEX | COPY_DST | COPY_SRC` buffer per drawable.
/// Growth allocates a new buffer and copies the old one into its prefix on
/// the GPU, so nothing is read back to the CPU. Draws are queued as
/// [`DrawCommand`]s and outline vertices; the host encodes them into its
/// own render pass with its own pipelines.
pub struct WgpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    resources: HashMap<InstanceHandle, GpuInstanced>,
    next_handle: u64,
    draws: Vec<DrawCommand>,
    lines: Vec<LineVertex>,
}

impl WgpuRenderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        log::info!(
            "WgpuRenderer: max instance buffer {} MB",
            device.limits().max_buffer_size / (1024 * 1024)
        );
        Self {
            device,
            queue,
            resources: HashMap::new(),
            next_handle: 1,
            draws: Vec::new(),
            lines: Vec::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Vertex buffer holding the instance records of `handle`.
    pub fn instance_buffer(&self, handle: InstanceHandle) -> Option<&wgpu::Buffer> {
        self.resources.get(&handle).and_then(|r| r.buffer.as_ref())
    }

    /// Record format of `handle`, for building the host's vertex layout.
    pub fn record_format(&self, handle: InstanceHandle) -> Option<RecordFormat> {
        self.resources.get(&handle).map(|r| r.format)
    }

    /// Whether `handle` changed since the host last drew it. Clears the flag.
    pub fn take_redraw(&mut self, handle: InstanceHandle) -> bool {
        self.resources
            .get_mut(&handle)
            .map(|r| std::mem::take(&mut r.needs_redraw))
            .unwrap_or(false)
    }

    /// Instanced draws queued since the last call.
    pub fn take_draws(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.draws)
    }

    /// Immediate-mode outline vertices (line list) queued since the last call.
    pub fn take_lines(&mut self) -> Vec<LineVertex> {
        std::mem::take(&mut self.lines)
    }

    fn expect_mut(&mut self, handle: InstanceHandle) -> &mut GpuInstanced {
        self.resources
            .get_mut(&handle)
            .unwrap_or_else(|| panic!("unknown or destroyed instance handle {handle:?}"))
    }
}

impl RenderBackend for WgpuRenderer {
    fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }

    fn create_instanced(&mut self, format: RecordFormat) -> InstanceHandle {
        let handle = InstanceHandle(self.next_handle);
        self.next_handle += 1;
        self.resources.insert(
            handle,
            GpuInstanced {
                format,
                mesh: None,
                buffer: None,
                capacity_bytes: 0,
                needs_redraw: false,
            },
        );
        handle
    }

    fn set_mesh(&mut self, handle: InstanceHandle, mesh: &MeshRef) {
        let res = self.expect_mut(handle);
        res.mesh = Some(mesh.clone());
        res.needs_redraw = true;
    }

    fn reallocate(&mut self, handle: InstanceHandle, capacity_bytes: u64, preserve_bytes: u64) {
        let device = self.device.clone();
        let queue = self.queue.clone();
        let res = self.expect_mut(handle);
        assert!(preserve_bytes <= res.capacity_bytes, "preserving past old storage");
        assert!(preserve_bytes <= capacity_bytes, "preserving past new storage");

        let new_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cluster-instance-buffer"),
            size: capacity_bytes,
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        if let Some(old) = res.buffer.take() {
            if preserve_bytes > 0 {
                let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("instance-buffer-grow"),
                });
                encoder.copy_buffer_to_buffer(&old, 0, &new_buffer, 0, preserve_bytes);
                queue.submit(Some(encoder.finish()));
            }
            old.destroy();
        }

        res.buffer = Some(new_buffer);
        res.capacity_bytes = capacity_bytes;
        res.needs_redraw = true;
    }

    fn write(&mut self, handle: InstanceHandle, offset: u64, bytes: &[u8]) {
        let queue = self.queue.clone();
        let res = self.expect_mut(handle);
        assert!(
            offset + bytes.len() as u64 <= res.capacity_bytes,
            "write past end of instance storage"
        );
        if let Some(buffer) = res.buffer.as_ref() {
            queue.write_buffer(buffer, offset, bytes);
        }
    }

    fn request_redraw(&mut self, handle: InstanceHandle) {
        self.expect_mut(handle).needs_redraw = true;
    }

    fn draw_instanced(&mut self, handle: InstanceHandle, instance_count: u32) {
        let mesh = self.expect_mut(handle).mesh.clone();
        self.draws.push(DrawCommand {
            handle,
            mesh,
            instance_count,
        });
    }

    fn draw_immediate(&mut self, _mesh: &MeshRef, shape: &ShapeDescriptor, transform: Affine2) {
        self.lines
            .extend(shape_outline(shape, transform, OUTLINE_COLOR));
    }

    fn destroy(&mut self, handle: InstanceHandle) {
        if let Some(res) = self.resources.remove(&handle) {
            if let Some(buffer) = res.buffer {
                buffer.destroy();
            }
        }
    }
}
