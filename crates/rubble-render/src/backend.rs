use glam::Affine2;
use rubble_core::config::RecordFormat;
use rubble_core::shape::ShapeDescriptor;
use rubble_core::types::{InstanceHandle, MeshRef};

/// The rendering collaborator as seen by clusters and instance buffers.
///
/// Implementations own the actual GPU (or headless) resources. Offsets and
/// sizes are in bytes and always multiples of four.
pub trait RenderBackend {
    /// Largest single instance buffer the backend can allocate.
    fn max_buffer_size(&self) -> u64;

    /// Create an instanced drawable with no storage yet.
    fn create_instanced(&mut self, format: RecordFormat) -> InstanceHandle;

    /// Bind the visual mesh drawn for every instance of `handle`.
    fn set_mesh(&mut self, handle: InstanceHandle, mesh: &MeshRef);

    /// Replace the storage of `handle` with a zeroed allocation of
    /// `capacity_bytes`, keeping the first `preserve_bytes` of the old storage.
    fn reallocate(&mut self, handle: InstanceHandle, capacity_bytes: u64, preserve_bytes: u64);

    /// Overwrite `bytes.len()` bytes of storage starting at `offset`.
    fn write(&mut self, handle: InstanceHandle, offset: u64, bytes: &[u8]);

    /// Ask for the owning visual to be redrawn from the current storage.
    fn request_redraw(&mut self, handle: InstanceHandle);

    /// Submit one instanced draw covering the first `instance_count` records.
    fn draw_instanced(&mut self, handle: InstanceHandle, instance_count: u32);

    /// Submit one non-instanced draw of `mesh` placed by `transform`.
    fn draw_immediate(&mut self, mesh: &MeshRef, shape: &ShapeDescriptor, transform: Affine2);

    /// Free every resource behind `handle`. The handle is dead afterwards.
    fn destroy(&mut self, handle: InstanceHandle);
}
