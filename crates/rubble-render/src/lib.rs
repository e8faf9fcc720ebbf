pub mod backend;
pub mod gpu;
pub mod instance_buffer;
pub mod memory;
pub mod outline;

pub use backend::RenderBackend;
pub use gpu::{DrawCommand, WgpuRenderer};
pub use instance_buffer::{expanded_capacity, GrowableInstanceBuffer};
pub use memory::MemoryRenderer;
pub use outline::LineVertex;
