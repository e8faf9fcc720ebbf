pub mod allocator;
pub mod block;
pub mod cluster;
pub mod deferred;
pub mod physics;

pub use allocator::{BlockAllocator, Reservation};
pub use block::{Block, BlockState};
pub use cluster::{Cluster, ClusterStats};
pub use deferred::{ShapeUpdate, ShapeUpdateQueue};
pub use physics::{MemoryPhysics, PhysicsBackend};
