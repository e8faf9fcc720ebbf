pub mod block_type;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod math;
pub mod shape;
pub mod types;

pub use block_type::{BlockType, BlockTypeDef};
pub use catalog::BlockCatalog;
pub use config::{DamageModel, DrawMode, RecordFormat, TransformFormat, WorldConfig};
pub use error::RubbleError;
pub use shape::ShapeDescriptor;
pub use types::{BlockId, BlockTypeId, BodyHandle, Contact, InstanceHandle, InstanceSlot, MeshRef};
