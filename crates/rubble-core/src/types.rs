use serde::{Deserialize, Serialize};

/// Index into the BlockType catalog. Assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BlockTypeId(pub u32);

impl BlockTypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position of a block in its cluster's block list.
///
/// The same integer is the block's collision-shape index on the cluster body.
/// Ids are handed out in append order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Collision-shape index on the owning body.
    pub fn shape_index(self) -> u32 {
        self.0
    }
}

/// Position of a record inside one Growable Instance Buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct InstanceSlot(pub u32);

impl InstanceSlot {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque handle to a rigid body owned by the physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u64);

/// Opaque handle to an instanced drawable owned by the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub u64);

/// Name of a visual mesh known to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshRef(pub String);

impl MeshRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One contact reported by the physics collaborator for a cluster body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Index of the touched shape on the body (equal to the block id).
    pub shape_index: u32,
    /// Impulse magnitude of the contact.
    pub impact: f32,
}

impl Contact {
    pub fn new(shape_index: u32, impact: f32) -> Self {
        Self {
            shape_index,
            impact,
        }
    }

    /// Block hit by this contact.
    pub fn block_id(&self) -> BlockId {
        BlockId(self.shape_index)
    }
}
