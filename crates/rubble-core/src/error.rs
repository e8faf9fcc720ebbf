use thiserror::Error;

/// Recoverable failures surfaced to callers of the block-management core.
///
/// Index contract violations (instance slot past the live count, block id
/// past the block count) are not represented here: they panic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RubbleError {
    #[error("BlockType id {id} is not registered (catalog holds {registered} types)")]
    InvalidReference { id: u32, registered: u32 },

    #[error("BlockType '{name}' is invalid: {reason}")]
    InvalidArchetype { name: String, reason: String },

    #[error("instance buffer of {requested} bytes exceeds the backend limit of {max} bytes")]
    OutOfMemory { requested: u64, max: u64 },

    #[error("unsupported draw mode {0}")]
    UnsupportedDrawMode(u32),
}
