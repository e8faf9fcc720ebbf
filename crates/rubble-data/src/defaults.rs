//! Data shipped with the crate: the built-in archetypes and world settings.

/// Built-in archetype definitions (RON).
pub const DEFAULT_BLOCKS_RON: &str = include_str!("../../../data/blocks.ron");

/// Default world configuration (RON).
pub const DEFAULT_WORLD_RON: &str = include_str!("../../../data/world.ron");

/// Mesh names the built-in archetypes refer to.
pub const BUILTIN_MESHES: [&str; 4] = ["block_square", "block_plank", "block_round", "block_wedge"];
