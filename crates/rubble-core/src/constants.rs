//! Single source of truth for shared constants.
//! Record sizes here must agree with the instance vertex layout the
//! host's shaders declare.

/// Instances reserved when a cluster first uses a BlockType.
pub const INITIAL_INSTANCE_CAPACITY: u32 = 8;

/// Health removed per reported contact under the default damage model.
pub const DEFAULT_DAMAGE_PER_CONTACT: f32 = 1.0;

/// Floats in one encoded 2D affine transform (two vec4 rows).
pub const TRANSFORM_2D_FLOATS: u32 = 8;

/// Floats in one encoded 3D affine transform (three vec4 rows).
pub const TRANSFORM_3D_FLOATS: u32 = 12;

/// Floats in the optional per-instance color (RGBA).
pub const COLOR_FLOATS: u32 = 4;

/// Floats in the optional per-instance custom data block.
pub const CUSTOM_DATA_FLOATS: u32 = 4;

/// Bytes per encoded float.
pub const FLOAT_BYTES: u32 = 4;

/// Color written for every new instance when the format carries color.
pub const DEFAULT_INSTANCE_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
