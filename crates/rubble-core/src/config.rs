use serde::{Deserialize, Serialize};

use crate::constants::{
    COLOR_FLOATS, CUSTOM_DATA_FLOATS, DEFAULT_DAMAGE_PER_CONTACT, FLOAT_BYTES,
    INITIAL_INSTANCE_CAPACITY, TRANSFORM_2D_FLOATS, TRANSFORM_3D_FLOATS,
};
use crate::error::RubbleError;

/// How clusters submit their blocks to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum DrawMode {
    /// One instanced draw per BlockType buffer.
    #[default]
    Batched = 0,
    /// One draw per block, placed from the collision shape's transform.
    Immediate = 1,
}

impl TryFrom<u32> for DrawMode {
    type Error = RubbleError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(DrawMode::Batched),
            1 => Ok(DrawMode::Immediate),
            other => Err(RubbleError::UnsupportedDrawMode(other)),
        }
    }
}

/// Encoding of the transform at the start of every instance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransformFormat {
    /// 2D affine as two vec4 rows.
    #[default]
    Transform2D,
    /// 3D affine as three vec4 rows; 2D transforms are embedded in the XY plane.
    Transform3D,
}

impl TransformFormat {
    pub fn floats(self) -> u32 {
        match self {
            TransformFormat::Transform2D => TRANSFORM_2D_FLOATS,
            TransformFormat::Transform3D => TRANSFORM_3D_FLOATS,
        }
    }
}

/// Per-instance record layout: transform, then optional color, then optional
/// custom data. Fixed for the lifetime of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordFormat {
    pub transform: TransformFormat,
    #[serde(default)]
    pub color: bool,
    #[serde(default)]
    pub custom_data: bool,
}

impl RecordFormat {
    /// Floats in one record.
    pub fn floats(&self) -> u32 {
        let mut floats = self.transform.floats();
        if self.color {
            floats += COLOR_FLOATS;
        }
        if self.custom_data {
            floats += CUSTOM_DATA_FLOATS;
        }
        floats
    }

    /// Bytes in one record.
    pub fn stride(&self) -> u64 {
        (self.floats() * FLOAT_BYTES) as u64
    }

    /// Float offset of the color block, if present.
    pub fn color_offset(&self) -> Option<u32> {
        self.color.then(|| self.transform.floats())
    }

    /// Float offset of the custom data block, if present.
    pub fn custom_data_offset(&self) -> Option<u32> {
        self.custom_data.then(|| {
            let mut offset = self.transform.floats();
            if self.color {
                offset += COLOR_FLOATS;
            }
            offset
        })
    }
}

/// How a reported contact turns into lost health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DamageModel {
    /// Every contact removes the same amount, whatever its impact.
    FixedPerContact { amount: f32 },
    /// Every contact removes `impact * factor`.
    ImpactScaled { factor: f32 },
}

impl Default for DamageModel {
    fn default() -> Self {
        DamageModel::FixedPerContact {
            amount: DEFAULT_DAMAGE_PER_CONTACT,
        }
    }
}

impl DamageModel {
    /// Health removed by one contact of the given impact magnitude.
    pub fn damage(&self, impact: f32) -> f32 {
        match *self {
            DamageModel::FixedPerContact { amount } => amount,
            DamageModel::ImpactScaled { factor } => impact.abs() * factor,
        }
    }
}

fn default_initial_capacity() -> u32 {
    INITIAL_INSTANCE_CAPACITY
}

/// World-level settings shared by every cluster of a world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub draw_mode: DrawMode,
    /// Instances reserved when a BlockType is first used by a cluster.
    #[serde(default = "default_initial_capacity")]
    pub initial_instance_capacity: u32,
    #[serde(default)]
    pub damage: DamageModel,
    #[serde(default)]
    pub record_format: RecordFormat,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            draw_mode: DrawMode::default(),
            initial_instance_capacity: INITIAL_INSTANCE_CAPACITY,
            damage: DamageModel::default(),
            record_format: RecordFormat::default(),
        }
    }
}
