use serde::{Deserialize, Serialize};

use crate::error::RubbleError;
use crate::shape::ShapeDescriptor;
use crate::types::MeshRef;

fn default_scale() -> f32 {
    1.0
}

/// A BlockType as authored in RON, before derivation.
///
/// Exactly one of `density`/`mass` and exactly one of `durability`/`health`
/// must be given; the other member of each pair is derived through the area
/// of the scaled shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockTypeDef {
    /// Human-readable archetype name, unique within a catalog.
    pub name: String,
    /// Unscaled collision geometry.
    pub shape: ShapeDescriptor,
    /// Visual mesh bound to the instance buffer of this archetype.
    pub mesh: MeshRef,
    /// Uniform scale applied to `shape` before any derivation.
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub density: Option<f32>,
    #[serde(default)]
    pub mass: Option<f32>,
    #[serde(default)]
    pub durability: Option<f32>,
    #[serde(default)]
    pub health: Option<f32>,
    /// Weak blocks break on their first contact regardless of health.
    #[serde(default)]
    pub weak: bool,
}

impl BlockTypeDef {
    /// Definition derived from density and durability, the common authoring path.
    pub fn from_density(
        name: impl Into<String>,
        shape: ShapeDescriptor,
        mesh: MeshRef,
        density: f32,
        durability: f32,
    ) -> Self {
        Self {
            name: name.into(),
            shape,
            mesh,
            scale: 1.0,
            density: Some(density),
            mass: None,
            durability: Some(durability),
            health: None,
            weak: false,
        }
    }
}

/// Immutable archetype shared by every Block that references it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockType {
    name: String,
    shape: ShapeDescriptor,
    mesh: MeshRef,
    scale: f32,
    durability: f32,
    density: f32,
    area: f32,
    mass: f32,
    health: f32,
    weak: bool,
}

impl BlockType {
    /// Validate a definition and derive the missing physical properties.
    pub fn from_def(def: BlockTypeDef) -> Result<Self, RubbleError> {
        let invalid = |reason: &str| RubbleError::InvalidArchetype {
            name: def.name.clone(),
            reason: reason.to_string(),
        };

        if !(def.scale.is_finite() && def.scale > 0.0) {
            return Err(invalid("scale must be positive"));
        }

        let shape = def.shape.scaled(def.scale);
        let area = shape.area();
        if !(area.is_finite() && area > 0.0) {
            return Err(invalid("shape encloses no area"));
        }

        let (density, mass) = match (def.density, def.mass) {
            (Some(density), None) if density > 0.0 => (density, density * area),
            (None, Some(mass)) if mass > 0.0 => (mass / area, mass),
            (Some(_), None) => return Err(invalid("density must be positive")),
            (None, Some(_)) => return Err(invalid("mass must be positive")),
            _ => return Err(invalid("exactly one of density or mass must be given")),
        };

        let (durability, health) = match (def.durability, def.health) {
            (Some(durability), None) if durability > 0.0 => (durability, durability * area),
            (None, Some(health)) if health > 0.0 => (health / area, health),
            (Some(_), None) => return Err(invalid("durability must be positive")),
            (None, Some(_)) => return Err(invalid("health must be positive")),
            _ => return Err(invalid("exactly one of durability or health must be given")),
        };

        Ok(Self {
            name: def.name,
            shape,
            mesh: def.mesh,
            scale: def.scale,
            durability,
            density,
            area,
            mass,
            health,
            weak: def.weak,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collision geometry with `scale` already applied.
    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    pub fn mesh(&self) -> &MeshRef {
        &self.mesh
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn durability(&self) -> f32 {
        self.durability
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Health a fresh block of this type starts with.
    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_def() -> BlockTypeDef {
        BlockTypeDef::from_density(
            "stone",
            ShapeDescriptor::square(5.0),
            MeshRef::new("stone"),
            1.0,
            1.0,
        )
    }

    #[test]
    fn test_derive_from_density_and_durability() {
        let bt = BlockType::from_def(square_def()).expect("valid");
        assert_eq!(bt.area(), 25.0);
        assert_eq!(bt.mass(), 25.0);
        assert_eq!(bt.health(), 25.0);
    }

    #[test]
    fn test_derive_from_mass_and_health() {
        let def = BlockTypeDef {
            density: None,
            mass: Some(50.0),
            durability: None,
            health: Some(100.0),
            ..square_def()
        };
        let bt = BlockType::from_def(def).expect("valid");
        assert_eq!(bt.density(), 2.0);
        assert_eq!(bt.durability(), 4.0);
    }

    #[test]
    fn test_scale_applies_before_derivation() {
        let def = BlockTypeDef {
            scale: 2.0,
            ..square_def()
        };
        let bt = BlockType::from_def(def).expect("valid");
        assert_eq!(bt.area(), 100.0);
        assert_eq!(bt.shape(), &ShapeDescriptor::square(10.0));
    }

    #[test]
    fn test_density_and_mass_both_given_rejected() {
        let def = BlockTypeDef {
            mass: Some(10.0),
            ..square_def()
        };
        assert!(matches!(
            BlockType::from_def(def),
            Err(RubbleError::InvalidArchetype { .. })
        ));
    }

    #[test]
    fn test_neither_durability_nor_health_rejected() {
        let def = BlockTypeDef {
            durability: None,
            ..square_def()
        };
        assert!(BlockType::from_def(def).is_err());
    }

    #[test]
    fn test_non_positive_density_rejected() {
        let def = BlockTypeDef {
            density: Some(0.0),
            ..square_def()
        };
        let err = BlockType::from_def(def).expect_err("zero density");
        assert_eq!(
            err,
            RubbleError::InvalidArchetype {
                name: "stone".into(),
                reason: "density must be positive".into(),
            }
        );
    }

    #[test]
    fn test_zero_area_rejected() {
        let def = BlockTypeDef {
            shape: ShapeDescriptor::Rect {
                width: 0.0,
                height: 3.0,
            },
            ..square_def()
        };
        assert!(BlockType::from_def(def).is_err());
    }
}
