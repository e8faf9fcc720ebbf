use rubble_core::block_type::{BlockType, BlockTypeDef};
use rubble_core::error::RubbleError;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Block type #{0} has an empty name")]
    EmptyName(usize),
    #[error("Duplicate block type name '{0}'")]
    DuplicateName(String),
    #[error("Block type '{0}' has an empty mesh name")]
    EmptyMesh(String),
    #[error("Block type '{name}' uses mesh '{mesh}' which is not available")]
    UnknownMesh { name: String, mesh: String },
    #[error(transparent)]
    Archetype(#[from] RubbleError),
}

/// Validate archetype definitions before they are registered.
///
/// Collects every problem instead of stopping at the first.
pub fn validate_block_types(defs: &[BlockTypeDef]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen_names = HashSet::new();
    for (i, def) in defs.iter().enumerate() {
        if def.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName(i));
        } else if !seen_names.insert(def.name.as_str()) {
            errors.push(ValidationError::DuplicateName(def.name.clone()));
        }

        if def.mesh.as_str().trim().is_empty() {
            errors.push(ValidationError::EmptyMesh(def.name.clone()));
        }

        // Derivation rules (density XOR mass, durability XOR health, positive area)
        if let Err(e) = BlockType::from_def(def.clone()) {
            errors.push(ValidationError::Archetype(e));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that every archetype's mesh is one the renderer knows about.
pub fn validate_meshes(defs: &[BlockTypeDef], available: &[&str]) -> Result<(), Vec<ValidationError>> {
    let errors: Vec<ValidationError> = defs
        .iter()
        .filter(|def| !available.contains(&def.mesh.as_str()))
        .map(|def| ValidationError::UnknownMesh {
            name: def.name.clone(),
            mesh: def.mesh.as_str().to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{BUILTIN_MESHES, DEFAULT_BLOCKS_RON};
    use crate::loader::load_block_types_from_str;
    use rubble_core::shape::ShapeDescriptor;
    use rubble_core::types::MeshRef;

    fn def(name: &str) -> BlockTypeDef {
        BlockTypeDef::from_density(
            name,
            ShapeDescriptor::square(1.0),
            MeshRef::new("block_square"),
            1.0,
            1.0,
        )
    }

    #[test]
    fn test_valid_defaults_pass() {
        let defs = load_block_types_from_str(DEFAULT_BLOCKS_RON).expect("should parse");
        assert!(validate_block_types(&defs).is_ok());
        assert!(validate_meshes(&defs, &BUILTIN_MESHES).is_ok());
    }

    #[test]
    fn test_duplicate_name_detected() {
        let defs = vec![def("stone"), def("stone")];
        let errors = validate_block_types(&defs).expect_err("duplicate");
        assert_eq!(errors, vec![ValidationError::DuplicateName("stone".into())]);
    }

    #[test]
    fn test_empty_name_and_mesh_detected() {
        let mut bad = def("  ");
        bad.mesh = MeshRef::new("");
        let errors = validate_block_types(&[bad]).expect_err("empty");
        assert!(errors.contains(&ValidationError::EmptyName(0)));
        assert!(errors.contains(&ValidationError::EmptyMesh("  ".into())));
    }

    #[test]
    fn test_all_errors_collected() {
        let mut no_mass = def("a");
        no_mass.density = None;
        let mut no_health = def("b");
        no_health.durability = None;
        let errors = validate_block_types(&[no_mass, no_health]).expect_err("invalid");
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::Archetype(RubbleError::InvalidArchetype { .. }))));
    }

    #[test]
    fn test_unknown_mesh_detected() {
        let mut d = def("crate");
        d.mesh = MeshRef::new("block_crate");
        let errors = validate_meshes(&[d], &BUILTIN_MESHES).expect_err("unknown mesh");
        assert_eq!(
            errors,
            vec![ValidationError::UnknownMesh {
                name: "crate".into(),
                mesh: "block_crate".into(),
            }]
        );
    }
}
