use rubble_core::block_type::BlockTypeDef;
use rubble_core::catalog::BlockCatalog;
use rubble_core::config::WorldConfig;
use thiserror::Error;

use crate::validator::{validate_block_types, ValidationError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to parse block types RON: {0}")]
    BlockTypeParseError(String),
    #[error("Failed to parse world config RON: {0}")]
    WorldConfigParseError(String),
    #[error("Block type data failed validation ({} errors)", .0.len())]
    Invalid(Vec<ValidationError>),
}

/// Parse a single block-type RON string into archetype definitions.
pub fn load_block_types_from_str(ron_str: &str) -> Result<Vec<BlockTypeDef>, LoadError> {
    let options = ron::Options::default();
    options
        .from_str(ron_str)
        .map_err(|e| LoadError::BlockTypeParseError(e.to_string()))
}

/// Load and concatenate several block-type sources, preserving order.
pub fn load_all_block_types(sources: &[&str]) -> Result<Vec<BlockTypeDef>, LoadError> {
    let mut all_defs = Vec::new();
    for source in sources {
        all_defs.extend(load_block_types_from_str(source)?);
    }
    Ok(all_defs)
}

/// Parse the world configuration from a RON string.
pub fn load_world_config(ron_str: &str) -> Result<WorldConfig, LoadError> {
    let options = ron::Options::default();
    options
        .from_str(ron_str)
        .map_err(|e| LoadError::WorldConfigParseError(e.to_string()))
}

/// Validate definitions and register them into a fresh catalog.
///
/// Nothing is registered unless every definition is valid, so catalog ids
/// always match the definition order.
pub fn build_catalog(defs: Vec<BlockTypeDef>) -> Result<BlockCatalog, LoadError> {
    validate_block_types(&defs).map_err(LoadError::Invalid)?;

    let mut catalog = BlockCatalog::new();
    for def in defs {
        catalog
            .register_def(def)
            .map_err(|e| LoadError::Invalid(vec![ValidationError::Archetype(e)]))?;
    }
    log::info!("Block catalog: {} archetypes registered", catalog.len());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubble_core::config::{DamageModel, DrawMode};
    use rubble_core::types::BlockTypeId;

    #[test]
    fn test_load_single_block_type() {
        let ron = r#"[
            (
                name: "stone",
                shape: Rect(width: 5.0, height: 5.0),
                mesh: "block_square",
                density: Some(1.0),
                durability: Some(1.0),
            ),
        ]"#;
        let defs = load_block_types_from_str(ron).expect("should parse");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "stone");
        assert_eq!(defs[0].scale, 1.0);
        assert!(!defs[0].weak);
    }

    #[test]
    fn test_malformed_ron_rejected() {
        let ron = r#"[this is not valid RON {"#;
        assert!(matches!(
            load_block_types_from_str(ron),
            Err(LoadError::BlockTypeParseError(_))
        ));
    }

    #[test]
    fn test_load_all_merges_in_order() {
        let src1 = r#"[(name: "a", shape: Circle(radius: 1.0), mesh: "m", mass: Some(1.0), health: Some(1.0))]"#;
        let src2 = r#"[(name: "b", shape: Circle(radius: 2.0), mesh: "m", mass: Some(1.0), health: Some(1.0))]"#;
        let defs = load_all_block_types(&[src1, src2]).expect("should merge");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[1].name, "b");
    }

    #[test]
    fn test_build_catalog_derives_properties() {
        let ron = r#"[
            (name: "stone", shape: Rect(width: 5.0, height: 5.0), mesh: "m",
             density: Some(1.0), durability: Some(1.0)),
        ]"#;
        let catalog = build_catalog(load_block_types_from_str(ron).expect("parse")).expect("valid");
        let stone = catalog.get(BlockTypeId(0)).expect("registered");
        assert_eq!(stone.mass(), 25.0);
        assert_eq!(stone.health(), 25.0);
    }

    #[test]
    fn test_build_catalog_rejects_whole_set() {
        let ron = r#"[
            (name: "ok", shape: Circle(radius: 1.0), mesh: "m", mass: Some(1.0), health: Some(1.0)),
            (name: "bad", shape: Circle(radius: 1.0), mesh: "m", health: Some(1.0)),
        ]"#;
        let result = build_catalog(load_block_types_from_str(ron).expect("parse"));
        match result {
            Err(LoadError::Invalid(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_world_config_defaults_fill_in() {
        let config = load_world_config("(draw_mode: Immediate)").expect("should parse");
        assert_eq!(config.draw_mode, DrawMode::Immediate);
        assert_eq!(config.initial_instance_capacity, 8);
        assert_eq!(config.damage, DamageModel::default());
    }

    #[test]
    fn test_world_config_unknown_mode_rejected() {
        let result = load_world_config("(draw_mode: Wireframe)");
        assert!(matches!(result, Err(LoadError::WorldConfigParseError(_))));
    }
}
