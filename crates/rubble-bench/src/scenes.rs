use glam::{Affine2, Vec2};
use rubble_core::catalog::BlockCatalog;
use rubble_core::config::DrawMode;
use rubble_core::types::BlockTypeId;

use crate::rng::bench_hash;

/// Grid pitch between block centers, in world units.
const GRID_PITCH: f32 = 6.0;

/// Configuration for a single benchmark scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub name: String,
    /// Blocks added to the single cluster of the scene.
    pub block_count: u32,
    /// Contacts reported per physics step.
    pub contacts_per_tick: u32,
    pub draw_mode: DrawMode,
    /// Seed for layout and contacts.
    pub seed: u32,
}

/// Return the standard suite of benchmark scenes (1K to 100K blocks).
pub fn standard_scenes() -> Vec<SceneConfig> {
    vec![
        SceneConfig {
            name: "1K".into(),
            block_count: 1_000,
            contacts_per_tick: 50,
            draw_mode: DrawMode::Batched,
            seed: 1,
        },
        SceneConfig {
            name: "10K".into(),
            block_count: 10_000,
            contacts_per_tick: 500,
            draw_mode: DrawMode::Batched,
            seed: 2,
        },
        SceneConfig {
            name: "50K".into(),
            block_count: 50_000,
            contacts_per_tick: 2_500,
            draw_mode: DrawMode::Batched,
            seed: 3,
        },
        SceneConfig {
            name: "100K".into(),
            block_count: 100_000,
            contacts_per_tick: 5_000,
            draw_mode: DrawMode::Batched,
            seed: 4,
        },
        SceneConfig {
            name: "1K-immediate".into(),
            block_count: 1_000,
            contacts_per_tick: 50,
            draw_mode: DrawMode::Immediate,
            seed: 1,
        },
    ]
}

impl SceneConfig {
    /// Same scene with a different block count. Contacts per tick scale with
    /// the block count so the break rate stays comparable.
    pub fn with_block_count(&self, block_count: u32) -> SceneConfig {
        let contacts_per_tick = (self.contacts_per_tick as u64 * block_count as u64
            / self.block_count.max(1) as u64)
            .max(1) as u32;
        SceneConfig {
            name: format!("{}@{}", self.name, block_count),
            block_count,
            contacts_per_tick,
            ..self.clone()
        }
    }
}

/// Deterministic placement of a scene's blocks on a square grid.
///
/// Archetypes are drawn from the whole catalog with a hash of the block
/// index, so every scene mixes all BlockTypes.
pub fn scene_layout(config: &SceneConfig, catalog: &BlockCatalog) -> Vec<(BlockTypeId, Affine2)> {
    let type_count = catalog.len() as u32;
    if type_count == 0 {
        return Vec::new();
    }
    let columns = (config.block_count as f32).sqrt().ceil().max(1.0) as u32;

    (0..config.block_count)
        .map(|i| {
            let block_type = BlockTypeId(bench_hash(config.seed, 0, i) % type_count);
            let position = Vec2::new((i % columns) as f32, (i / columns) as f32) * GRID_PITCH;
            (block_type, Affine2::from_translation(position))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubble_data::defaults::DEFAULT_BLOCKS_RON;
    use rubble_data::loader::{build_catalog, load_block_types_from_str};

    fn catalog() -> BlockCatalog {
        build_catalog(load_block_types_from_str(DEFAULT_BLOCKS_RON).expect("parse")).expect("valid")
    }

    #[test]
    fn test_layout_matches_block_count() {
        let catalog = catalog();
        for scene in standard_scenes().iter().take(2) {
            let layout = scene_layout(scene, &catalog);
            assert_eq!(layout.len(), scene.block_count as usize);
            assert!(layout.iter().all(|(t, _)| catalog.contains(*t)));
        }
    }

    #[test]
    fn test_layout_deterministic() {
        let catalog = catalog();
        let scene = &standard_scenes()[0];
        let a: Vec<BlockTypeId> = scene_layout(scene, &catalog).into_iter().map(|(t, _)| t).collect();
        let b: Vec<BlockTypeId> = scene_layout(scene, &catalog).into_iter().map(|(t, _)| t).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_block_count_override_scales_contacts() {
        let scene = standard_scenes()[1].with_block_count(2_000);
        assert_eq!(scene.name, "10K@2000");
        assert_eq!(scene.block_count, 2_000);
        assert_eq!(scene.contacts_per_tick, 100);
        assert_eq!(standard_scenes()[0].with_block_count(1).contacts_per_tick, 1);
    }

    #[test]
    fn test_empty_catalog_has_no_layout() {
        let scene = &standard_scenes()[0];
        assert!(scene_layout(scene, &BlockCatalog::new()).is_empty());
    }
}
