use std::sync::Arc;
use std::time::Instant;

use rubble_core::catalog::BlockCatalog;
use rubble_core::config::WorldConfig;
use rubble_data::defaults::{BUILTIN_MESHES, DEFAULT_BLOCKS_RON, DEFAULT_WORLD_RON};
use rubble_render::backend::RenderBackend;
use rubble_render::gpu::WgpuRenderer;
use rubble_render::memory::MemoryRenderer;
use rubble_sim::{Cluster, MemoryPhysics};

use crate::rng::scripted_contacts;
use crate::scenes::{scene_layout, SceneConfig};

/// Timing data for a single benchmark run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TimingSeries {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of a single scene benchmark.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkResult {
    pub scene_name: String,
    pub block_count: u32,
    /// Blocks disabled by the end of the run.
    pub disabled_blocks: u32,
    pub expand_events: u32,
    pub capacity_bytes: u64,
    pub tick_count: u32,
    /// Time to add every block of the scene.
    pub build_ms: f64,
    pub timings: TimingSeries,
}

/// Runs scenes on the headless renderer, or on a native wgpu device.
pub struct BenchmarkRunner {
    gpu: Option<(wgpu::Device, wgpu::Queue)>,
    catalog: Arc<BlockCatalog>,
    world: WorldConfig,
    tick_count: u32,
}

impl BenchmarkRunner {
    /// Headless runner: instance buffers live in CPU memory.
    pub fn headless(tick_count: u32) -> Self {
        let (catalog, world) = Self::load_world();
        Self {
            gpu: None,
            catalog,
            world,
            tick_count,
        }
    }

    /// Initialize wgpu natively. Blocks on async adapter request.
    pub fn gpu(tick_count: u32) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .expect("no suitable GPU adapter found");

        log::info!("Benchmark adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("bench-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .expect("failed to create device");

        let (catalog, world) = Self::load_world();
        Self {
            gpu: Some((device, queue)),
            catalog,
            world,
            tick_count,
        }
    }

    /// Renderer label stored in saved baselines.
    pub fn renderer_name(&self) -> &'static str {
        if self.gpu.is_some() {
            "gpu"
        } else {
            "headless"
        }
    }

    /// Run a single benchmark scene and return timing results.
    pub fn run_scene(&self, config: &SceneConfig) -> BenchmarkResult {
        log::info!(
            "Running scene '{}' ({} blocks, {} contacts/tick)...",
            config.name,
            config.block_count,
            config.contacts_per_tick
        );

        match &self.gpu {
            Some((device, queue)) => {
                let mut renderer = WgpuRenderer::new(device.clone(), queue.clone());
                self.run_with(config, &mut renderer, |r| {
                    r.take_draws();
                    r.take_lines();
                    r.device().poll(wgpu::Maintain::Wait);
                })
            }
            None => {
                let mut renderer = MemoryRenderer::new();
                self.run_with(config, &mut renderer, MemoryRenderer::clear_frame)
            }
        }
    }

    fn run_with<R: RenderBackend>(
        &self,
        config: &SceneConfig,
        renderer: &mut R,
        end_frame: impl Fn(&mut R),
    ) -> BenchmarkResult {
        let world = WorldConfig {
            draw_mode: config.draw_mode,
            ..self.world
        };
        let mut physics = MemoryPhysics::new();
        let mut cluster = Cluster::new(&mut physics, Arc::clone(&self.catalog), world);

        let layout = scene_layout(config, &self.catalog);
        let build_start = Instant::now();
        for (block_type, transform) in layout {
            cluster
                .add_block(&mut physics, renderer, block_type, transform)
                .expect("failed to add bench block");
        }
        let build_ms = build_start.elapsed().as_secs_f64() * 1000.0;
        log::info!(
            "  Built {} blocks in {:.2}ms",
            cluster.block_count(),
            build_ms
        );

        let mut frame_times = Vec::with_capacity(self.tick_count as usize);
        for tick in 0..self.tick_count {
            let contacts = scripted_contacts(
                config.seed,
                tick,
                cluster.block_count(),
                config.contacts_per_tick,
            );

            let frame_start = Instant::now();

            physics.begin_step();
            cluster.on_physics_step(renderer, &contacts);
            physics.end_step();
            cluster.flush_shape_updates(&mut physics);
            cluster.on_draw_requested(&physics, renderer);
            end_frame(renderer);

            let elapsed = frame_start.elapsed().as_secs_f64() * 1000.0;
            frame_times.push(elapsed);
        }

        let stats = cluster.stats();
        cluster.destroy(&mut physics, renderer);

        let timings = compute_timings(&frame_times);
        log::info!(
            "  Done: mean={:.2}ms, p95={:.2}ms, p99={:.2}ms, {} blocks disabled",
            timings.mean_ms,
            timings.p95_ms,
            timings.p99_ms,
            stats.disabled
        );

        BenchmarkResult {
            scene_name: config.name.clone(),
            block_count: stats.blocks,
            disabled_blocks: stats.disabled,
            expand_events: stats.expand_events,
            capacity_bytes: stats.capacity_bytes,
            tick_count: self.tick_count,
            build_ms,
            timings,
        }
    }

    /// Load and validate the built-in archetypes and world settings.
    fn load_world() -> (Arc<BlockCatalog>, WorldConfig) {
        let defs = rubble_data::loader::load_block_types_from_str(DEFAULT_BLOCKS_RON)
            .expect("failed to parse block RON data");

        if let Err(errors) = rubble_data::validator::validate_meshes(&defs, &BUILTIN_MESHES) {
            for e in &errors {
                log::error!("Block validation error: {e}");
            }
            panic!("Block validation failed with {} errors", errors.len());
        }

        let catalog = rubble_data::loader::build_catalog(defs).expect("invalid block data");
        let world = rubble_data::loader::load_world_config(DEFAULT_WORLD_RON)
            .expect("failed to parse world RON data");
        (Arc::new(catalog), world)
    }
}

/// Compute timing statistics from a list of frame times in milliseconds.
fn compute_timings(times: &[f64]) -> TimingSeries {
    if times.is_empty() {
        return TimingSeries {
            mean_ms: 0.0,
            median_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        };
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p95_idx = ((n as f64) * 0.95).ceil() as usize;
    let p99_idx = ((n as f64) * 0.99).ceil() as usize;

    TimingSeries {
        mean_ms: mean,
        median_ms: median,
        p95_ms: sorted[p95_idx.min(n - 1)],
        p99_ms: sorted[p99_idx.min(n - 1)],
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubble_core::config::DrawMode;

    #[test]
    fn test_timings_of_known_series() {
        let times: Vec<f64> = (1..=10).map(f64::from).collect();
        let t = compute_timings(&times);
        assert_eq!(t.mean_ms, 5.5);
        assert_eq!(t.median_ms, 5.5);
        assert_eq!(t.min_ms, 1.0);
        assert_eq!(t.max_ms, 10.0);
        assert_eq!(t.p95_ms, 10.0);
    }

    #[test]
    fn test_empty_timings_are_zero() {
        assert_eq!(compute_timings(&[]).mean_ms, 0.0);
    }

    #[test]
    fn test_headless_scene_runs() {
        let runner = BenchmarkRunner::headless(20);
        let scene = SceneConfig {
            name: "tiny".into(),
            block_count: 200,
            contacts_per_tick: 40,
            draw_mode: DrawMode::Batched,
            seed: 9,
        };
        let result = runner.run_scene(&scene);
        assert_eq!(result.block_count, 200);
        assert_eq!(result.tick_count, 20);
        assert!(result.disabled_blocks > 0);
        assert!(result.expand_events > 0);
    }
}
