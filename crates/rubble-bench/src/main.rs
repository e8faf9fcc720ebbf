use std::process;

use rubble_bench::cli::{self, Command};
use rubble_bench::report;
use rubble_bench::runner::{BenchmarkResult, BenchmarkRunner};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match cli::parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            eprintln!("{}", cli::USAGE);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{e}\n\n{}", cli::USAGE);
            process::exit(2);
        }
    };
    let scenes = match args.select_scenes() {
        Ok(scenes) => scenes,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    let runner = if args.gpu {
        log::info!("Initializing GPU...");
        BenchmarkRunner::gpu(args.tick_count)
    } else {
        BenchmarkRunner::headless(args.tick_count)
    };
    let results: Vec<BenchmarkResult> = scenes.iter().map(|s| runner.run_scene(s)).collect();

    println!("\n## Cluster Benchmark ({} renderer, {} ticks)\n", runner.renderer_name(), args.tick_count);
    println!("{}", report::format_markdown(&results));

    if let Some(path) = &args.output {
        let baseline = report::Baseline {
            label: format!("bench-{}", process::id()),
            renderer: runner.renderer_name().to_string(),
            results: results.clone(),
        };
        if let Err(e) = report::save_baseline(path, &baseline) {
            log::error!("Could not save baseline to {}: {e}", path.display());
            process::exit(1);
        }
        log::info!("Saved baseline to {}", path.display());
    }

    if let Some(path) = &args.baseline {
        let baseline = match report::load_baseline(path) {
            Ok(Some(baseline)) => baseline,
            Ok(None) => {
                log::warn!("Baseline file not found: {}", path.display());
                return;
            }
            Err(e) => {
                log::error!("Could not load baseline {}: {e}", path.display());
                process::exit(1);
            }
        };
        let regressions = report::compare(
            &results,
            runner.renderer_name(),
            &baseline,
            args.regression_threshold,
        );
        println!("{}", report::format_comparison(&regressions, args.regression_threshold));
        if !regressions.is_empty() {
            process::exit(1);
        }
    }
}
