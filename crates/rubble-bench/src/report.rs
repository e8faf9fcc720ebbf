use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::runner::BenchmarkResult;

/// Results of one full run, as saved with `--output`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Baseline {
    pub label: String,
    /// `headless` or `gpu`; timings of different renderers are not compared.
    pub renderer: String,
    pub results: Vec<BenchmarkResult>,
}

#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("baseline I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("baseline is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a baseline. A missing file is `Ok(None)`; an unreadable or corrupt
/// one is an error.
pub fn load_baseline(path: &Path) -> Result<Option<Baseline>, BaselineError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&contents)?))
}

pub fn save_baseline(path: &Path, baseline: &Baseline) -> Result<(), BaselineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(baseline)?)?;
    Ok(())
}

/// What changed between a baseline scene and the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Mean tick time, over the threshold.
    TickMean,
    /// Time to add every block, over the threshold.
    Build,
    /// More Expand events for the same block count.
    ExpandEvents,
    /// More instance buffer bytes for the same block count.
    Capacity,
    /// A different number of broken blocks for the same seed and ticks.
    Disabled,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::TickMean => "tick mean (ms)",
            Metric::Build => "build (ms)",
            Metric::ExpandEvents => "expand events",
            Metric::Capacity => "capacity (bytes)",
            Metric::Disabled => "disabled blocks",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Regression {
    pub scene: String,
    pub metric: Metric,
    pub baseline: f64,
    pub current: f64,
}

impl Regression {
    pub fn pct_change(&self) -> f64 {
        if self.baseline == 0.0 {
            return 0.0;
        }
        (self.current - self.baseline) / self.baseline * 100.0
    }
}

/// Compare a run against a baseline scene by scene.
///
/// Timings regress past `threshold_pct` and are only compared when both runs
/// used `renderer`. Buffer growth counts are exact for a given block count,
/// so any increase is reported; the disabled count is exact for a given seed
/// and tick count, so any change is reported.
pub fn compare(
    current: &[BenchmarkResult],
    renderer: &str,
    baseline: &Baseline,
    threshold_pct: f64,
) -> Vec<Regression> {
    let mut regressions = Vec::new();
    let same_renderer = baseline.renderer == renderer;
    if !same_renderer {
        log::warn!(
            "Baseline was recorded on '{}', current run on '{}': timings not compared",
            baseline.renderer,
            renderer
        );
    }

    for result in current {
        let Some(base) = baseline
            .results
            .iter()
            .find(|b| b.scene_name == result.scene_name)
        else {
            log::info!("Scene '{}' not in baseline, skipped", result.scene_name);
            continue;
        };
        let mut flag = |metric, from: f64, to: f64| {
            regressions.push(Regression {
                scene: result.scene_name.clone(),
                metric,
                baseline: from,
                current: to,
            })
        };

        for (metric, base_ms, cur_ms) in [
            (Metric::TickMean, base.timings.mean_ms, result.timings.mean_ms),
            (Metric::Build, base.build_ms, result.build_ms),
        ] {
            if same_renderer && base_ms > 0.0 && (cur_ms - base_ms) / base_ms * 100.0 > threshold_pct {
                flag(metric, base_ms, cur_ms);
            }
        }

        if base.block_count == result.block_count {
            if result.expand_events > base.expand_events {
                flag(
                    Metric::ExpandEvents,
                    base.expand_events as f64,
                    result.expand_events as f64,
                );
            }
            if result.capacity_bytes > base.capacity_bytes {
                flag(
                    Metric::Capacity,
                    base.capacity_bytes as f64,
                    result.capacity_bytes as f64,
                );
            }
            if base.tick_count == result.tick_count && base.disabled_blocks != result.disabled_blocks {
                flag(
                    Metric::Disabled,
                    base.disabled_blocks as f64,
                    result.disabled_blocks as f64,
                );
            }
        }
    }

    regressions
}

/// Format results as a markdown summary table.
pub fn format_markdown(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();
    out.push_str("| Scene | Blocks | Disabled | Expands | Capacity (KiB) | Build (ms) | Mean (ms) | Median (ms) | P95 (ms) | P99 (ms) | Max (ms) |\n");
    out.push_str("|-------|--------|----------|---------|----------------|------------|-----------|-------------|----------|----------|----------|\n");

    for r in results {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {:.1} | {:.2} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} |\n",
            r.scene_name,
            r.block_count,
            r.disabled_blocks,
            r.expand_events,
            r.capacity_bytes as f64 / 1024.0,
            r.build_ms,
            r.timings.mean_ms,
            r.timings.median_ms,
            r.timings.p95_ms,
            r.timings.p99_ms,
            r.timings.max_ms,
        ));
    }

    out
}

/// Markdown table of the regressions, or a one-line all-clear.
pub fn format_comparison(regressions: &[Regression], threshold_pct: f64) -> String {
    if regressions.is_empty() {
        return format!("No regressions: timings within {threshold_pct:.0}%, buffer growth and breakage unchanged.\n");
    }

    let mut out = format!("### Regressions ({})\n\n", regressions.len());
    out.push_str("| Scene | Metric | Baseline | Current | Change |\n");
    out.push_str("|-------|--------|----------|---------|--------|\n");
    for r in regressions {
        out.push_str(&format!(
            "| {} | {} | {:.3} | {:.3} | {:+.1}% |\n",
            r.scene,
            r.metric,
            r.baseline,
            r.current,
            r.pct_change()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::TimingSeries;

    fn result(name: &str, mean_ms: f64) -> BenchmarkResult {
        BenchmarkResult {
            scene_name: name.to_string(),
            block_count: 100,
            disabled_blocks: 3,
            expand_events: 4,
            capacity_bytes: 4096,
            tick_count: 10,
            build_ms: 1.0,
            timings: TimingSeries {
                mean_ms,
                median_ms: mean_ms,
                p95_ms: mean_ms,
                p99_ms: mean_ms,
                min_ms: mean_ms,
                max_ms: mean_ms,
            },
        }
    }

    fn baseline(results: Vec<BenchmarkResult>) -> Baseline {
        Baseline {
            label: "t".into(),
            renderer: "headless".into(),
            results,
        }
    }

    #[test]
    fn test_compare_flags_slower_scenes() {
        let base = baseline(vec![result("1K", 1.0), result("10K", 2.0)]);
        let current = vec![result("1K", 1.05), result("10K", 3.0), result("new", 9.0)];
        let regressions = compare(&current, "headless", &base, 10.0);
        assert_eq!(regressions.len(), 1);
        assert_eq!(regressions[0].scene, "10K");
        assert_eq!(regressions[0].metric, Metric::TickMean);
        assert!((regressions[0].pct_change() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_compare_flags_slower_build() {
        let base = baseline(vec![result("1K", 1.0)]);
        let mut slow = result("1K", 1.0);
        slow.build_ms = 1.5;
        let regressions = compare(&[slow], "headless", &base, 10.0);
        assert_eq!(regressions.len(), 1);
        assert_eq!(regressions[0].metric, Metric::Build);
    }

    #[test]
    fn test_compare_flags_buffer_growth_and_breakage_drift() {
        let base = baseline(vec![result("1K", 1.0)]);
        let mut drifted = result("1K", 1.0);
        drifted.expand_events = 5;
        drifted.capacity_bytes = 8192;
        drifted.disabled_blocks = 2;
        let metrics: Vec<Metric> = compare(&[drifted.clone()], "headless", &base, 10.0)
            .into_iter()
            .map(|r| r.metric)
            .collect();
        assert_eq!(metrics, vec![Metric::ExpandEvents, Metric::Capacity, Metric::Disabled]);

        // Different block count: counts are not comparable.
        drifted.block_count = 200;
        assert!(compare(&[drifted], "headless", &base, 10.0).is_empty());
    }

    #[test]
    fn test_timings_of_other_renderer_not_compared() {
        let base = baseline(vec![result("1K", 1.0)]);
        let mut slow = result("1K", 5.0);
        slow.build_ms = 5.0;
        assert!(compare(&[slow.clone()], "gpu", &base, 10.0).is_empty());
        slow.expand_events = 6;
        let regressions = compare(&[slow], "gpu", &base, 10.0);
        assert_eq!(regressions.len(), 1);
        assert_eq!(regressions[0].metric, Metric::ExpandEvents);
    }

    #[test]
    fn test_markdown_has_row_per_scene() {
        let md = format_markdown(&[result("1K", 1.0), result("10K", 2.0)]);
        assert_eq!(md.lines().count(), 4);
        assert!(md.contains("| 1K | 100 | 3 | 4 | 4.0 |"));
    }

    #[test]
    fn test_comparison_table_lists_metric() {
        let regression = Regression {
            scene: "10K".into(),
            metric: Metric::ExpandEvents,
            baseline: 4.0,
            current: 5.0,
        };
        let text = format_comparison(&[regression], 10.0);
        assert!(text.contains("| 10K | expand events | 4.000 | 5.000 | +25.0% |"));
        assert!(format_comparison(&[], 10.0).starts_with("No regressions"));
    }

    #[test]
    fn test_baseline_json_roundtrip() {
        let dir = std::env::temp_dir().join(format!("rubble-bench-{}", std::process::id()));
        let path = dir.join("baseline.json");
        save_baseline(&path, &baseline(vec![result("1K", 1.5)])).expect("save");
        let loaded = load_baseline(&path).expect("readable").expect("present");
        assert_eq!(loaded.renderer, "headless");
        assert_eq!(loaded.results[0].timings.mean_ms, 1.5);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_baseline_is_none_corrupt_is_error() {
        assert!(load_baseline(Path::new("/nonexistent/rubble/baseline.json"))
            .expect("missing is not an error")
            .is_none());

        let path = std::env::temp_dir().join(format!("rubble-corrupt-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").expect("write");
        assert!(matches!(load_baseline(&path), Err(BaselineError::Json(_))));
        let _ = std::fs::remove_file(path);
    }
}
