//! Drives one simulation run end to end: load config, build the engine with
//! the bare (domain-less) collaborators `EngineBuilder::new` already
//! defaults to, run the tick loop, flush enrichment, validate, and write
//! the exported state, statistics and run log to the output directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use worldhist_config::load_engine_config;
use worldhist_engine::Engine;

/// `true` if every validator passed (used for the process exit code).
pub async fn run(config_path: &Path, output_dir: &Path) -> Result<bool> {
    let config = load_engine_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    info!(eras = config.eras.len(), max_ticks = config.max_ticks, "config loaded");

    let mut engine = Engine::builder(config).build();

    engine.run().context("running tick loop")?;
    let dispatched = engine.flush_enrichment().await;
    info!(dispatched, "enrichment queue flushed");

    let report = engine.validate();
    for failure in &report.failures {
        warn!(%failure, "validation failure");
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let exported = engine.export();
    let state_path = output_dir.join("world_state.json");
    let state_json = serde_json::to_string_pretty(&exported).context("serializing exported state")?;
    fs::write(&state_path, state_json).with_context(|| format!("writing {}", state_path.display()))?;

    let stats_path = output_dir.join("statistics.json");
    let stats_json =
        serde_json::to_string_pretty(&exported.statistics).context("serializing statistics")?;
    fs::write(&stats_path, stats_json).with_context(|| format!("writing {}", stats_path.display()))?;

    let log_path = output_dir.join("run.log");
    let log_lines: Vec<String> = exported
        .history
        .iter()
        .map(|event| format!("[tick {}] {:?}: {}", event.tick, event.kind, event.text))
        .collect();
    fs::write(&log_path, log_lines.join("\n"))
        .with_context(|| format!("writing {}", log_path.display()))?;

    if !report.is_valid() {
        error!(failures = report.failures.len(), "run completed with validation failures");
    }
    Ok(report.is_valid())
}
