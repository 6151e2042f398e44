pub mod demo;
pub mod optimize;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use zoneplan::{OptimizationResult, RunParams, run_multi_resolution_optimization};

use crate::cli::ScheduleArgs;
use crate::scenario::Scenario;

/// Run the coarse-to-fine optimization for a scenario, reporting progress
/// to stdout in coarse steps.
pub fn optimize_scenario(
    scenario: &Scenario,
    schedule: &ScheduleArgs,
) -> Result<Vec<OptimizationResult>> {
    let room_data = scenario.room_data()?;
    let params = RunParams {
        target_node_counts: schedule.nodes.clone(),
        generations: schedule.generations.clone(),
        pop_sizes: schedule.pop.clone(),
        total_gfa: scenario.total_gfa,
        num_layouts: schedule.layouts,
        dynamic_rules: scenario.rules.clone(),
        seed: schedule.seed,
        ..Default::default()
    };

    println!(
        "[optimize] {} floors, {} zones, {} stages, {} layouts",
        scenario.floors.len(),
        room_data.codes().len(),
        params.n_stages(),
        params.num_layouts,
    );

    let mut last_decile = 0;
    let mut progress = |fraction: f64| {
        let decile = (fraction * 10.0) as u32;
        if decile > last_decile {
            last_decile = decile;
            println!("[optimize] progress {}%", decile * 10);
        }
    };
    let results = run_multi_resolution_optimization(
        &scenario.floors,
        &room_data,
        &params,
        Some(&mut progress),
    )?;

    for (i, result) in results.iter().enumerate() {
        println!("[optimize] layout {} fitness {:.2}", i + 1, result.fitness);
    }
    Ok(results)
}

pub fn write_layouts(results: &[OptimizationResult], path: &Path) -> Result<()> {
    println!("[optimize] writing {} layouts to {}", results.len(), path.display());
    let json = serde_json::to_string_pretty(results).context("serializing layouts")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
