use std::fs;

use anyhow::{Context, Result};

use crate::commands::{optimize_scenario, write_layouts};
use crate::scenario::Scenario;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::OptimizeArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./layouts.json".into());

    println!("[optimize] loading scenario from {}", args.scenario.display());
    let text = fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.scenario.display()))?;

    let results = optimize_scenario(&scenario, &args.schedule)?;
    write_layouts(&results, &out_path)
}
