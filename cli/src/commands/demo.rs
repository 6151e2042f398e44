use anyhow::Result;

use crate::commands::{optimize_scenario, write_layouts};
use crate::scenario::Scenario;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::DemoArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./layouts.json".into());

    println!("[demo] running the built-in five-level scenario");
    let scenario = Scenario::demo();
    let results = optimize_scenario(&scenario, &args.schedule)?;
    write_layouts(&results, &out_path)
}
