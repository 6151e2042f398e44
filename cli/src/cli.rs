use std::path::PathBuf;

/// Zone-layout CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "zoneplan", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Optimize zone layouts for a scenario file
    Optimize(OptimizeArgs),

    /// Run the built-in multi-floor demo scenario
    Demo(DemoArgs),
}

#[derive(clap::Args, Debug)]
pub struct OptimizeArgs {
    /// Input scenario file (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub scenario: PathBuf,

    /// Output layouts file, defaults to "./layouts.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub schedule: ScheduleArgs,
}

#[derive(clap::Args, Debug)]
pub struct DemoArgs {
    /// Output layouts file, defaults to "./layouts.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub schedule: ScheduleArgs,
}

/// Coarse-to-fine schedule overrides shared by every run mode.
#[derive(clap::Args, Debug)]
pub struct ScheduleArgs {
    /// Per-stage lattice node targets, coarse to fine
    #[arg(long, value_delimiter = ',', default_values_t = [60usize, 250])]
    pub nodes: Vec<usize>,

    /// Per-stage generation budgets
    #[arg(long, value_delimiter = ',', default_values_t = [60usize, 40])]
    pub generations: Vec<usize>,

    /// Per-stage population sizes
    #[arg(long, value_delimiter = ',', default_values_t = [24usize, 16])]
    pub pop: Vec<usize>,

    /// Number of diverse layouts carried out of the coarse stage
    #[arg(short, long, default_value_t = 3)]
    pub layouts: usize,

    /// Seed of the deterministic random stream
    #[arg(short, long, default_value_t = 0)]
    pub seed: u64,
}
