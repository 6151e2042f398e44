mod individual;
mod optimizer;
mod params;

pub use individual::Individual;
pub use optimizer::GeneticOptimizer;
pub use params::GaParams;
