mod evaluator;
mod targets;
mod type_map;

pub use evaluator::FitnessEvaluator;
pub(crate) use targets::target_counts;
pub use type_map::TypeIndexMap;
