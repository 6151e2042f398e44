mod discretize;
mod point;
mod scaling;

pub use discretize::{DiscretizationResult, discretize};
pub(crate) use point::IndexedPoint;
pub use scaling::ScalingInfo;
