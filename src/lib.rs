#![doc = "Zoneplan public API"]
mod error;
mod fitness;
mod geom;
mod graph;
mod multires;
mod plan;
mod search;
mod types;

#[doc(inline)]
pub use error::LayoutError;

#[doc(inline)]
pub use plan::{AreaConstraint, AreaUnit, Connector, CountRule, DynamicRules, FloorPlan, RoomData, ShapeRule};

#[doc(inline)]
pub use geom::{DiscretizationResult, ScalingInfo, discretize};

#[doc(inline)]
pub use graph::DiscretizedGraph;

#[doc(inline)]
pub use fitness::{FitnessEvaluator, TypeIndexMap};

#[doc(inline)]
pub use search::{GaParams, GeneticOptimizer, Individual};

#[doc(inline)]
pub use multires::{
    AreaStat, FloorZones, OptimizationResult, RunParams, run_multi_resolution_optimization,
};
