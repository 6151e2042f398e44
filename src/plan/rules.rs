use serde::{Deserialize, Serialize};

/// A weighted shape rule for one zone (compactness or rectangularity).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShapeRule {
    pub zone: String,
    pub weight: f64,
}

impl ShapeRule {
    pub fn new(zone: impl Into<String>, weight: f64) -> Self {
        Self { zone: zone.into(), weight }
    }
}

/// A per-floor presence rule: `weight * (present_as_0_or_1 - target)^2`
/// per floor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CountRule {
    pub zone: String,
    pub target: i32,
    pub weight: f64,
}

impl CountRule {
    pub fn new(zone: impl Into<String>, target: i32, weight: f64) -> Self {
        Self { zone: zone.into(), target, weight }
    }
}

/// Pre-parsed soft-constraint rule lists, consumed opaque by the evaluator.
/// Rules naming zones absent from the catalog are skipped with a warning.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DynamicRules {
    #[serde(default)]
    pub compactness: Vec<ShapeRule>,
    #[serde(default)]
    pub rectangularity: Vec<ShapeRule>,
    #[serde(default)]
    pub count_per_floor: Vec<CountRule>,
}
