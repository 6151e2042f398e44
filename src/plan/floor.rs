use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Position;

/// A cross-floor linkage point (elevator, escalator, stair).
///
/// Connectors sharing a `group` id on consecutive floors are joined by an
/// extra graph edge during stitching; the snapped grid node is also pinned
/// as a fixed node of `zone`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connector {
    coord: Position,
    group: String,
    zone: String,
}

impl Connector {
    pub fn new(coord: Position, group: impl Into<String>, zone: impl Into<String>) -> Self {
        Self { coord, group: group.into(), zone: zone.into() }
    }

    #[inline] pub fn coord(&self) -> Position { self.coord }
    #[inline] pub fn group(&self) -> &str { &self.group }
    #[inline] pub fn zone(&self) -> &str { &self.zone }
}

/// A single named floor: boundary polygon, obstacle polygons to subtract,
/// fixed anchor elements (zone type -> real coordinates), and connectors.
/// Immutable once built.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FloorPlan {
    name: String,
    boundary: Vec<Position>,
    #[serde(default)]
    obstacles: Vec<Vec<Position>>,
    #[serde(default)]
    fixed_elements: HashMap<String, Vec<Position>>,
    #[serde(default)]
    connectors: Vec<Connector>,
}

impl FloorPlan {
    /// Create a floor from its name and ordered boundary ring.
    pub fn new(name: impl Into<String>, boundary: Vec<Position>) -> Self {
        Self {
            name: name.into(),
            boundary,
            obstacles: Vec::new(),
            fixed_elements: HashMap::new(),
            connectors: Vec::new(),
        }
    }

    pub fn with_obstacles(mut self, obstacles: Vec<Vec<Position>>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn with_fixed_elements(mut self, fixed: HashMap<String, Vec<Position>>) -> Self {
        self.fixed_elements = fixed;
        self
    }

    pub fn with_connectors(mut self, connectors: Vec<Connector>) -> Self {
        self.connectors = connectors;
        self
    }

    #[inline] pub fn name(&self) -> &str { &self.name }
    #[inline] pub fn boundary(&self) -> &[Position] { &self.boundary }
    #[inline] pub fn obstacles(&self) -> &[Vec<Position>] { &self.obstacles }
    #[inline] pub fn fixed_elements(&self) -> &HashMap<String, Vec<Position>> { &self.fixed_elements }
    #[inline] pub fn connectors(&self) -> &[Connector] { &self.connectors }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain_preserves_parts() {
        let plan = FloorPlan::new("L1", vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]])
            .with_obstacles(vec![vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0]]])
            .with_fixed_elements(HashMap::from([("ent".to_string(), vec![[0.1, 0.1]])]))
            .with_connectors(vec![Connector::new([3.0, 3.0], "l", "lif")]);

        assert_eq!(plan.name(), "L1");
        assert_eq!(plan.boundary().len(), 4);
        assert_eq!(plan.obstacles().len(), 1);
        assert_eq!(plan.fixed_elements()["ent"], vec![[0.1, 0.1]]);
        assert_eq!(plan.connectors()[0].group(), "l");
        assert_eq!(plan.connectors()[0].zone(), "lif");
    }
}
