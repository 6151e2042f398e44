use std::collections::HashMap;

use serde::Serialize;

use crate::fitness::FitnessEvaluator;
use crate::geom::DiscretizationResult;
use crate::search::Individual;
use crate::types::{NodeId, Position, UNASSIGNED};

/// Achieved share and floor area of one zone in a finished layout.
#[derive(Clone, Debug, Serialize)]
pub struct AreaStat {
    pub zone: String,
    /// Fraction of assigned nodes holding this zone.
    pub proportion: f64,
    /// Estimated floor area, `proportion * total_gfa`.
    pub area: f64,
}

/// One floor's zones as real-world node coordinates, keyed by zone code.
#[derive(Clone, Debug, Serialize)]
pub struct FloorZones {
    pub floor: String,
    pub zones: HashMap<String, Vec<Position>>,
}

/// A finished layout: its fitness, the raw per-node type assignment at the
/// finest resolution, and the derived per-zone summaries.
#[derive(Clone, Debug, Serialize)]
pub struct OptimizationResult {
    pub fitness: f64,
    /// Per-type seed node lists of the winning individual.
    pub seeds: Vec<Vec<NodeId>>,
    /// Per-node type index at the finest stage, `-1` for unreachable nodes.
    pub assignment: Vec<i32>,
    pub area_table: Vec<AreaStat>,
    pub floor_zones: Vec<FloorZones>,
}

impl OptimizationResult {
    /// Summarize a finest-stage assignment. `floor_names` and
    /// `discretizations` run parallel to the stitched graph's floor order.
    pub(crate) fn build(
        fitness: f64,
        individual: &Individual,
        assignment: Vec<i32>,
        evaluator: &FitnessEvaluator,
        floor_names: &[String],
        discretizations: &[DiscretizationResult],
        total_gfa: f64,
    ) -> Self {
        let n_types = evaluator.n_types();
        let mut counts = vec![0usize; n_types];
        let mut assigned = 0usize;
        for &t in &assignment {
            if t != UNASSIGNED {
                counts[t as usize] += 1;
                assigned += 1;
            }
        }

        let area_table = (0..n_types)
            .map(|t| {
                let proportion = if assigned > 0 {
                    counts[t] as f64 / assigned as f64
                } else {
                    0.0
                };
                AreaStat {
                    zone: evaluator.types().name(t).to_string(),
                    proportion,
                    area: proportion * total_gfa,
                }
            })
            .collect();

        let mut floor_zones = Vec::with_capacity(discretizations.len());
        let mut offset = 0usize;
        for (name, disc) in floor_names.iter().zip(discretizations) {
            let mut zones: HashMap<String, Vec<Position>> = HashMap::new();
            for (local, &pos) in disc.positions().iter().enumerate() {
                let t = assignment[offset + local];
                if t != UNASSIGNED {
                    zones.entry(evaluator.types().name(t as usize).to_string())
                        .or_default()
                        .push(disc.scaling().to_real(pos));
                }
            }
            floor_zones.push(FloorZones { floor: name.clone(), zones });
            offset += disc.node_count();
        }

        Self { fitness, seeds: individual.seeds().to_vec(), assignment, area_table, floor_zones }
    }
}
