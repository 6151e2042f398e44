//! Coarse-to-fine orchestration: run the genetic search on a coarse lattice,
//! carry a diverse set of survivors, and refine each one independently on
//! progressively finer lattices.

mod params;
mod result;

pub use params::RunParams;
pub use result::{AreaStat, FloorZones, OptimizationResult};

use std::collections::HashMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rstar::RTree;

use crate::error::LayoutError;
use crate::fitness::FitnessEvaluator;
use crate::geom::{DiscretizationResult, IndexedPoint, discretize};
use crate::graph::DiscretizedGraph;
use crate::plan::{FloorPlan, RoomData};
use crate::search::{GeneticOptimizer, Individual};
use crate::types::NodeId;

/// One resolution stage: the per-floor discretizations, the stitched graph,
/// and the compiled evaluator.
struct Stage {
    discretizations: Vec<DiscretizationResult>,
    graph: Arc<DiscretizedGraph>,
    evaluator: FitnessEvaluator,
}

impl Stage {
    fn build(
        floor_plans: &[FloorPlan],
        room_data: &RoomData,
        params: &RunParams,
        target_node_count: usize,
    ) -> Result<Self, LayoutError> {
        let mut discretizations = Vec::with_capacity(floor_plans.len());
        for plan in floor_plans {
            discretizations.push(discretize(plan, target_node_count)?);
        }

        let mut fixed_nodes: HashMap<String, Vec<NodeId>> = HashMap::new();
        let mut connectors = Vec::with_capacity(discretizations.len());
        let mut floor_graphs = Vec::with_capacity(discretizations.len());
        let mut offset = 0u32;
        for disc in &discretizations {
            for (zone, nodes) in disc.fixed_nodes() {
                fixed_nodes.entry(zone.clone())
                    .or_default()
                    .extend(nodes.iter().map(|&n| n + offset));
            }
            connectors.push(disc.connector_nodes().clone());
            floor_graphs.push(DiscretizedGraph::for_floor(disc.positions().to_vec()));
            offset += disc.node_count() as u32;
        }

        let graph = Arc::new(DiscretizedGraph::stitch(floor_graphs, &connectors)?);
        let evaluator = FitnessEvaluator::new(
            graph.clone(),
            room_data,
            &fixed_nodes,
            &params.dynamic_rules,
            params.total_gfa,
            params.w_area,
            params.w_adj,
        )?;

        Ok(Self { discretizations, graph, evaluator })
    }

    fn floor_offsets(&self) -> Vec<u32> {
        let mut offsets = Vec::with_capacity(self.discretizations.len());
        let mut total = 0u32;
        for disc in &self.discretizations {
            offsets.push(total);
            total += disc.node_count() as u32;
        }
        offsets
    }
}

/// Project a coarse-stage individual onto a finer lattice: each seed maps
/// through its floor's coarse scaling into real coordinates, then through
/// the fine scaling to the nearest fine node on the same floor. Seeds on a
/// floor that lost all fine nodes are dropped.
fn upsample(individual: &Individual, coarse: &Stage, fine: &Stage) -> Individual {
    let coarse_offsets = coarse.floor_offsets();
    let fine_offsets = fine.floor_offsets();
    let trees: Vec<RTree<IndexedPoint>> = fine.discretizations.iter()
        .map(|disc| {
            RTree::bulk_load(
                disc.positions().iter().enumerate()
                    .map(|(i, &pos)| IndexedPoint::new(i as NodeId, pos))
                    .collect(),
            )
        })
        .collect();

    let seeds = individual.seeds().iter()
        .map(|nodes| {
            nodes.iter()
                .filter_map(|&node| {
                    let floor = coarse_offsets.partition_point(|&o| o <= node) - 1;
                    let local = (node - coarse_offsets[floor]) as usize;
                    let grid = coarse.discretizations[floor].positions()[local];
                    let real = coarse.discretizations[floor].scaling().to_real(grid);
                    let fine_grid = fine.discretizations[floor].scaling().to_grid(real);
                    trees[floor]
                        .nearest_neighbor(&fine_grid)
                        .map(|p| p.idx() + fine_offsets[floor])
                })
                .collect()
        })
        .collect();
    Individual::new(seeds)
}

/// Run the full coarse-to-fine optimization and return up to `num_layouts`
/// finished layouts sorted by fitness ascending.
///
/// `progress` receives the overall completion fraction in `[0, 1]`, weighted
/// by the generation schedule.
pub fn run_multi_resolution_optimization(
    floor_plans: &[FloorPlan],
    room_data: &RoomData,
    params: &RunParams,
    mut progress: Option<&mut dyn FnMut(f64)>,
) -> Result<Vec<OptimizationResult>, LayoutError> {
    params.validate()?;
    if floor_plans.is_empty() {
        return Err(LayoutError::Configuration("at least one floor plan is required".into()));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let total_work = params.total_work() as f64;
    let mut completed = 0usize;
    let mut report = |done: usize, within: usize| {
        if let Some(callback) = progress.as_deref_mut() {
            callback(((done + within) as f64 / total_work).min(1.0));
        }
    };

    tracing::info!(
        stages = params.n_stages(),
        floors = floor_plans.len(),
        layouts = params.num_layouts,
        "starting multi-resolution optimization"
    );

    let mut stage = Stage::build(floor_plans, room_data, params, params.target_node_counts[0])?;
    let mut optimizer = GeneticOptimizer::new(
        stage.graph.clone(),
        params.ga.clone(),
        params.pop_sizes[0],
        params.generations[0],
    );
    let mut survivors = optimizer.run(
        &stage.evaluator,
        params.num_layouts,
        Vec::new(),
        &mut rng,
        &mut |generation, _, _| report(completed, generation + 1),
    )?;
    completed += params.generations[0];

    for s in 1..params.n_stages() {
        let fine = Stage::build(floor_plans, room_data, params, params.target_node_counts[s])?;
        let mut optimizer = GeneticOptimizer::new(
            fine.graph.clone(),
            params.ga.clone(),
            params.pop_sizes[s],
            params.generations[s],
        );

        let mut refined = Vec::with_capacity(survivors.len());
        for survivor in &survivors {
            let seed = upsample(survivor, &stage, &fine);
            let mut branch = optimizer.run(
                &fine.evaluator,
                1,
                vec![seed],
                &mut rng,
                &mut |generation, _, _| report(completed, generation + 1),
            )?;
            completed += params.generations[s];
            refined.append(&mut branch);
        }

        tracing::info!(stage = s, nodes = fine.graph.node_count(), layouts = refined.len(),
            "refined stage complete");
        survivors = refined;
        stage = fine;
    }

    if survivors.is_empty() {
        return Err(LayoutError::EmptyResult);
    }

    let floor_names: Vec<String> = floor_plans.iter().map(|p| p.name().to_string()).collect();
    let mut results: Vec<OptimizationResult> = survivors.iter()
        .map(|individual| {
            let assignment = stage.evaluator.propagate(individual);
            let fitness = stage.evaluator.score(&assignment);
            OptimizationResult::build(
                fitness,
                individual,
                assignment,
                &stage.evaluator,
                &floor_names,
                &stage.discretizations,
                params.total_gfa,
            )
        })
        .collect();
    results.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
    report(params.total_work(), 0);
    Ok(results)
}
