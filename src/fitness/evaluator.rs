use std::collections::HashMap;
use std::sync::Arc;

use ndarray::Array2;

use crate::error::LayoutError;
use crate::fitness::{TypeIndexMap, target_counts};
use crate::graph::DiscretizedGraph;
use crate::plan::{DynamicRules, RoomData};
use crate::search::Individual;
use crate::types::{NodeId, TypeIndex, UNASSIGNED};

/// Floor priority once a type's target is met, keeping a finished type able
/// to claim otherwise-unreachable nodes.
const MIN_PRIORITY: f64 = 1e-6;

/// Stage-constant scoring state: the type-index mapping, per-type target
/// node counts, the symmetrized affinity matrix, and compiled rule arrays.
///
/// Evaluation is `&self` throughout, so individuals can be scored in
/// parallel against one shared evaluator.
#[derive(Debug)]
pub struct FitnessEvaluator {
    graph: Arc<DiscretizedGraph>,
    types: TypeIndexMap,
    target_counts: Vec<u32>,
    affinity: Array2<f64>,
    compactness_weights: Vec<f64>,
    rectangularity_rules: Vec<(TypeIndex, f64)>,
    per_floor_rules: Vec<(TypeIndex, i32, f64)>,
    fixed_nodes: Vec<Vec<NodeId>>,
    w_area: f64,
    w_adj: f64,
}

impl FitnessEvaluator {
    /// Compile stage-constant state from the zone catalog, the fixed-node
    /// snappings (global node ids), and the dynamic rule lists. Rules and
    /// fixed elements naming zones outside the selected catalog are skipped
    /// with a warning.
    pub fn new(
        graph: Arc<DiscretizedGraph>,
        room_data: &RoomData,
        fixed_nodes: &HashMap<String, Vec<NodeId>>,
        rules: &DynamicRules,
        total_gfa: f64,
        w_area: f64,
        w_adj: f64,
    ) -> Result<Self, LayoutError> {
        let codes = room_data.selected_codes();
        if codes.is_empty() {
            return Err(LayoutError::Configuration("zone catalog selects no zones".into()));
        }
        let types = TypeIndexMap::new(codes);
        let n_types = types.len();

        let shares = room_data.normalized_shares(total_gfa);
        let targets = target_counts(&shares, graph.node_count());

        // Symmetrize off-diagonal entries; the diagonal is unused but kept as given.
        let mut affinity = Array2::zeros((n_types, n_types));
        for i in 0..n_types {
            for j in 0..n_types {
                let raw = room_data.affinity(types.name(i), types.name(j));
                affinity[[i, j]] = if i == j {
                    raw
                } else {
                    raw + room_data.affinity(types.name(j), types.name(i))
                };
            }
        }

        let mut compactness_weights = vec![0.0; n_types];
        for rule in &rules.compactness {
            match types.get(&rule.zone) {
                Some(t) => compactness_weights[t] = rule.weight,
                None => tracing::warn!(zone = %rule.zone, "skipping compactness rule for unknown zone"),
            }
        }
        let mut rectangularity_rules = Vec::new();
        for rule in &rules.rectangularity {
            match types.get(&rule.zone) {
                Some(t) => rectangularity_rules.push((t, rule.weight)),
                None => tracing::warn!(zone = %rule.zone, "skipping rectangularity rule for unknown zone"),
            }
        }
        let mut per_floor_rules = Vec::new();
        for rule in &rules.count_per_floor {
            match types.get(&rule.zone) {
                Some(t) => per_floor_rules.push((t, rule.target, rule.weight)),
                None => tracing::warn!(zone = %rule.zone, "skipping count rule for unknown zone"),
            }
        }

        let mut fixed = vec![Vec::new(); n_types];
        for (name, nodes) in fixed_nodes {
            match types.get(name) {
                Some(t) => fixed[t] = nodes.clone(),
                None => tracing::warn!(zone = %name, "fixed element zone not in selected catalog"),
            }
        }

        Ok(Self {
            graph,
            types,
            target_counts: targets,
            affinity,
            compactness_weights,
            rectangularity_rules,
            per_floor_rules,
            fixed_nodes: fixed,
            w_area,
            w_adj,
        })
    }

    /// Get the stage's zone-type mapping.
    #[inline] pub fn types(&self) -> &TypeIndexMap { &self.types }

    /// Get the number of zone types.
    #[inline] pub fn n_types(&self) -> usize { self.types.len() }

    /// Get the per-type target node counts.
    #[inline] pub fn target_counts(&self) -> &[u32] { &self.target_counts }

    /// Get the pinned seed nodes of a type (empty for movable types).
    #[inline] pub fn fixed_nodes(&self, t: TypeIndex) -> &[NodeId] { &self.fixed_nodes[t] }

    /// Get the per-type pinned node lists.
    #[inline] pub fn fixed_node_lists(&self) -> &[Vec<NodeId>] { &self.fixed_nodes }

    /// Check whether a type's seeds are pinned by input configuration.
    #[inline] pub fn is_fixed(&self, t: TypeIndex) -> bool { !self.fixed_nodes[t].is_empty() }

    /// Indices of types whose seeds the optimizer may move.
    pub fn movable_types(&self) -> Vec<TypeIndex> {
        (0..self.n_types()).filter(|&t| !self.is_fixed(t)).collect()
    }

    /// Expand an individual's seeds into a full node assignment by
    /// multi-source wavefront propagation.
    ///
    /// Each layer scans every wavefront node, proposing its type to each
    /// unassigned neighbor at cost `1 - priority`, where priority is the
    /// type's remaining fraction of target (floored at [`MIN_PRIORITY`] once
    /// met). Lowest cost wins a node; all winning proposals commit at once
    /// and become the next wavefront. Unreachable nodes stay [`UNASSIGNED`].
    pub fn propagate(&self, individual: &Individual) -> Vec<i32> {
        let n_nodes = self.graph.node_count();
        let n_types = self.n_types();
        let mut assignment = vec![UNASSIGNED; n_nodes];
        let mut counts = vec![0u32; n_types];

        let mut wavefront: Vec<NodeId> = Vec::new();
        for t in 0..n_types.min(individual.seeds().len()) {
            for &node in individual.seeds_of(t) {
                let slot = &mut assignment[node as usize];
                // first claim wins when seeds collide
                if *slot == UNASSIGNED {
                    *slot = t as i32;
                    counts[t] += 1;
                    wavefront.push(node);
                }
            }
        }

        let mut best_cost = vec![f64::INFINITY; n_nodes];
        let mut winner = vec![UNASSIGNED; n_nodes];
        let mut next_wavefront: Vec<NodeId> = Vec::new();

        while !wavefront.is_empty() {
            best_cost.fill(f64::INFINITY);
            winner.fill(UNASSIGNED);

            for &source in &wavefront {
                let t = assignment[source as usize] as usize;
                let target = self.target_counts[t];
                let priority = if counts[t] >= target {
                    MIN_PRIORITY
                } else {
                    (target - counts[t]) as f64 / target as f64 + MIN_PRIORITY
                };
                let cost = 1.0 - priority;

                for neighbor in self.graph.neighbors(source as usize) {
                    let i = neighbor as usize;
                    if assignment[i] == UNASSIGNED && cost < best_cost[i] {
                        best_cost[i] = cost;
                        winner[i] = t as i32;
                    }
                }
            }

            next_wavefront.clear();
            for (node, &t) in winner.iter().enumerate() {
                if t != UNASSIGNED {
                    assignment[node] = t;
                    counts[t as usize] += 1;
                    next_wavefront.push(node as NodeId);
                }
            }
            std::mem::swap(&mut wavefront, &mut next_wavefront);
        }

        assignment
    }

    /// Score a full node assignment. Lower is better.
    pub fn score(&self, assignment: &[i32]) -> f64 {
        let n_types = self.n_types();

        let mut counts = vec![0u32; n_types];
        for &t in assignment {
            if t != UNASSIGNED {
                counts[t as usize] += 1;
            }
        }

        let area_penalty: f64 = counts.iter().zip(&self.target_counts)
            .map(|(&count, &target)| {
                let deviation = count as f64 - target as f64;
                deviation * deviation
            })
            .sum();

        let mut adjacency_penalty = 0.0;
        let mut compactness_reward = 0.0;
        for &(u, v) in self.graph.edges() {
            let (tu, tv) = (assignment[u as usize], assignment[v as usize]);
            if tu == UNASSIGNED || tv == UNASSIGNED {
                continue;
            }
            if tu == tv {
                compactness_reward += self.compactness_weights[tu as usize];
            } else {
                adjacency_penalty += self.affinity[[tu as usize, tv as usize]];
            }
        }

        let rectangularity_penalty = self.rectangularity_penalty(assignment, &counts);
        let count_penalty = self.per_floor_count_penalty(assignment);

        self.w_area * area_penalty + self.w_adj * adjacency_penalty - compactness_reward
            + rectangularity_penalty
            + count_penalty
    }

    /// `weight * (1 - count / bbox_area)` per rule-bearing type, with bbox
    /// the axis-aligned grid extent of the type's nodes in whole cells.
    fn rectangularity_penalty(&self, assignment: &[i32], counts: &[u32]) -> f64 {
        if self.rectangularity_rules.is_empty() {
            return 0.0;
        }

        let n_types = self.n_types();
        let mut bbox = vec![(i64::MAX, i64::MIN, i64::MAX, i64::MIN); n_types];
        for (node, &t) in assignment.iter().enumerate() {
            if t == UNASSIGNED {
                continue;
            }
            let [x, y] = self.graph.positions()[node];
            let (x, y) = (x.floor() as i64, y.floor() as i64);
            let entry = &mut bbox[t as usize];
            entry.0 = entry.0.min(x);
            entry.1 = entry.1.max(x);
            entry.2 = entry.2.min(y);
            entry.3 = entry.3.max(y);
        }

        self.rectangularity_rules.iter()
            .filter(|&&(t, _)| counts[t] > 0)
            .map(|&(t, weight)| {
                let (min_x, max_x, min_y, max_y) = bbox[t];
                let bbox_area = ((max_x - min_x + 1) * (max_y - min_y + 1)) as f64;
                weight * (1.0 - counts[t] as f64 / bbox_area)
            })
            .sum()
    }

    /// Binary zone-presence check per floor: `weight * (present - target)^2`
    /// per rule and floor, comparing a 0/1 flag (not raw counts) against the
    /// target.
    fn per_floor_count_penalty(&self, assignment: &[i32]) -> f64 {
        if self.per_floor_rules.is_empty() {
            return 0.0;
        }

        let floors = self.graph.floor_ranges();
        let mut per_floor = vec![vec![0u32; self.n_types()]; floors.len()];
        for (node, &t) in assignment.iter().enumerate() {
            if t == UNASSIGNED {
                continue;
            }
            if let Some(floor) = floors.iter()
                .position(|&(start, end)| (start as usize..end as usize).contains(&node))
            {
                per_floor[floor][t as usize] += 1;
            }
        }

        self.per_floor_rules.iter()
            .map(|&(t, target, weight)| {
                per_floor.iter()
                    .map(|counts| {
                        let present = (counts[t] > 0) as i32;
                        weight * ((present - target) as f64).powi(2)
                    })
                    .sum::<f64>()
            })
            .sum()
    }

    /// Propagate and score in one step. Lower is better.
    pub fn evaluate(&self, individual: &Individual) -> f64 {
        let assignment = self.propagate(individual);
        self.score(&assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::plan::{AreaConstraint, AreaUnit, CountRule, ShapeRule};

    /// 4x4 unit lattice, one floor.
    fn make_graph() -> Arc<DiscretizedGraph> {
        let positions = (0..4)
            .flat_map(|y| (0..4).map(move |x| [x as f64 + 0.5, y as f64 + 0.5]))
            .collect();
        Arc::new(DiscretizedGraph::for_floor(positions))
    }

    fn make_rooms(ent_share: f64) -> RoomData {
        RoomData::new(
            vec!["ent".into(), "gen".into()],
            vec![vec![0.0, -2.0], vec![0.0, 0.0]],
            vec![
                AreaConstraint::new("ent", Some(ent_share), AreaUnit::Percent),
                AreaConstraint::new("gen", None, AreaUnit::Percent),
            ],
        )
        .unwrap()
    }

    fn make_evaluator(rules: DynamicRules) -> FitnessEvaluator {
        FitnessEvaluator::new(
            make_graph(),
            &make_rooms(25.0),
            &HashMap::from([("ent".to_string(), vec![0u32])]),
            &rules,
            100.0,
            1.0,
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn targets_cover_all_nodes() {
        let evaluator = make_evaluator(DynamicRules::default());
        assert_eq!(evaluator.target_counts().iter().sum::<u32>(), 16);
        assert_eq!(evaluator.target_counts(), &[4, 12]);
    }

    #[test]
    fn fixed_partition_reflects_snapped_elements() {
        let evaluator = make_evaluator(DynamicRules::default());
        assert!(evaluator.is_fixed(0));
        assert!(!evaluator.is_fixed(1));
        assert_eq!(evaluator.fixed_nodes(0), &[0]);
        assert_eq!(evaluator.movable_types(), vec![1]);
    }

    #[test]
    fn propagation_assigns_every_reachable_node_exactly_once() {
        let evaluator = make_evaluator(DynamicRules::default());
        let individual = Individual::new(vec![vec![0], vec![15]]);
        let assignment = evaluator.propagate(&individual);

        assert_eq!(assignment.len(), 16);
        assert!(assignment.iter().all(|&t| t == 0 || t == 1));
        let ent = assignment.iter().filter(|&&t| t == 0).count();
        let general = assignment.iter().filter(|&&t| t == 1).count();
        assert_eq!(ent + general, 16);
        assert!(ent >= 1 && general >= 1);
    }

    #[test]
    fn propagation_respects_target_proportions() {
        let evaluator = make_evaluator(DynamicRules::default());
        let individual = Individual::new(vec![vec![0], vec![15]]);
        let assignment = evaluator.propagate(&individual);

        let ent = assignment.iter().filter(|&&t| t == 0).count();
        let general = assignment.iter().filter(|&&t| t == 1).count();
        // 25% / 75% split on equal seeds: ent must stay the smaller region
        assert!(ent <= general);
    }

    #[test]
    fn colliding_seeds_leave_first_claim_in_place() {
        let evaluator = make_evaluator(DynamicRules::default());
        let individual = Individual::new(vec![vec![5], vec![5]]);
        let assignment = evaluator.propagate(&individual);
        assert_eq!(assignment[5], 0);
    }

    #[test]
    fn exact_area_match_scores_zero_area_penalty() {
        let evaluator = make_evaluator(DynamicRules::default());
        // hand-build an assignment matching targets 4/12: one ent row, three gen rows
        let assignment: Vec<i32> = (0..16).map(|i| if i < 4 { 0 } else { 1 }).collect();

        // area penalty 0; boundary edges between rows: 4 ent-gen edges at
        // symmetrized affinity -2 -> adjacency -8; no shape or count rules
        let score = evaluator.score(&assignment);
        assert_eq!(score, -8.0);
    }

    #[test]
    fn compactness_rewards_same_type_edges() {
        let rules = DynamicRules {
            compactness: vec![ShapeRule::new("gen", 0.5)],
            ..Default::default()
        };
        let evaluator = make_evaluator(rules);
        let assignment: Vec<i32> = (0..16).map(|i| if i < 4 { 0 } else { 1 }).collect();

        // 17 gen-gen edges (12 nodes in a 4x3 block) each rewarded 0.5
        let score = evaluator.score(&assignment);
        assert_eq!(score, -8.0 - 17.0 * 0.5);
    }

    #[test]
    fn rectangularity_penalizes_sparse_bounding_boxes() {
        let rules = DynamicRules {
            rectangularity: vec![ShapeRule::new("gen", 2.0)],
            ..Default::default()
        };
        let evaluator = make_evaluator(rules);

        let counts_of = |assignment: &[i32]| {
            let mut counts = vec![0u32; 2];
            for &t in assignment {
                counts[t as usize] += 1;
            }
            counts
        };

        // gen fills its 4x3 bbox exactly: penalty 0
        let packed: Vec<i32> = (0..16).map(|i| if i < 4 { 0 } else { 1 }).collect();
        assert_eq!(evaluator.rectangularity_penalty(&packed, &counts_of(&packed)), 0.0);

        // gen as a ring spanning the full 4x4 bbox with 12 nodes: fill 0.75
        let mut ring = vec![1i32; 16];
        for i in [5, 6, 9, 10] {
            ring[i] = 0;
        }
        let penalty = evaluator.rectangularity_penalty(&ring, &counts_of(&ring));
        assert!((penalty - 2.0 * 0.25).abs() < 1e-12);
    }

    #[test]
    fn per_floor_rule_checks_binary_presence_not_counts() {
        let rules = DynamicRules {
            count_per_floor: vec![CountRule::new("ent", 1, 3.0)],
            ..Default::default()
        };
        let evaluator = make_evaluator(rules);

        // presence flag 1 == target -> no penalty, regardless of how many
        // ent nodes the floor holds
        let one_ent: Vec<i32> = (0..16).map(|i| if i < 1 { 0 } else { 1 }).collect();
        let four_ent: Vec<i32> = (0..16).map(|i| if i < 4 { 0 } else { 1 }).collect();
        let absent = vec![1i32; 16];
        assert_eq!(evaluator.per_floor_count_penalty(&one_ent), 0.0);
        assert_eq!(evaluator.per_floor_count_penalty(&four_ent), 0.0);
        // absent: (0 - 1)^2 * 3.0
        assert_eq!(evaluator.per_floor_count_penalty(&absent), 3.0);
    }

    #[test]
    fn unknown_zone_rules_are_skipped_not_fatal() {
        let rules = DynamicRules {
            compactness: vec![ShapeRule::new("pool", 1.0)],
            rectangularity: vec![ShapeRule::new("spa", 1.0)],
            count_per_floor: vec![CountRule::new("gym", 1, 1.0)],
        };
        let evaluator = make_evaluator(rules);
        assert!(evaluator.rectangularity_rules.is_empty());
        assert!(evaluator.per_floor_rules.is_empty());
        assert!(evaluator.compactness_weights.iter().all(|&w| w == 0.0));
    }

    #[test]
    fn empty_selection_is_a_configuration_error() {
        let rooms = RoomData::new(vec![], vec![], vec![]).unwrap();
        let err = FitnessEvaluator::new(
            make_graph(),
            &rooms,
            &HashMap::new(),
            &DynamicRules::default(),
            100.0,
            1.0,
            1.0,
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::Configuration(_)));
    }
}
