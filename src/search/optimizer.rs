use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use rand::seq::IndexedRandom;
use rand_distr::{Distribution, Exp};
use rayon::prelude::*;

use crate::error::LayoutError;
use crate::fitness::FitnessEvaluator;
use crate::graph::DiscretizedGraph;
use crate::search::{GaParams, Individual};
use crate::types::{NodeId, Position, TypeIndex};

/// The memetic genetic search over seed placements: tournament selection,
/// midpoint-split crossover, random-walk mutation, stochastic local search,
/// elitist truncation, and fitness memoization.
///
/// The fitness cache is local to one optimizer run and must not be shared
/// across stages or branches.
pub struct GeneticOptimizer {
    graph: Arc<DiscretizedGraph>,
    params: GaParams,
    pop_size: usize,
    generations: usize,
    cache: HashMap<Vec<Vec<NodeId>>, f64, ahash::RandomState>,
}

/// Midpoint-split crossover: per type, child one takes the first half of
/// parent A's seed list and the second half of B's; child two the reverse.
/// The split index comes from A's list length for both children.
fn crossover(a: &Individual, b: &Individual) -> (Individual, Individual) {
    let n_types = a.seeds().len().max(b.seeds().len());
    let mut child1 = Vec::with_capacity(n_types);
    let mut child2 = Vec::with_capacity(n_types);
    let empty: &[NodeId] = &[];

    for t in 0..n_types {
        let nodes1 = a.seeds().get(t).map_or(empty, Vec::as_slice);
        let nodes2 = b.seeds().get(t).map_or(empty, Vec::as_slice);
        let split = nodes1.len() / 2;

        let tail = |nodes: &[NodeId]| nodes.get(split..).unwrap_or(empty).to_vec();
        let mut first = nodes1[..split].to_vec();
        first.extend(tail(nodes2));
        child1.push(first);

        let mut second = nodes2.get(..split.min(nodes2.len())).unwrap_or(empty).to_vec();
        second.extend(tail(nodes1));
        child2.push(second);
    }

    (Individual::new(child1), Individual::new(child2))
}

/// Mean nearest-seed distance between two individuals over all types, with
/// a flat penalty of `10 * |len_a - len_b|` for types one side lacks.
fn individual_distance(a: &Individual, b: &Individual, positions: &[Position]) -> f64 {
    let n_types = a.seeds().len().max(b.seeds().len());
    if n_types == 0 {
        return 0.0;
    }
    let empty: &[NodeId] = &[];

    let mut total = 0.0;
    for t in 0..n_types {
        let nodes1 = a.seeds().get(t).map_or(empty, Vec::as_slice);
        let nodes2 = b.seeds().get(t).map_or(empty, Vec::as_slice);
        if nodes1.is_empty() || nodes2.is_empty() {
            total += 10.0 * nodes1.len().abs_diff(nodes2.len()) as f64;
            continue;
        }

        let (smaller, larger) = if nodes1.len() < nodes2.len() {
            (nodes1, nodes2)
        } else {
            (nodes2, nodes1)
        };
        let sum: f64 = smaller.iter()
            .map(|&u| {
                let [ux, uy] = positions[u as usize];
                larger.iter()
                    .map(|&v| {
                        let [vx, vy] = positions[v as usize];
                        ((ux - vx).powi(2) + (uy - vy).powi(2)).sqrt()
                    })
                    .fold(f64::INFINITY, f64::min)
            })
            .sum();
        total += sum / smaller.len() as f64;
    }

    total / n_types as f64
}

/// Greedily pick up to `k` individuals from a fitness-sorted population
/// whose mutual seed distance exceeds `threshold`. The best individual is
/// always admitted.
fn diverse_top_k(
    population: &[Individual],
    positions: &[Position],
    k: usize,
    threshold: f64,
) -> Vec<Individual> {
    let Some(best) = population.first() else { return Vec::new() };

    let mut hall = vec![best.clone()];
    for candidate in &population[1..] {
        if hall.len() >= k {
            break;
        }
        let min_dist = hall.iter()
            .map(|member| individual_distance(candidate, member, positions))
            .fold(f64::INFINITY, f64::min);
        if min_dist > threshold {
            hall.push(candidate.clone());
        }
    }
    hall
}

impl GeneticOptimizer {
    pub fn new(
        graph: Arc<DiscretizedGraph>,
        params: GaParams,
        pop_size: usize,
        generations: usize,
    ) -> Self {
        Self { graph, params, pop_size, generations, cache: HashMap::default() }
    }

    /// Evolve the population and return up to `num_layouts` diverse
    /// survivors sorted by fitness ascending.
    ///
    /// `initial_population` seeds the run (truncated or padded with random
    /// individuals to the population size); fixed types are pinned into
    /// every member. `progress` is invoked once per generation with
    /// `(generation, total_generations, best_fitness)`.
    pub fn run(
        &mut self,
        evaluator: &FitnessEvaluator,
        num_layouts: usize,
        initial_population: Vec<Individual>,
        rng: &mut impl Rng,
        progress: &mut dyn FnMut(usize, usize, f64),
    ) -> Result<Vec<Individual>, LayoutError> {
        self.cache.clear();
        let fixed = evaluator.fixed_node_lists();
        let movable = evaluator.movable_types();

        let mut population = initial_population;
        population.truncate(self.pop_size);
        for individual in &mut population {
            individual.pin_fixed(fixed);
        }
        while population.len() < self.pop_size {
            population.push(Individual::random(fixed, self.graph.node_count(), rng));
        }
        self.evaluate_population(&mut population, evaluator);
        sort_by_fitness(&mut population);

        let mut last_best = f64::INFINITY;
        let mut stagnation = 0usize;

        for generation in 0..self.generations {
            let parents = self.select_parents(&population, rng);
            let mut offspring = parents;

            for i in (1..offspring.len()).step_by(2) {
                if rng.random::<f64>() < self.params.cxpb {
                    let (first, second) = crossover(&offspring[i - 1], &offspring[i]);
                    offspring[i - 1] = first;
                    offspring[i] = second;
                }
            }
            for individual in &mut offspring {
                if rng.random::<f64>() < self.params.mutpb {
                    self.mutate(individual, &movable, rng);
                }
                individual.pin_fixed(fixed);
            }

            if self.params.use_local_search {
                for individual in &mut offspring {
                    if individual.fitness().is_none() {
                        self.local_search(individual, evaluator, &movable, rng);
                    }
                }
            }
            self.evaluate_population(&mut offspring, evaluator);

            population.extend(offspring);
            sort_by_fitness(&mut population);
            population.truncate(self.pop_size);

            let best = population[0].fitness().unwrap_or(f64::INFINITY);
            if last_best - best < self.params.min_improvement {
                stagnation += 1;
            } else {
                stagnation = 0;
            }
            last_best = best;
            progress(generation, self.generations, best);

            if stagnation >= self.params.stagnation_limit {
                tracing::debug!(generation, best, "stopping early due to stagnation");
                break;
            }
        }

        if population.is_empty() {
            return Err(LayoutError::EmptyResult);
        }
        Ok(diverse_top_k(
            &population,
            self.graph.positions(),
            num_layouts,
            self.params.diversity_threshold,
        ))
    }

    /// Tournament selection of one full set of parents (cloned).
    fn select_parents(&self, population: &[Individual], rng: &mut impl Rng) -> Vec<Individual> {
        (0..population.len())
            .map(|_| {
                let winner = (0..self.params.tournsize.max(1))
                    .map(|_| rng.random_range(0..population.len()))
                    .min_by(|&a, &b| {
                        let fit = |i: usize| population[i].fitness().unwrap_or(f64::INFINITY);
                        fit(a).total_cmp(&fit(b))
                    })
                    .unwrap_or(0);
                population[winner].clone()
            })
            .collect()
    }

    /// Diffuse each movable seed along a graph random walk of
    /// `Exponential(mean = walk_decay * walk_scale)` steps, then apply the
    /// swap/duplicate/prune moves with their independent probabilities.
    fn mutate(&self, individual: &mut Individual, movable: &[TypeIndex], rng: &mut impl Rng) {
        let mean = self.params.walk_decay * self.params.walk_scale;
        let walk_steps = Exp::new(1.0 / mean.max(f64::MIN_POSITIVE)).ok();

        for &t in movable {
            for i in 0..individual.seeds_of(t).len() {
                let steps = walk_steps
                    .map(|dist| dist.sample(rng) as usize)
                    .unwrap_or(0);
                let mut current = individual.seeds_of(t)[i];
                for _ in 0..steps {
                    let neighbors = self.graph.neighbor_list(current as usize);
                    match neighbors.choose(rng) {
                        Some(&next) => current = next,
                        None => break,
                    }
                }
                individual.set_seed(t, i, current);
            }
        }

        if movable.len() >= 2 && rng.random::<f64>() < self.params.swap_pb {
            let picks = rand::seq::index::sample(rng, movable.len(), 2);
            individual.swap_types(movable[picks.index(0)], movable[picks.index(1)]);
        }
        if rng.random::<f64>() < self.params.dup_pb {
            if let Some(&t) = movable.choose(rng) {
                if let Some(&node) = individual.seeds_of(t).choose(rng) {
                    individual.push_seed(t, node);
                }
            }
        }
        if rng.random::<f64>() < self.params.prune_pb {
            let prunable: Vec<TypeIndex> = movable.iter()
                .copied()
                .filter(|&t| individual.seeds_of(t).len() > 1)
                .collect();
            if let Some(&t) = prunable.choose(rng) {
                let i = rng.random_range(0..individual.seeds_of(t).len());
                individual.remove_seed(t, i);
            }
        }
    }

    /// Stochastic hill climb: for `2 * num_types` trials, move one random
    /// movable seed to a random graph neighbor and keep strictly improving
    /// moves. Leaves the individual without a cached fitness.
    fn local_search(
        &mut self,
        individual: &mut Individual,
        evaluator: &FitnessEvaluator,
        movable: &[TypeIndex],
        rng: &mut impl Rng,
    ) {
        let candidates: Vec<TypeIndex> = movable.iter()
            .copied()
            .filter(|&t| !individual.seeds_of(t).is_empty())
            .collect();
        if candidates.is_empty() {
            return;
        }

        let mut current_fitness = self.evaluate_cached(individual, evaluator);
        for _ in 0..2 * evaluator.n_types() {
            let Some(&t) = candidates.choose(rng) else { break };
            let i = rng.random_range(0..individual.seeds_of(t).len());
            let original = individual.seeds_of(t)[i];
            let Some(&neighbor) = self.graph.neighbor_list(original as usize).choose(rng) else {
                continue;
            };

            individual.set_seed(t, i, neighbor);
            let trial_fitness = self.evaluate_cached(individual, evaluator);
            if trial_fitness < current_fitness {
                current_fitness = trial_fitness;
            } else {
                individual.set_seed(t, i, original);
            }
        }
        individual.clear_fitness();
    }

    /// Fill in missing fitness values, evaluating uncached individuals in
    /// parallel against the shared read-only evaluator.
    fn evaluate_population(&mut self, population: &mut [Individual], evaluator: &FitnessEvaluator) {
        let pending: Vec<usize> = population.iter().enumerate()
            .filter(|(_, individual)| individual.fitness().is_none())
            .map(|(i, _)| i)
            .collect();

        let mut jobs: Vec<(Vec<Vec<NodeId>>, usize)> = Vec::new();
        let mut seen: std::collections::HashSet<Vec<Vec<NodeId>>, ahash::RandomState> =
            std::collections::HashSet::default();
        for &i in &pending {
            let key = population[i].cache_key();
            if !self.cache.contains_key(&key) && seen.insert(key.clone()) {
                jobs.push((key, i));
            }
        }

        let scores: Vec<f64> = jobs.par_iter()
            .map(|&(_, i)| evaluator.evaluate(&population[i]))
            .collect();
        for ((key, _), score) in jobs.into_iter().zip(scores) {
            self.cache.insert(key, score);
        }

        for i in pending {
            let score = self.cache[&population[i].cache_key()];
            population[i].set_fitness(score);
        }
    }

    fn evaluate_cached(&mut self, individual: &Individual, evaluator: &FitnessEvaluator) -> f64 {
        let key = individual.cache_key();
        match self.cache.get(&key) {
            Some(&score) => score,
            None => {
                let score = evaluator.evaluate(individual);
                self.cache.insert(key, score);
                score
            }
        }
    }
}

fn sort_by_fitness(population: &mut Vec<Individual>) {
    population.sort_by(|a, b| {
        a.fitness().unwrap_or(f64::INFINITY)
            .total_cmp(&b.fitness().unwrap_or(f64::INFINITY))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap as StdHashMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::plan::{AreaConstraint, AreaUnit, DynamicRules, RoomData};

    fn make_graph(side: usize) -> Arc<DiscretizedGraph> {
        let positions = (0..side)
            .flat_map(|y| (0..side).map(move |x| [x as f64 + 0.5, y as f64 + 0.5]))
            .collect();
        Arc::new(DiscretizedGraph::for_floor(positions))
    }

    fn make_evaluator(graph: Arc<DiscretizedGraph>) -> FitnessEvaluator {
        let rooms = RoomData::new(
            vec!["ent".into(), "gen".into(), "wc".into()],
            vec![
                vec![0.0, -1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.0, 0.0],
            ],
            vec![
                AreaConstraint::new("ent", Some(10.0), AreaUnit::Percent),
                AreaConstraint::new("gen", Some(70.0), AreaUnit::Percent),
                AreaConstraint::new("wc", Some(20.0), AreaUnit::Percent),
            ],
        )
        .unwrap();
        FitnessEvaluator::new(
            graph,
            &rooms,
            &StdHashMap::from([("ent".to_string(), vec![0u32])]),
            &DynamicRules::default(),
            100.0,
            1.0,
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn crossover_splits_at_first_parent_midpoint() {
        let a = Individual::new(vec![vec![1, 2, 3, 4]]);
        let b = Individual::new(vec![vec![5, 6, 7, 8]]);
        let (c1, c2) = crossover(&a, &b);
        assert_eq!(c1.seeds_of(0), &[1, 2, 7, 8]);
        assert_eq!(c2.seeds_of(0), &[5, 6, 3, 4]);
        assert_eq!(c1.fitness(), None);
    }

    #[test]
    fn crossover_tolerates_uneven_lengths() {
        let a = Individual::new(vec![vec![1, 2, 3, 4]]);
        let b = Individual::new(vec![vec![9]]);
        let (c1, c2) = crossover(&a, &b);
        // split = 2: b has nothing past index 2, a contributes its tail
        assert_eq!(c1.seeds_of(0), &[1, 2]);
        assert_eq!(c2.seeds_of(0), &[9, 3, 4]);
    }

    #[test]
    fn distance_is_zero_for_identical_individuals() {
        let graph = make_graph(4);
        let a = Individual::new(vec![vec![0], vec![5]]);
        assert_eq!(individual_distance(&a, &a, graph.positions()), 0.0);
    }

    #[test]
    fn distance_grows_with_seed_separation() {
        let graph = make_graph(4);
        let a = Individual::new(vec![vec![0]]);
        let near = Individual::new(vec![vec![1]]);
        let far = Individual::new(vec![vec![15]]);
        let d_near = individual_distance(&a, &near, graph.positions());
        let d_far = individual_distance(&a, &far, graph.positions());
        assert!(d_near < d_far);
        assert_eq!(d_near, 1.0);
    }

    #[test]
    fn distance_penalizes_count_mismatch_against_empty() {
        let graph = make_graph(4);
        let a = Individual::new(vec![vec![0, 1]]);
        let b = Individual::new(vec![vec![]]);
        assert_eq!(individual_distance(&a, &b, graph.positions()), 20.0);
    }

    #[test]
    fn diverse_selection_returns_between_one_and_k() {
        let graph = make_graph(4);
        let mut population: Vec<Individual> = (0..8)
            .map(|i| {
                let mut ind = Individual::new(vec![vec![i as NodeId], vec![(15 - i) as NodeId]]);
                ind.set_fitness(i as f64);
                ind
            })
            .collect();
        sort_by_fitness(&mut population);

        let picked = diverse_top_k(&population, graph.positions(), 3, 2.0);
        assert!(!picked.is_empty());
        assert!(picked.len() <= 3);
        // the best individual is always admitted
        assert_eq!(picked[0].fitness(), Some(0.0));
    }

    #[test]
    fn diverse_selection_rejects_near_duplicates() {
        let graph = make_graph(4);
        let mut population: Vec<Individual> = (0..4)
            .map(|i| {
                // all seeds within one cell of each other
                let mut ind = Individual::new(vec![vec![0], vec![i as NodeId]]);
                ind.set_fitness(i as f64);
                ind
            })
            .collect();
        sort_by_fitness(&mut population);

        let picked = diverse_top_k(&population, graph.positions(), 4, 10.0);
        assert_eq!(picked.len(), 1);
    }

    #[test]
    fn mutation_never_touches_fixed_types() {
        let graph = make_graph(5);
        let evaluator = make_evaluator(graph.clone());
        let optimizer = GeneticOptimizer::new(graph, GaParams::default(), 4, 1);
        let mut rng = StdRng::seed_from_u64(11);

        let movable = evaluator.movable_types();
        assert_eq!(movable, vec![1, 2]);
        for _ in 0..50 {
            let mut individual = Individual::new(vec![vec![0], vec![10], vec![20]]);
            optimizer.mutate(&mut individual, &movable, &mut rng);
            assert_eq!(individual.seeds_of(0), &[0], "fixed type must stay pinned");
            assert!(!individual.seeds_of(1).is_empty());
        }
    }

    #[test]
    fn local_search_never_worsens_fitness() {
        let graph = make_graph(5);
        let evaluator = make_evaluator(graph.clone());
        let mut optimizer = GeneticOptimizer::new(graph, GaParams::default(), 4, 1);
        let mut rng = StdRng::seed_from_u64(3);

        let mut individual = Individual::new(vec![vec![0], vec![12], vec![24]]);
        let before = evaluator.evaluate(&individual);
        let movable = evaluator.movable_types();
        optimizer.local_search(&mut individual, &evaluator, &movable, &mut rng);
        let after = evaluator.evaluate(&individual);
        assert!(after <= before);
    }

    #[test]
    fn best_fitness_is_monotone_across_generations() {
        let graph = make_graph(6);
        let evaluator = make_evaluator(graph.clone());
        let mut optimizer = GeneticOptimizer::new(graph, GaParams::default(), 8, 12);
        let mut rng = StdRng::seed_from_u64(42);

        let mut history = Vec::new();
        let survivors = optimizer
            .run(&evaluator, 3, Vec::new(), &mut rng, &mut |_, _, best| history.push(best))
            .unwrap();

        assert!(!history.is_empty());
        for window in history.windows(2) {
            assert!(window[1] <= window[0], "elitist truncation must never regress");
        }
        assert!(!survivors.is_empty());
        assert!(survivors.len() <= 3);
        assert_eq!(survivors[0].fitness(), Some(*history.last().unwrap()));
    }

    #[test]
    fn optimizer_beats_a_random_individual() {
        let graph = make_graph(5);
        let evaluator = make_evaluator(graph.clone());
        let mut optimizer = GeneticOptimizer::new(graph, GaParams::default(), 10, 15);
        let mut rng = StdRng::seed_from_u64(9);

        let random = Individual::random(evaluator.fixed_node_lists(), 25, &mut rng);
        let random_fitness = evaluator.evaluate(&random);

        let survivors = optimizer
            .run(&evaluator, 1, Vec::new(), &mut rng, &mut |_, _, _| {})
            .unwrap();
        assert!(survivors[0].fitness().unwrap() <= random_fitness);
    }

    #[test]
    fn provided_population_is_padded_and_pinned() {
        let graph = make_graph(5);
        let evaluator = make_evaluator(graph.clone());
        let mut optimizer = GeneticOptimizer::new(graph, GaParams::default(), 6, 2);
        let mut rng = StdRng::seed_from_u64(1);

        // seed individual with a wrong value in the fixed slot
        let seed = Individual::new(vec![vec![7], vec![3], vec![4]]);
        let survivors = optimizer
            .run(&evaluator, 1, vec![seed], &mut rng, &mut |_, _, _| {})
            .unwrap();
        assert_eq!(survivors[0].seeds_of(0), evaluator.fixed_nodes(0));
    }
}
