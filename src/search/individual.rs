use rand::Rng;

use crate::types::{NodeId, TypeIndex};

/// A candidate solution: per-type seed node lists (dense, indexed by the
/// stage's type index) plus a lazily computed fitness.
///
/// Plain value type with clone-on-mutate semantics; every mutator clears
/// the cached fitness. Fixed types' seed lists are pinned by the caller and
/// never touched by the search operators.
#[derive(Clone, Debug, PartialEq)]
pub struct Individual {
    seeds: Vec<Vec<NodeId>>,
    fitness: Option<f64>,
}

impl Individual {
    pub fn new(seeds: Vec<Vec<NodeId>>) -> Self {
        Self { seeds, fitness: None }
    }

    /// One uniform-random seed per movable type; fixed types get their
    /// pinned nodes.
    pub(crate) fn random(
        fixed: &[Vec<NodeId>],
        n_nodes: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let seeds = fixed.iter()
            .map(|pinned| {
                if pinned.is_empty() {
                    vec![rng.random_range(0..n_nodes as NodeId)]
                } else {
                    pinned.clone()
                }
            })
            .collect();
        Self::new(seeds)
    }

    #[inline] pub fn seeds(&self) -> &[Vec<NodeId>] { &self.seeds }
    #[inline] pub fn seeds_of(&self, t: TypeIndex) -> &[NodeId] { &self.seeds[t] }
    #[inline] pub fn fitness(&self) -> Option<f64> { self.fitness }

    #[inline]
    pub(crate) fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    #[inline]
    pub(crate) fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    pub(crate) fn set_seed(&mut self, t: TypeIndex, i: usize, node: NodeId) {
        self.seeds[t][i] = node;
        self.fitness = None;
    }

    pub(crate) fn swap_types(&mut self, a: TypeIndex, b: TypeIndex) {
        self.seeds.swap(a, b);
        self.fitness = None;
    }

    pub(crate) fn push_seed(&mut self, t: TypeIndex, node: NodeId) {
        self.seeds[t].push(node);
        self.fitness = None;
    }

    pub(crate) fn remove_seed(&mut self, t: TypeIndex, i: usize) {
        self.seeds[t].remove(i);
        self.fitness = None;
    }

    /// Overwrite fixed types' seed lists with their pinned nodes.
    pub(crate) fn pin_fixed(&mut self, fixed: &[Vec<NodeId>]) {
        for (t, pinned) in fixed.iter().enumerate() {
            if !pinned.is_empty() && self.seeds.get(t) != Some(pinned) {
                while self.seeds.len() <= t {
                    self.seeds.push(Vec::new());
                }
                self.seeds[t] = pinned.clone();
                self.fitness = None;
            }
        }
    }

    /// Canonical memoization key: seed lists sorted within each type.
    pub(crate) fn cache_key(&self) -> Vec<Vec<NodeId>> {
        self.seeds.iter()
            .map(|nodes| {
                let mut sorted = nodes.clone();
                sorted.sort_unstable();
                sorted
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_individual_pins_fixed_types() {
        let mut rng = StdRng::seed_from_u64(7);
        let fixed = vec![vec![3, 4], Vec::new(), Vec::new()];
        let ind = Individual::random(&fixed, 10, &mut rng);

        assert_eq!(ind.seeds_of(0), &[3, 4]);
        assert_eq!(ind.seeds_of(1).len(), 1);
        assert_eq!(ind.seeds_of(2).len(), 1);
        assert!(ind.seeds_of(1)[0] < 10 && ind.seeds_of(2)[0] < 10);
    }

    #[test]
    fn mutators_invalidate_fitness() {
        let mut ind = Individual::new(vec![vec![1, 2], vec![5]]);
        ind.set_fitness(3.5);
        ind.set_seed(1, 0, 6);
        assert_eq!(ind.fitness(), None);

        ind.set_fitness(2.0);
        ind.push_seed(0, 9);
        assert_eq!(ind.fitness(), None);

        ind.set_fitness(1.0);
        ind.remove_seed(0, 2);
        assert_eq!(ind.fitness(), None);
        assert_eq!(ind.seeds_of(0), &[1, 2]);
    }

    #[test]
    fn cache_key_ignores_seed_order_within_a_type() {
        let a = Individual::new(vec![vec![4, 1, 2]]);
        let b = Individual::new(vec![vec![2, 4, 1]]);
        assert_eq!(a.cache_key(), b.cache_key());

        let c = Individual::new(vec![vec![1, 2, 5]]);
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn pin_fixed_overwrites_only_fixed_types() {
        let mut ind = Individual::new(vec![vec![9], vec![7]]);
        ind.set_fitness(1.0);
        ind.pin_fixed(&[vec![0, 1], Vec::new()]);
        assert_eq!(ind.seeds_of(0), &[0, 1]);
        assert_eq!(ind.seeds_of(1), &[7]);
        assert_eq!(ind.fitness(), None);
    }

    #[test]
    fn pin_fixed_keeps_fitness_when_already_pinned() {
        let mut ind = Individual::new(vec![vec![0, 1], vec![7]]);
        ind.set_fitness(1.0);
        ind.pin_fixed(&[vec![0, 1], Vec::new()]);
        assert_eq!(ind.fitness(), Some(1.0));
    }
}
