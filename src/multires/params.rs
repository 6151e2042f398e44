use crate::error::LayoutError;
use crate::plan::DynamicRules;
use crate::search::GaParams;

/// Per-run configuration of the coarse-to-fine optimization schedule.
///
/// The three schedule vectors are indexed by resolution stage and must have
/// the same nonzero length; stage 0 is the coarsest.
#[derive(Clone, Debug)]
pub struct RunParams {
    /// Per-stage target node count for each floor's lattice.
    pub target_node_counts: Vec<usize>,
    /// Per-stage generation budget.
    pub generations: Vec<usize>,
    /// Per-stage population size.
    pub pop_sizes: Vec<usize>,
    /// Total gross floor area, used to normalize raw-area constraints.
    pub total_gfa: f64,
    /// Number of diverse layouts carried out of the coarse stage. Each is
    /// refined independently through the remaining stages.
    pub num_layouts: usize,
    /// Soft scoring rules applied at every stage.
    pub dynamic_rules: DynamicRules,
    /// Genetic-search constants shared by all stages.
    pub ga: GaParams,
    /// Weight of the squared area-deviation penalty.
    pub w_area: f64,
    /// Weight of the cross-type adjacency penalty.
    pub w_adj: f64,
    /// Seed of the run's deterministic random stream.
    pub seed: u64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            target_node_counts: vec![60, 250],
            generations: vec![60, 40],
            pop_sizes: vec![24, 16],
            total_gfa: 0.0,
            num_layouts: 3,
            dynamic_rules: DynamicRules::default(),
            ga: GaParams::default(),
            w_area: 1.0,
            w_adj: 1.0,
            seed: 0,
        }
    }
}

impl RunParams {
    /// Get the number of resolution stages.
    #[inline] pub fn n_stages(&self) -> usize { self.target_node_counts.len() }

    pub fn validate(&self) -> Result<(), LayoutError> {
        let stages = self.n_stages();
        if stages == 0 {
            return Err(LayoutError::Configuration(
                "schedule must define at least one resolution stage".into(),
            ));
        }
        if self.generations.len() != stages || self.pop_sizes.len() != stages {
            return Err(LayoutError::Configuration(format!(
                "schedule lengths disagree: {stages} node counts, {} generation budgets, {} population sizes",
                self.generations.len(),
                self.pop_sizes.len(),
            )));
        }
        if self.target_node_counts.contains(&0) {
            return Err(LayoutError::Configuration(
                "target node counts must be at least 1 per stage".into(),
            ));
        }
        if self.generations.contains(&0) {
            return Err(LayoutError::Configuration(
                "generation budgets must be at least 1 per stage".into(),
            ));
        }
        if self.pop_sizes.contains(&0) {
            return Err(LayoutError::Configuration(
                "population sizes must be at least 1 per stage".into(),
            ));
        }
        if self.num_layouts == 0 {
            return Err(LayoutError::Configuration("num_layouts must be at least 1".into()));
        }
        Ok(())
    }

    /// Total progress work units: the coarse stage runs once, every later
    /// stage runs once per carried layout.
    pub(crate) fn total_work(&self) -> usize {
        self.generations[0]
            + self.generations[1..].iter().sum::<usize>() * self.num_layouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_validates() {
        assert!(RunParams::default().validate().is_ok());
    }

    #[test]
    fn mismatched_schedule_lengths_are_rejected() {
        let params = RunParams {
            target_node_counts: vec![50, 200],
            generations: vec![10],
            pop_sizes: vec![8, 8],
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(LayoutError::Configuration(_))));
    }

    #[test]
    fn zero_layouts_are_rejected() {
        let params = RunParams { num_layouts: 0, ..Default::default() };
        assert!(matches!(params.validate(), Err(LayoutError::Configuration(_))));
    }

    #[test]
    fn zero_schedule_entries_are_rejected() {
        let zeroed = [
            RunParams { pop_sizes: vec![24, 0], ..Default::default() },
            RunParams { generations: vec![0, 40], ..Default::default() },
            RunParams { target_node_counts: vec![60, 0], ..Default::default() },
        ];
        for params in zeroed {
            assert!(matches!(params.validate(), Err(LayoutError::Configuration(_))));
        }
    }

    #[test]
    fn total_work_counts_branched_stages_per_layout() {
        let params = RunParams {
            target_node_counts: vec![50, 100, 200],
            generations: vec![30, 20, 10],
            pop_sizes: vec![8, 8, 8],
            num_layouts: 4,
            ..Default::default()
        };
        assert_eq!(params.total_work(), 30 + (20 + 10) * 4);
    }
}
