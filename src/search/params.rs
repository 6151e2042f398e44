/// Tuned constants of the genetic search. Callers override fields off
/// [`GaParams::default`] instead of passing magic numbers.
#[derive(Clone, Debug)]
pub struct GaParams {
    /// Probability of crossing an adjacent offspring pair.
    pub cxpb: f64,
    /// Probability of mutating an offspring.
    pub mutpb: f64,
    /// Probability of swapping two movable types' whole seed lists.
    pub swap_pb: f64,
    /// Probability of duplicating a random seed within a movable type.
    pub dup_pb: f64,
    /// Probability of pruning a seed from a movable type holding more than one.
    pub prune_pb: f64,
    /// Tournament size for parent selection.
    pub tournsize: usize,
    /// Consecutive non-improving generations before stopping early.
    pub stagnation_limit: usize,
    /// Smallest best-fitness drop that counts as an improvement.
    pub min_improvement: f64,
    /// Random-walk decay factor; mean walk length is `walk_decay * walk_scale`.
    pub walk_decay: f64,
    /// Random-walk scale factor.
    pub walk_scale: f64,
    /// Minimum mean seed distance between diverse top-K survivors.
    pub diversity_threshold: f64,
    /// Apply the stochastic local search to unevaluated offspring.
    pub use_local_search: bool,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            cxpb: 0.6,
            mutpb: 0.4,
            swap_pb: 0.1,
            dup_pb: 0.05,
            prune_pb: 0.05,
            tournsize: 3,
            stagnation_limit: 15,
            min_improvement: 1e-6,
            walk_decay: 0.05,
            walk_scale: 10.0,
            diversity_threshold: 2.0,
            use_local_search: true,
        }
    }
}
