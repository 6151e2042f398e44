/// Derive per-type target node counts from area shares.
///
/// Shares without an explicit value split the unassigned remainder equally;
/// the full vector is then renormalized. When `n_nodes >= num_zones` every
/// type gets at least one node plus its floor share of the rest, with the
/// residual allocated to the largest fractional remainders; otherwise only
/// the `n_nodes` highest-share types receive one node each. The returned
/// counts always sum to exactly `n_nodes`.
pub(crate) fn target_counts(shares: &[Option<f64>], n_nodes: usize) -> Vec<u32> {
    let num_zones = shares.len();
    if num_zones == 0 {
        return Vec::new();
    }

    let defined_sum: f64 = shares.iter().flatten().sum();
    let num_unassigned = shares.iter().filter(|s| s.is_none()).count();
    let remainder_each = if num_unassigned > 0 {
        (1.0 - defined_sum).max(0.0) / num_unassigned as f64
    } else {
        0.0
    };
    let mut resolved: Vec<f64> = shares.iter()
        .map(|s| s.unwrap_or(remainder_each))
        .collect();

    let total: f64 = resolved.iter().sum();
    if total > 1e-6 {
        for share in &mut resolved {
            *share /= total;
        }
    } else {
        resolved.fill(1.0 / num_zones as f64);
    }

    if n_nodes < num_zones {
        let mut order: Vec<usize> = (0..num_zones).collect();
        order.sort_by(|&a, &b| resolved[a].total_cmp(&resolved[b]));
        let mut counts = vec![0u32; num_zones];
        for &idx in order.iter().rev().take(n_nodes) {
            counts[idx] = 1;
        }
        return counts;
    }

    let remaining = (n_nodes - num_zones) as f64;
    let mut counts: Vec<u32> = resolved.iter()
        .map(|share| 1 + (share * remaining).floor() as u32)
        .collect();

    let deficit = n_nodes - counts.iter().sum::<u32>() as usize;
    if deficit > 0 {
        let mut order: Vec<usize> = (0..num_zones).collect();
        order.sort_by(|&a, &b| {
            let fract = |i: usize| resolved[i] * remaining - (resolved[i] * remaining).floor();
            fract(a).total_cmp(&fract(b))
        });
        for &idx in order.iter().rev().take(deficit) {
            counts[idx] += 1;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_sum_to_node_count_exactly() {
        for n_nodes in [1usize, 3, 7, 25, 100, 1234] {
            let shares = [Some(0.1), Some(0.25), None, None, Some(0.3)];
            let counts = target_counts(&shares, n_nodes);
            assert_eq!(counts.iter().sum::<u32>() as usize, n_nodes, "n_nodes={n_nodes}");
        }
    }

    #[test]
    fn every_positive_share_gets_at_least_one_node() {
        let shares = [Some(0.9), Some(0.05), Some(0.05)];
        let counts = target_counts(&shares, 10);
        assert!(counts.iter().all(|&c| c >= 1));
        assert_eq!(counts.iter().sum::<u32>(), 10);
    }

    #[test]
    fn unassigned_shares_split_the_remainder_equally() {
        let shares = [Some(0.5), None, None];
        let counts = target_counts(&shares, 100);
        // 0.5 / 0.25 / 0.25
        assert_eq!(counts, vec![50, 25, 25]);
    }

    #[test]
    fn fewer_nodes_than_zones_favors_highest_shares() {
        let shares = [Some(0.1), Some(0.6), Some(0.3)];
        let counts = target_counts(&shares, 2);
        assert_eq!(counts, vec![0, 1, 1]);
    }

    #[test]
    fn residual_goes_to_largest_fractional_remainder() {
        // remaining = 7, shares 0.5/0.3/0.2 -> raw 3.5/2.1/1.4 -> floors 3/2/1, deficit 1
        let shares = [Some(0.5), Some(0.3), Some(0.2)];
        let counts = target_counts(&shares, 10);
        assert_eq!(counts, vec![1 + 4, 1 + 2, 1 + 1]);
    }

    #[test]
    fn zero_total_share_falls_back_to_uniform() {
        let shares = [Some(0.0), Some(0.0)];
        let counts = target_counts(&shares, 10);
        assert_eq!(counts, vec![5, 5]);
    }

    #[test]
    fn empty_shares_yield_empty_counts() {
        assert!(target_counts(&[], 10).is_empty());
    }
}
