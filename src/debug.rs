//! From-scratch recomputation of the refinement state, for self checks

use crate::comm::{Communicator, ReduceOp};
use crate::hypergraph::Hypergraph;
use crate::pins::PinCounts;

/// Computes the weight of the local hyperedges with local pins in both parts.
///
/// This is the global cut when the shard holds the whole hypergraph.
pub fn compute_cut(hg: &Hypergraph, part: &[usize]) -> f64 {
    let mut cut = 0.0;
    for (e, pins) in hg.edges_iter().enumerate() {
        let mut seen = [false; 2];
        for &v in pins {
            seen[part[v]] = true;
        }
        if seen[0] && seen[1] {
            cut += hg.ewgt(e);
        }
    }
    cut
}

/// Computes the local pin counts of every hyperedge from `part`.
pub fn compute_lpins(hg: &Hypergraph, part: &[usize]) -> [Vec<u32>; 2] {
    let mut lpins = [vec![0; hg.nedge()], vec![0; hg.nedge()]];
    for (e, pins) in hg.edges_iter().enumerate() {
        for &v in pins {
            lpins[part[v]][e] += 1;
        }
    }
    lpins
}

/// Checks the tracked local pin counts against a recomputation from `part`.
pub fn check_lpins(hg: &Hypergraph, part: &[usize], pins: &PinCounts) -> bool {
    let [l0, l1] = compute_lpins(hg, part);
    let [t0, t1] = pins.local_counts();
    if l0 != t0 || l1 != t1 {
        error!("local pin counts diverged from the partition");
        return false;
    }
    true
}

/// Checks that `pins[0][e] + pins[1][e]` is the degree of `e` over the whole row.
///
/// Collective over `row`: every member must call it.
pub fn check_pin_conservation<C: Communicator>(hg: &Hypergraph, pins: &PinCounts, row: &C) -> bool {
    let mut degree: Vec<u32> = (0..hg.nedge()).map(|e| hg.local_degree(e) as u32).collect();
    row.all_reduce(ReduceOp::Sum, &mut degree);
    for e in 0..hg.nedge() {
        if pins.degree(e) != degree[e] {
            error!(
                "edge {e}: {} + {} pins, degree {}",
                pins.pins(0, e),
                pins.pins(1, e),
                degree[e]
            );
            return false;
        }
    }
    true
}

/// Checks `weights[0] + weights[1] == total` up to rounding.
pub fn check_weights(weights: [f64; 2], total: f64) -> bool {
    let sum = weights[0] + weights[1];
    if (sum - total).abs() > 1e-9 * total.abs().max(1.0) {
        error!("part weights {weights:?} do not add up to {total}");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SingleProcess;

    #[test]
    fn cut_counts_split_edges() {
        let hg = Hypergraph::from_edges(4, [vec![0, 1], vec![2, 3], vec![1, 2], vec![3]])
            .unwrap()
            .with_ewgt(vec![1.0, 2.0, 4.0, 8.0])
            .unwrap();
        assert_eq!(compute_cut(&hg, &[0, 0, 1, 1]), 4.0);
        assert_eq!(compute_cut(&hg, &[0, 1, 0, 1]), 7.0);
        assert_eq!(compute_cut(&hg, &[1, 1, 1, 1]), 0.0);
    }

    #[test]
    fn tracked_counts_match() {
        let hg = Hypergraph::from_edges(3, [vec![0, 1, 2], vec![1, 2]]).unwrap();
        let part = [0, 1, 1];
        let mut pins = PinCounts::new(hg.nedge()).unwrap();
        pins.initialize(&hg, &part);
        pins.globalize(&SingleProcess);
        assert!(check_lpins(&hg, &part, &pins));
        assert!(check_pin_conservation(&hg, &pins, &SingleProcess));
        assert!(!check_lpins(&hg, &[0, 0, 1], &pins));
        assert_eq!(compute_lpins(&hg, &part), [vec![1, 0], vec![2, 2]]);
    }

    #[test]
    fn weights() {
        assert!(check_weights([1.5, 2.5], 4.0));
        assert!(!check_weights([1.5, 2.0], 4.0));
    }
}
