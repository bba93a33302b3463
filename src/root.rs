//! Selection of the process that makes the move decisions for a column group

use crate::comm::{Communicator, ReduceOp};

/// Find the member of `comm` holding the most pins. Ties go to the lowest rank.
///
/// Returns `(npins, rank)` of that member; every member gets the same answer. The best-informed
/// process decides the moves, the others only replay them.
pub fn find_root<C: Communicator>(npins: usize, comm: &C) -> (usize, usize) {
    let max = comm.all_reduce_scalar(ReduceOp::Max, npins);
    let candidate = if npins == max { comm.rank() } else { usize::MAX };
    let rank = comm.all_reduce_scalar(ReduceOp::Min, candidate);
    (max, rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{LocalGrid, SingleProcess};

    #[test]
    fn single_process_is_root() {
        assert_eq!(find_root(17, &SingleProcess), (17, 0));
        assert_eq!(find_root(0, &SingleProcess), (0, 0));
    }

    #[test]
    fn most_pins_wins() {
        let npins = [4, 9, 2, 9];
        let res = LocalGrid::new(4, 1).run(|r, _, comm| find_root(npins[r], &comm.col));
        assert!(res.iter().all(|&x| x == (9, 1)));
    }

    #[test]
    fn all_empty_picks_rank_zero() {
        let res = LocalGrid::new(3, 2).run(|_, _, comm| find_root(0, &comm.col));
        assert!(res.iter().all(|&x| x == (0, 0)));
    }
}
