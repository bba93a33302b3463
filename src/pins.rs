//! Per-hyperedge pin distribution over the two parts.
//!
//! `lpins[p][e]` counts the pins of `e` in part `p` among this process's vertices; summing it
//! over the row group gives `pins[p][e]`. The two parts are kept in independent arrays.

use crate::comm::{Communicator, ReduceOp};
use crate::error::RefineResult;
use crate::hypergraph::Hypergraph;
use crate::wspace::try_alloc;

pub struct PinCounts {
    pins: [Vec<u32>; 2],
    lpins: [Vec<u32>; 2],
}

impl PinCounts {
    pub fn new(nedge: usize) -> RefineResult<Self> {
        Ok(Self {
            pins: [try_alloc("pins[0]", nedge, 0)?, try_alloc("pins[1]", nedge, 0)?],
            lpins: [try_alloc("lpins[0]", nedge, 0)?, try_alloc("lpins[1]", nedge, 0)?],
        })
    }

    /// Rebuild the local counts from `part`.
    pub fn initialize(&mut self, hg: &Hypergraph, part: &[usize]) {
        self.lpins[0].fill(0);
        self.lpins[1].fill(0);
        for (edge, pins) in hg.edges_iter().enumerate() {
            for &vtx in pins {
                self.lpins[part[vtx]][edge] += 1;
            }
        }
    }

    /// Reduce the local counts over the row group into the global counts.
    pub fn globalize<C: Communicator>(&mut self, row: &C) {
        for p in 0..2 {
            self.pins[p].copy_from_slice(&self.lpins[p]);
            row.all_reduce(ReduceOp::Sum, &mut self.pins[p]);
        }
    }

    /// Account for `vtx` moving from `from` to `to` in both the global and the local counts.
    pub fn apply_move(&mut self, hg: &Hypergraph, vtx: usize, from: usize, to: usize) {
        for &edge in hg.vertex_edges(vtx) {
            self.pins[from][edge] -= 1;
            self.pins[to][edge] += 1;
            self.lpins[from][edge] -= 1;
            self.lpins[to][edge] += 1;
        }
    }

    /// Replica side of [`PinCounts::apply_move`]: only the local counts are maintained, the global
    /// ones are rebuilt by the next [`PinCounts::globalize`].
    pub fn replay_move(&mut self, hg: &Hypergraph, vtx: usize, from: usize, to: usize) {
        for &edge in hg.vertex_edges(vtx) {
            self.lpins[from][edge] -= 1;
            self.lpins[to][edge] += 1;
        }
    }

    #[inline]
    pub fn pins(&self, part: usize, edge: usize) -> u32 {
        self.pins[part][edge]
    }

    #[inline]
    pub fn lpins(&self, part: usize, edge: usize) -> u32 {
        self.lpins[part][edge]
    }

    /// Total number of pins of `edge` over the whole row.
    #[inline]
    pub fn degree(&self, edge: usize) -> u32 {
        self.pins[0][edge] + self.pins[1][edge]
    }

    pub fn local_counts(&self) -> [&[u32]; 2] {
        [&self.lpins[0], &self.lpins[1]]
    }

    pub fn global_counts(&self) -> [&[u32]; 2] {
        [&self.pins[0], &self.pins[1]]
    }

    /// Weight of the local hyperedges that have pins in both parts.
    pub fn local_cut(&self, hg: &Hypergraph) -> f64 {
        (0..hg.nedge())
            .filter(|&e| self.pins[0][e] > 0 && self.pins[1][e] > 0)
            .map(|e| hg.ewgt(e))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{LocalGrid, SingleProcess};

    fn sample() -> Hypergraph {
        Hypergraph::from_edges(5, [vec![0, 1, 2], vec![2, 3], vec![4], vec![1, 3, 4]])
            .unwrap()
            .with_ewgt(vec![1.0, 2.0, 4.0, 8.0])
            .unwrap()
    }

    #[test]
    fn counts_and_cut() {
        let hg = sample();
        let part = [0, 0, 1, 1, 0];
        let mut pc = PinCounts::new(hg.nedge()).unwrap();
        pc.initialize(&hg, &part);
        pc.globalize(&SingleProcess);

        assert_eq!(pc.global_counts(), [&[2, 0, 1, 2][..], &[1, 2, 0, 1][..]]);
        for e in 0..hg.nedge() {
            assert_eq!(pc.degree(e) as usize, hg.local_degree(e));
        }
        assert_eq!(pc.local_cut(&hg), 1.0 + 8.0);
    }

    #[test]
    fn move_keeps_conservation() {
        let hg = sample();
        let mut part = [0, 0, 1, 1, 0];
        let mut pc = PinCounts::new(hg.nedge()).unwrap();
        pc.initialize(&hg, &part);
        pc.globalize(&SingleProcess);

        pc.apply_move(&hg, 3, 1, 0);
        part[3] = 0;
        for e in 0..hg.nedge() {
            assert_eq!(pc.degree(e) as usize, hg.local_degree(e));
            assert_eq!(pc.pins(0, e), pc.lpins(0, e));
        }
        assert_eq!(pc.local_cut(&hg), 1.0 + 2.0);

        // replay only touches the local counts
        pc.replay_move(&hg, 3, 0, 1);
        assert_eq!(pc.lpins(1, 1), 2);
        assert_eq!(pc.pins(1, 1), 1);
        pc.globalize(&SingleProcess);
        assert_eq!(pc.pins(1, 1), 2);
    }

    #[test]
    fn globalize_sums_over_row() {
        // one hyperedge spread over two vertex slices
        let res = LocalGrid::new(1, 2).run(|_, c, comm| {
            let hg = Hypergraph::from_edges(2, [[0, 1]]).unwrap();
            let part = if c == 0 { [0, 0] } else { [0, 1] };
            let mut pc = PinCounts::new(1).unwrap();
            pc.initialize(&hg, &part);
            pc.globalize(&comm.row);
            (pc.pins(0, 0), pc.pins(1, 0), pc.lpins(0, 0))
        });
        assert_eq!(res, vec![(3, 1, 2), (3, 1, 1)]);
    }
}
