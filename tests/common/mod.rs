#![allow(dead_code)]

use phg::comm::LocalGrid;
use phg::debug::compute_cut;
use phg::dist::{gather_part, local_part, shard};
use phg::fm::fm2_refine;
use phg::graph_gen::HypergraphBuilder;
use phg::{Hypergraph, RefineParams, RefineStats};

/// Grid shapes `(nprow, npcol)` every multi-process test runs on.
pub const SHAPES: [(usize, usize); 5] = [(1, 1), (1, 2), (2, 1), (2, 2), (3, 2)];

/// A random test case: a whole hypergraph and a starting bisection.
pub struct Case {
    pub global: Hypergraph,
    pub part: Vec<usize>,
}

impl Case {
    pub fn random(nvtx: usize, nedge: usize, max_size: usize, seed: u64) -> Self {
        let mut b = HypergraphBuilder::new(nvtx, seed);
        b.random_edges(nedge / 2, max_size)
            .local_edges(nedge - nedge / 2, max_size, 2 * max_size)
            .random_vwgt(4)
            .random_ewgt(3);
        Self {
            global: b.build().unwrap(),
            part: b.random_bisection(),
        }
    }

    pub fn total_weight(&self) -> f64 {
        let w = self.global.part_weights(&self.part);
        w[0] + w[1]
    }
}

/// What every process of a grid run reported, in row-major order.
pub struct GridRun {
    pub nprow: usize,
    pub npcol: usize,
    pub parts: Vec<Vec<usize>>,
    pub stats: Vec<RefineStats>,
}

impl GridRun {
    pub fn at(&self, r: usize, c: usize) -> usize {
        r * self.npcol + c
    }

    /// The global partition, taken from grid row 0.
    pub fn gathered(&self) -> Vec<usize> {
        gather_part(&self.parts[..self.npcol])
    }

    /// Every process of a column ended with the same local partition.
    pub fn replicas_agree(&self) -> bool {
        (0..self.npcol).all(|c| {
            (1..self.nprow).all(|r| self.parts[self.at(r, c)] == self.parts[self.at(0, c)])
        })
    }
}

pub fn run_fm2(case: &Case, nprow: usize, npcol: usize, params: &RefineParams, bal_tol: f64) -> GridRun {
    let res = LocalGrid::new(nprow, npcol).run(|r, c, comm| {
        let hg = shard(&case.global, nprow, npcol, r, c).unwrap();
        let mut part = local_part(&case.part, npcol, c);
        let stats = fm2_refine(&hg, &comm, &mut part, params, bal_tol).unwrap();
        (part, stats)
    });
    let (parts, stats) = res.into_iter().unzip();
    GridRun {
        nprow,
        npcol,
        parts,
        stats,
    }
}

pub fn cut_of(case: &Case, part: &[usize]) -> f64 {
    compute_cut(&case.global, part)
}
