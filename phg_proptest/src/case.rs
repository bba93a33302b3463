use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use phg::comm::LocalGrid;
use phg::debug::compute_cut;
use phg::dist::{gather_part, local_part, shard};
use phg::fm::fm2_refine;
use phg::graph_gen::HypergraphBuilder;
use phg::{Hypergraph, RefineParams, RefineStats};
use thiserror::Error;

/// A whole hypergraph, a starting bisection and the grid to refine it on.
#[derive(Clone, Debug)]
pub struct Case {
    pub nvtx: usize,
    pub edges: Vec<Vec<usize>>,
    pub vwgt: Option<Vec<f64>>,
    pub ewgt: Option<Vec<f64>>,
    pub part: Vec<usize>,
    pub nprow: usize,
    pub npcol: usize,
    pub bal_tol: f64,
    pub params: RefineParams,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Failure {
    #[error("invalid case: {0}")]
    Invalid(#[from] phg::HypergraphError),

    #[error("refinement failed: {0}")]
    Refine(#[from] phg::RefineError),

    #[error("a process panicked: {0}")]
    Panic(String),

    #[error("processes of column {col} disagree on the partition")]
    Replicas { col: usize },

    #[error("vertex {vtx} ended in part {label}")]
    Label { vtx: usize, label: usize },

    #[error("process {rank} reports {which} cut {reported}, the partition has {actual}")]
    Cut {
        rank: usize,
        which: &'static str,
        reported: f64,
        actual: f64,
    },

    #[error("process {rank} reports weights {reported:?}, the partition has {actual:?}")]
    Weight {
        rank: usize,
        reported: [f64; 2],
        actual: [f64; 2],
    },

    #[error("side {side} grew from {start} to {end}, over its limit {max}")]
    Balance {
        side: usize,
        start: f64,
        end: f64,
        max: f64,
    },

    #[error("two runs of the same case differ")]
    Nondeterministic,
}

/// What a successful run looked like on process 0.
pub struct Outcome {
    pub part: Vec<usize>,
    pub stats: RefineStats,
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

impl Case {
    pub fn random(
        nvtx: usize,
        nedge: usize,
        max_size: usize,
        grid: (usize, usize),
        bal_tol: f64,
        seed: u64,
    ) -> Self {
        let mut b = HypergraphBuilder::new(nvtx, seed);
        b.random_edges(nedge / 2, max_size)
            .local_edges(nedge - nedge / 2, max_size, 2 * max_size)
            .random_vwgt(5)
            .random_ewgt(4);
        let part = b.random_bisection();
        let hg = b.build().expect("generated hypergraphs are valid");
        Self {
            nvtx: hg.nvtx(),
            edges: hg.edges_iter().map(<[usize]>::to_vec).collect(),
            vwgt: hg.vwgts().map(<[f64]>::to_vec),
            ewgt: hg.ewgts().map(<[f64]>::to_vec),
            part,
            nprow: grid.0,
            npcol: grid.1,
            bal_tol,
            params: RefineParams::default(),
        }
    }

    pub fn build(&self) -> Result<Hypergraph, phg::HypergraphError> {
        let mut hg = Hypergraph::from_edges(self.nvtx, &self.edges)?;
        if let Some(vwgt) = &self.vwgt {
            hg = hg.with_vwgt(vwgt.clone())?;
        }
        if let Some(ewgt) = &self.ewgt {
            hg = hg.with_ewgt(ewgt.clone())?;
        }
        Ok(hg)
    }

    /// One refinement on the simulated grid; per process results in row-major order.
    fn run_once(&self, global: &Hypergraph) -> Result<Vec<(Vec<usize>, RefineStats)>, Failure> {
        let grid = LocalGrid::new(self.nprow, self.npcol);
        let res = catch_unwind(AssertUnwindSafe(|| {
            grid.run(|r, c, comm| {
                let hg = shard(global, self.nprow, self.npcol, r, c)?;
                let mut part = local_part(&self.part, self.npcol, c);
                let stats = fm2_refine(&hg, &comm, &mut part, &self.params, self.bal_tol)?;
                Ok::<_, Failure>((part, stats))
            })
        }))
        .map_err(|e| {
            let msg = e
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| e.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_default();
            Failure::Panic(msg)
        })?;
        res.into_iter().collect()
    }

    /// Refine twice and check everything that must hold of the result.
    pub fn check(&self) -> Result<Outcome, Failure> {
        let global = self.build()?;
        let first = self.run_once(&global)?;

        for c in 0..self.npcol {
            for r in 1..self.nprow {
                if first[r * self.npcol + c].0 != first[c].0 {
                    return Err(Failure::Replicas { col: c });
                }
            }
        }
        let cols: Vec<_> = first[..self.npcol].iter().map(|(p, _)| p).collect();
        let part = gather_part(&cols);
        if let Some((vtx, &label)) = part.iter().enumerate().find(|(_, &p)| p > 1) {
            return Err(Failure::Label { vtx, label });
        }

        let before = compute_cut(&global, &self.part);
        let after = compute_cut(&global, &part);
        let weights = global.part_weights(&part);
        for (rank, (_, stats)) in first.iter().enumerate() {
            if !close(stats.initial_cut, before) {
                return Err(Failure::Cut {
                    rank,
                    which: "initial",
                    reported: stats.initial_cut,
                    actual: before,
                });
            }
            if !close(stats.final_cut, after) {
                return Err(Failure::Cut {
                    rank,
                    which: "final",
                    reported: stats.final_cut,
                    actual: after,
                });
            }
            if stats.passes > 0
                && !(close(stats.weights[0], weights[0]) && close(stats.weights[1], weights[1]))
            {
                return Err(Failure::Weight {
                    rank,
                    reported: stats.weights,
                    actual: weights,
                });
            }
        }

        let start = global.part_weights(&self.part);
        let total = start[0] + start[1];
        for side in 0..2 {
            let max = total * self.bal_tol * self.params.fraction(side);
            if start[side] <= max && weights[side] > max + 1e-9 * max.max(1.0) {
                return Err(Failure::Balance {
                    side,
                    start: start[side],
                    end: weights[side],
                    max,
                });
            }
        }

        let second = self.run_once(&global)?;
        let same = first.len() == second.len()
            && first.iter().zip(&second).all(|(a, b)| {
                a.0 == b.0 && a.1.final_cut.to_bits() == b.1.final_cut.to_bits() && a.1.history == b.1.history
            });
        if !same {
            return Err(Failure::Nondeterministic);
        }

        let (_, stats) = first.into_iter().next().unwrap_or_default();
        Ok(Outcome { part, stats })
    }

    /// Remove vertex `v`, renumbering the ones above it.
    pub fn without_vertex(&self, v: usize) -> Self {
        let mut case = self.clone();
        case.nvtx -= 1;
        for edge in &mut case.edges {
            edge.retain(|&u| u != v);
            for u in edge.iter_mut() {
                if *u > v {
                    *u -= 1;
                }
            }
        }
        case.part.remove(v);
        if let Some(vwgt) = &mut case.vwgt {
            vwgt.remove(v);
        }
        case
    }

    /// Remove the hyperedges in `range`.
    pub fn without_edges(&self, range: std::ops::Range<usize>) -> Self {
        let mut case = self.clone();
        case.edges.drain(range.clone());
        if let Some(ewgt) = &mut case.ewgt {
            ewgt.drain(range);
        }
        case
    }

    pub fn npins(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "% {} vertices, {} edges, grid {}x{}, tolerance {}",
            self.nvtx,
            self.edges.len(),
            self.nprow,
            self.npcol,
            self.bal_tol
        )?;
        for (e, pins) in self.edges.iter().enumerate() {
            let w = self.ewgt.as_ref().map_or(1.0, |w| w[e]);
            let pins: Vec<_> = pins.iter().map(usize::to_string).collect();
            writeln!(f, "e{e} [{w}]: {}", pins.join(" "))?;
        }
        for v in 0..self.nvtx {
            let w = self.vwgt.as_ref().map_or(1.0, |w| w[v]);
            writeln!(f, "v{v} [{w}]: part {}", self.part[v])?;
        }
        Ok(())
    }
}
