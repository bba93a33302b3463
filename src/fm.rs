//! Two-way FM refinement of a distributed bisection.
//!
//! Every pass moves vertices in one direction only, alternating between passes. In each column
//! group the root decides the moves from the summed gains of the group's vertices and the other
//! members replay them. Pin counts and part weights are made consistent over the row groups once
//! per pass.

use crate::comm::{Communicator, GridComm, ReduceOp};
use crate::debug;
use crate::defs::SUCCESSIVE_FAILS_TO_STOP;
use crate::error::{RefineError, RefineResult};
use crate::hypergraph::Hypergraph;
use crate::moves::{Move, MoveLog};
use crate::params::{DbgLvl, RefineParams};
use crate::pins::PinCounts;
use crate::pqueue::GainHeap;
use crate::root::find_root;
use crate::util::other;
use crate::wspace::{Mark, Role, RootState, Workspace};

/// Summary of one pass, as seen by one process.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PassStats {
    /// the side vertices were moved away from
    pub from: usize,
    /// global cut at the start of the pass
    pub cut: f64,
    /// moves kept by this process's column group
    pub kept: usize,
    /// vertices examined by the root, kept or not; 0 on other processes
    pub examined: usize,
    /// predicted cut at the best point; only known on the root
    pub best_cut: Option<f64>,
    /// local imbalance at the best point; only known on the root
    pub best_limbal: Option<f64>,
}

/// Outcome of a refinement call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefineStats {
    pub passes: usize,
    /// moves kept by this process's column group over all passes
    pub moves: usize,
    pub initial_cut: f64,
    pub final_cut: f64,
    /// final global part weights
    pub weights: [f64; 2],
    pub history: Vec<PassStats>,
}

/// Part weights and the balance limits derived from them.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Balance {
    pub weights: [f64; 2],
    pub lweights: [f64; 2],
    pub total: f64,
    pub targetw0: f64,
    pub max: [f64; 2],
    pub ltargetw0: f64,
    pub lmax: [f64; 2],
}

impl Balance {
    /// Collective over `row`.
    pub fn compute<C: Communicator>(
        hg: &Hypergraph,
        part: &[usize],
        row: &C,
        params: &RefineParams,
        bal_tol: f64,
    ) -> Self {
        let lweights = hg.part_weights(part);
        let mut weights = lweights;
        row.all_reduce(ReduceOp::Sum, &mut weights);
        let total = weights[0] + weights[1];

        let mut bal = Self {
            weights,
            lweights,
            total,
            targetw0: total * params.ratio,
            max: [0, 1].map(|p| total * bal_tol * params.fraction(p)),
            ltargetw0: 0.0,
            lmax: [0.0; 2],
        };
        bal.retarget();
        bal
    }

    /// Recompute the weights from `part` after a pass. Collective over `row`.
    pub fn refresh<C: Communicator>(&mut self, hg: &Hypergraph, part: &[usize], row: &C) {
        self.lweights = hg.part_weights(part);
        self.weights = self.lweights;
        row.all_reduce(ReduceOp::Sum, &mut self.weights);
        self.retarget();
    }

    /// Scale the global targets down to this process's share of each part. A part with no
    /// weight anywhere keeps the global values.
    pub fn retarget(&mut self) {
        self.ltargetw0 = if self.weights[0] > 0.0 {
            self.targetw0 * self.lweights[0] / self.weights[0]
        } else {
            self.targetw0
        };
        for p in 0..2 {
            self.lmax[p] = if self.weights[p] > 0.0 {
                self.lweights[p] + (self.max[p] - self.weights[p]) * self.lweights[p] / self.weights[p]
            } else {
                self.max[p]
            };
        }
    }

    /// Relative deviation of the local weight of part 0 from its local target.
    pub fn limbal(&self) -> f64 {
        if self.ltargetw0 == 0.0 {
            0.0
        } else {
            (self.lweights[0] - self.ltargetw0).abs() / self.ltargetw0
        }
    }
}

/// Partial gains of moving the `from` vertices, counting only the local hyperedges. Vertices on
/// the other side get 0. Hyperedges with a single pin never contribute.
pub(crate) fn compute_partial_gains(
    hg: &Hypergraph,
    pins: &PinCounts,
    part: &[usize],
    from: usize,
    gain: &mut [f64],
) {
    let to = other(from);
    for v in 0..hg.nvtx() {
        gain[v] = 0.0;
        if part[v] != from {
            continue;
        }
        for &e in hg.vertex_edges(v) {
            if pins.degree(e) <= 1 {
                continue;
            }
            if pins.pins(from, e) == 1 {
                gain[v] += hg.ewgt(e);
            } else if pins.pins(to, e) == 0 {
                gain[v] -= hg.ewgt(e);
            }
        }
    }
}

/// Move `v` and account for it in the part weights and pin counts.
fn move_vertex(
    hg: &Hypergraph,
    part: &mut [usize],
    pins: &mut PinCounts,
    bal: &mut Balance,
    v: usize,
    from: usize,
    to: usize,
) {
    debug_assert_eq!(part[v], from);
    let w = hg.vwgt(v);
    part[v] = to;
    inc_dec!(bal.weights[to], bal.weights[from], w);
    inc_dec!(bal.lweights[to], bal.lweights[from], w);
    pins.apply_move(hg, v, from, to);
}

/// Propagate the gain changes caused by moving `v` from `from` to `to` to the unmoved `from`
/// vertices sharing an edge with it. `pins` already reflects the move.
fn update_neighbour_gains(
    hg: &Hypergraph,
    part: &[usize],
    pins: &PinCounts,
    state: &mut RootState,
    v: usize,
    from: usize,
) {
    let to = other(from);
    let RootState {
        heaps,
        gain,
        mark,
        adj,
    } = state;

    for &e in hg.vertex_edges(v) {
        let pf = pins.pins(from, e);
        let pt = pins.pins(to, e);
        if pf + pt <= 1 {
            continue;
        }
        // first pin on the `to` side: moving any `from` pin no longer cuts the edge.
        // last pin on the `from` side: moving it uncuts the edge.
        let bump = hg.ewgt(e) * ((pt == 1) as u32 + (pf == 1) as u32) as f64;
        if bump == 0.0 {
            continue;
        }
        for &u in hg.edge_pins(e) {
            if part[u] != from || mark[u] == Mark::Moved {
                continue;
            }
            gain[u] += bump;
            if mark[u] == Mark::Unmarked {
                mark[u] = Mark::Touched;
                adj.push(u);
            }
        }
    }

    let heap = &mut heaps[from];
    for &u in adj.iter() {
        debug_assert!(heap.has(u));
        heap.change_value(u, gain[u]);
        mark[u] = Mark::Unmarked;
    }
    adj.clear();
}

/// Where the root's move sequence was best.
struct BestPoint {
    at: usize,
    cut: f64,
    limbal: f64,
    examined: usize,
}

fn fill_heap(heap: &mut GainHeap, part: &[usize], gain: &[f64], from: usize) {
    heap.clear();
    for (v, &p) in part.iter().enumerate() {
        if p == from {
            heap.input(v, gain[v]);
        }
    }
    heap.make();
}

/// The root's half of a pass: greedy moves out of `from`, then rollback to the best prefix.
///
/// `state.gain` holds the summed gains of the column group on entry.
fn root_pass(
    hg: &Hypergraph,
    part: &mut [usize],
    pins: &mut PinCounts,
    moves: &mut MoveLog,
    state: &mut RootState,
    bal: &mut Balance,
    from: usize,
    cutsize: f64,
    params: &RefineParams,
) -> BestPoint {
    let to = other(from);
    let budget = params.neg_move_budget(hg.nvtx());
    let minvw = (0..hg.nvtx())
        .map(|v| hg.vwgt(v))
        .fold(f64::INFINITY, f64::min);

    fill_heap(&mut state.heaps[from], part, &state.gain, from);
    moves.clear();

    let mut cutsize = cutsize;
    let mut best = BestPoint {
        at: 0,
        cut: cutsize,
        limbal: bal.limbal(),
        examined: 0,
    };
    let mut neg = 0;

    while neg < budget && bal.lweights[to] + minvw <= bal.lmax[to] {
        let Some(v) = state.heaps[from].extract_max() else {
            break;
        };
        state.mark[v] = Mark::Moved;
        best.examined += 1;

        let w = hg.vwgt(v);
        if bal.lweights[to] + w > bal.lmax[to] {
            ifset!(
                params.dbglvl,
                DbgLvl::MoveInfo,
                trace!(
                    "reject {v} ({from}->{to}): weight {w} over limit {:.2}",
                    bal.lmax[to] - bal.lweights[to]
                )
            );
            moves.push(Move::Rejected(v));
            continue;
        }

        let gain = state.gain[v];
        move_vertex(hg, part, pins, bal, v, from, to);
        cutsize -= gain;
        moves.push(Move::Applied(v));
        update_neighbour_gains(hg, part, pins, state, v, from);

        ifset!(
            params.dbglvl,
            DbgLvl::MoveInfo,
            trace!("move {v} ({from}->{to}): gain {gain}, cut {cutsize}")
        );

        if cutsize < best.cut {
            best.cut = cutsize;
            best.limbal = bal.limbal();
            best.at = moves.len();
            neg = 0;
        } else {
            neg += 1;
        }
    }

    // roll back past the best point
    for mv in moves.iter_range(best.at..moves.len()).rev() {
        if let Move::Applied(v) = mv {
            move_vertex(hg, part, pins, bal, v, to, from);
        }
    }
    for mv in moves.iter_range(0..moves.len()) {
        state.mark[mv.vertex()] = Mark::Unmarked;
    }
    state.heaps[from].clear();

    debug_assert!(state.mark.iter().all(|&m| m == Mark::Unmarked));
    best
}

/// Replay the applied moves of the received log prefix.
fn replay(
    hg: &Hypergraph,
    part: &mut [usize],
    pins: &mut PinCounts,
    moves: &MoveLog,
    bal: &mut Balance,
    from: usize,
) {
    let to = other(from);
    for mv in moves.iter_range(0..moves.len()) {
        if let Move::Applied(v) = mv {
            debug_assert_eq!(part[v], from);
            let w = hg.vwgt(v);
            part[v] = to;
            inc_dec!(bal.lweights[to], bal.lweights[from], w);
            pins.replay_move(hg, v, from, to);
        }
    }
}

/// Whether any process of the grid reports `failed`.
fn any_failed<C: Communicator>(comm: &GridComm<C>, failed: bool) -> bool {
    let row = comm.row.all_reduce_scalar(ReduceOp::LogicalOr, failed as u32);
    comm.col.all_reduce_scalar(ReduceOp::LogicalOr, row) != 0
}

/// Validate `part` for a shard of `nvtx` vertices.
pub(crate) fn check_part(nvtx: usize, part: &[usize]) -> RefineResult<()> {
    if part.len() != nvtx {
        return Err(RefineError::PartLength {
            expected: nvtx,
            actual: part.len(),
        });
    }
    if let Some((vtx, &label)) = part.iter().enumerate().find(|(_, &p)| p > 1) {
        return Err(RefineError::PartLabel { vtx, label });
    }
    Ok(())
}

/// Global cut: local cut contributions summed over the column group.
fn global_cut<C: Communicator>(hg: &Hypergraph, pins: &PinCounts, col: &C) -> f64 {
    col.all_reduce_scalar(ReduceOp::Sum, pins.local_cut(hg))
}

/// Refine the bisection `part` of the distributed hypergraph whose local shard is `hg`.
///
/// Collective over the whole grid: every process must call it, with the same `params` and
/// `bal_tol`. On error no process has modified its `part`, except for the memory error, which is
/// also raised before any move.
pub fn fm2_refine<C: Communicator>(
    hg: &Hypergraph,
    comm: &GridComm<C>,
    part: &mut [usize],
    params: &RefineParams,
    bal_tol: f64,
) -> RefineResult<RefineStats> {
    params.validate(bal_tol)?;
    let local = check_part(hg.nvtx(), part);
    if any_failed(comm, local.is_err()) {
        return Err(local.err().unwrap_or(RefineError::Peer));
    }

    let size = comm
        .row
        .all_reduce_scalar(ReduceOp::Max, hg.nvtx() + hg.nedge());
    if comm.col.all_reduce_scalar(ReduceOp::Max, size) == 0 {
        ifset!(params.dbglvl, DbgLvl::Info, info!("fm2: empty hypergraph"));
        return Ok(RefineStats::default());
    }

    let (root_npins, root) = find_root(hg.npins(), &comm.col);
    let is_root = comm.col.rank() == root;

    let ws = Workspace::new(hg, is_root);
    if any_failed(comm, ws.is_err()) {
        return Err(match ws {
            Err(e) => e,
            Ok(_) => RefineError::Memory {
                what: "workspace on another process",
                len: 0,
            },
        });
    }
    let mut ws = ws?;
    ifset!(
        params.dbglvl,
        DbgLvl::Memory,
        debug!(
            "fm2: {} workspace of {} bytes",
            if is_root { "root" } else { "replica" },
            ws.footprint(hg)
        )
    );
    let Workspace { pins, moves, role } = &mut ws;

    pins.initialize(hg, part);
    let mut bal = Balance::compute(hg, part, &comm.row, params, bal_tol);

    ifset!(
        params.dbglvl,
        DbgLvl::Info,
        info!(
            "fm2: grid {:?} at {:?}, {} vertices, {} edges, root {} ({} pins), weights {:?}, max {:?}",
            comm.shape(),
            comm.position(),
            hg.nvtx(),
            hg.nedge(),
            root,
            root_npins,
            bal.weights,
            bal.max
        )
    );

    let mut stats = RefineStats::default();
    let mut fails = 0;
    loop {
        let from = stats.passes % 2;

        pins.globalize(&comm.row);
        if cfg!(any(debug_assertions, feature = "extra_checks")) {
            assert!(debug::check_pin_conservation(hg, pins, &comm.row));
            assert!(debug::check_weights(bal.weights, bal.total));
        }
        let cut = global_cut(hg, pins, &comm.col);
        if stats.passes == 0 {
            stats.initial_cut = cut;
        }

        compute_partial_gains(hg, pins, part, from, role.gain_buffer());
        comm.col.reduce(ReduceOp::Sum, role.gain_buffer(), root);

        let mut pass = PassStats {
            from,
            cut,
            ..Default::default()
        };
        let best_at = match role {
            Role::Root(state) => {
                let best = root_pass(hg, part, pins, moves, state, &mut bal, from, cut, params);
                if cfg!(any(debug_assertions, feature = "extra_checks")) {
                    assert!(debug::check_lpins(hg, part, pins));
                    if comm.shape() == (1, 1) {
                        let exact = debug::compute_cut(hg, part);
                        assert!((exact - best.cut).abs() <= 1e-9 * exact.max(1.0));
                    }
                }
                pass.examined = best.examined;
                pass.best_cut = Some(best.cut);
                pass.best_limbal = Some(best.limbal);
                best.at
            }
            Role::Replica(_) => 0,
        };

        let best_at = comm.col.broadcast_scalar(best_at as i64, root) as usize;
        comm.col.broadcast(moves.prefix_mut(best_at), root);
        moves.set_len(best_at);
        if !role.is_root() {
            replay(hg, part, pins, moves, &mut bal, from);
        }
        pass.kept = moves.iter_range(0..best_at).filter(|m| m.is_applied()).count();
        stats.moves += pass.kept;
        stats.passes += 1;

        let improved = comm
            .row
            .all_reduce_scalar(ReduceOp::LogicalOr, (best_at > 0) as u32)
            != 0;
        if improved {
            fails = 0;
        } else {
            fails += 1;
        }
        bal.refresh(hg, part, &comm.row);

        ifset!(
            params.dbglvl,
            DbgLvl::Refine,
            debug!(
                "fm2 pass {} ({}->{}): cut {}, kept {} of {} examined, weights {:?}, limbal {:.4}",
                stats.passes,
                from,
                other(from),
                cut,
                pass.kept,
                pass.examined,
                bal.weights,
                bal.limbal()
            )
        );
        stats.history.push(pass);

        if fails >= SUCCESSIVE_FAILS_TO_STOP || params.pass_limit_reached(stats.passes) {
            break;
        }
    }

    pins.globalize(&comm.row);
    stats.final_cut = global_cut(hg, pins, &comm.col);
    stats.weights = bal.weights;

    ifset!(
        params.dbglvl,
        DbgLvl::Info,
        info!(
            "fm2: {} passes, {} moves, cut {} -> {}",
            stats.passes, stats.moves, stats.initial_cut, stats.final_cut
        )
    );

    Ok(stats)
}
