//! Working memory of a refinement call.
//!
//! Everything a call needs is allocated up front into one [`Workspace`] and released when it is
//! dropped, on every exit path. What a process holds depends on its [`Role`]: only the root of a
//! column group owns heaps, gains and marks.

use crate::error::{RefineError, RefineResult};
use crate::hypergraph::Hypergraph;
use crate::moves::MoveLog;
use crate::pins::PinCounts;
use crate::pqueue::GainHeap;

/// Allocate `len` copies of `val`, reporting allocation failure instead of aborting.
pub fn try_alloc<T: Clone>(what: &'static str, len: usize, val: T) -> RefineResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| RefineError::Memory { what, len })?;
    v.resize(len, val);
    Ok(v)
}

/// An empty vector with room for `len` items.
pub fn try_with_capacity<T>(what: &'static str, len: usize) -> RefineResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| RefineError::Memory { what, len })?;
    Ok(v)
}

/// Per-vertex state during a pass on the root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mark {
    #[default]
    Unmarked,
    /// gain changed by the current move, heap update pending
    Touched,
    /// extracted from the heap this pass (applied or rejected)
    Moved,
}

/// State owned only by the root of a column group.
pub struct RootState {
    pub heaps: [GainHeap; 2],
    pub gain: Vec<f64>,
    pub mark: Vec<Mark>,
    /// vertices touched by the current move
    pub adj: Vec<usize>,
}

impl RootState {
    fn new(nvtx: usize) -> RefineResult<Self> {
        Ok(Self {
            heaps: [GainHeap::new(nvtx)?, GainHeap::new(nvtx)?],
            gain: try_alloc("gain", nvtx, 0.0)?,
            mark: try_alloc("mark", nvtx, Mark::Unmarked)?,
            adj: try_with_capacity("adj", nvtx)?,
        })
    }
}

/// State of a non-root member: scratch space for its partial gains, nothing else.
pub struct ReplicaState {
    pub lgain: Vec<f64>,
}

pub enum Role {
    Root(Box<RootState>),
    Replica(ReplicaState),
}

impl Role {
    pub fn is_root(&self) -> bool {
        matches!(self, Role::Root(_))
    }

    /// The buffer partial gains are computed into and reduced over the column group. On the
    /// root this is the gain array itself.
    pub fn gain_buffer(&mut self) -> &mut [f64] {
        match self {
            Role::Root(state) => &mut state.gain,
            Role::Replica(state) => &mut state.lgain,
        }
    }
}

pub struct Workspace {
    pub pins: PinCounts,
    pub moves: MoveLog,
    pub role: Role,
}

impl Workspace {
    /// Allocate everything a refinement call on `hg` needs. On failure, whatever was already
    /// allocated is dropped before the error is returned.
    pub fn new(hg: &Hypergraph, is_root: bool) -> RefineResult<Self> {
        let nvtx = hg.nvtx();
        let pins = PinCounts::new(hg.nedge())?;
        let moves = MoveLog::from_buf(try_alloc("moves", nvtx, 0)?);
        let role = if is_root {
            Role::Root(Box::new(RootState::new(nvtx)?))
        } else {
            Role::Replica(ReplicaState {
                lgain: try_alloc("lgain", nvtx, 0.0)?,
            })
        };
        Ok(Self { pins, moves, role })
    }

    /// Approximate number of bytes held, for the memory debug level.
    pub fn footprint(&self, hg: &Hypergraph) -> usize {
        use std::mem::size_of;
        let nvtx = hg.nvtx();
        let mut bytes = 4 * hg.nedge() * size_of::<u32>() + nvtx * size_of::<i64>();
        bytes += match &self.role {
            Role::Root(_) => nvtx * (2 * (size_of::<Option<usize>>() + 2 * size_of::<f64>())
                + size_of::<f64>()
                + size_of::<Mark>()
                + size_of::<usize>()),
            Role::Replica(_) => nvtx * size_of::<f64>(),
        };
        bytes
    }
}
