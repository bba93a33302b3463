//! Parallel two-way FM refinement of distributed hypergraph bisections.
//!
//! A hypergraph is spread over a 2D grid of processes. Each process holds a *shard*: a slice of
//! the vertices and a slice of the hyperedges, restricted to the pins that fall into both. Two
//! groups matter to every process:
//!
//! - the **row** group holds the same hyperedges and disjoint vertex slices, so per-edge pin
//!   counts and part weights are summed over it;
//! - the **column** group holds the same vertices and disjoint hyperedge slices, so vertex gains
//!   and cut contributions are summed over it, and one member (the root) decides the moves for
//!   the whole group.
//!
//! The entry points are [`set_refinement_strategy`] and [`refine`].
#![allow(clippy::needless_range_loop, clippy::too_many_arguments)]

#[macro_use]
extern crate log;

#[macro_use]
pub mod util;

pub mod comm;
pub mod debug;
pub mod defs;
pub mod dist;
pub mod error;
pub mod fm;
pub mod graph_gen;
pub mod hypergraph;
pub mod moves;
pub mod params;
pub mod pins;
pub mod pqueue;
pub mod refine;
pub mod root;
pub mod wspace;

pub use comm::{Communicator, GridComm, ReduceOp};
pub use error::{HypergraphError, RefineError, RefineResult, Status};
pub use fm::RefineStats;
pub use hypergraph::Hypergraph;
pub use params::{DbgLvl, RefineParams};
pub use refine::{refine, set_refinement_strategy, Refiner, Registry};

#[cfg(test)]
mod tests;
