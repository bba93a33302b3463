//! Refinement strategies and the status-code entry point

use std::collections::HashMap;

use crate::comm::{Communicator, GridComm};
use crate::defs::{NPARTS, STRATEGY_FM2, STRATEGY_NO};
use crate::error::{RefineError, RefineResult, Status};
use crate::fm::{check_part, fm2_refine, RefineStats};
use crate::hypergraph::Hypergraph;
use crate::params::RefineParams;

/// A way of improving a bisection in place.
///
/// Implementations are collective over the whole grid of `comm`.
pub trait Refiner<C: Communicator> {
    fn name(&self) -> &'static str;

    fn refine(
        &self,
        hg: &Hypergraph,
        comm: &GridComm<C>,
        target_parts: usize,
        part: &mut [usize],
        bal_tol: f64,
    ) -> RefineResult<RefineStats>;
}

/// Leaves the partition untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRefine;

impl<C: Communicator> Refiner<C> for NoRefine {
    fn name(&self) -> &'static str {
        STRATEGY_NO
    }

    fn refine(
        &self,
        _hg: &Hypergraph,
        _comm: &GridComm<C>,
        _target_parts: usize,
        _part: &mut [usize],
        _bal_tol: f64,
    ) -> RefineResult<RefineStats> {
        Ok(RefineStats::default())
    }
}

/// Two-way FM refinement, see [`crate::fm`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Fm2 {
    pub params: RefineParams,
}

impl<C: Communicator> Refiner<C> for Fm2 {
    fn name(&self) -> &'static str {
        STRATEGY_FM2
    }

    fn refine(
        &self,
        hg: &Hypergraph,
        comm: &GridComm<C>,
        target_parts: usize,
        part: &mut [usize],
        bal_tol: f64,
    ) -> RefineResult<RefineStats> {
        if target_parts != NPARTS {
            return Err(RefineError::PartCount(target_parts));
        }
        fm2_refine(hg, comm, part, &self.params, bal_tol)
    }
}

/// Named strategies, built once at configuration time.
pub struct Registry<C: Communicator> {
    strategies: HashMap<&'static str, Box<dyn Refiner<C>>>,
}

impl<C: Communicator> Registry<C> {
    /// A registry holding the `no` and `fm2` strategies, the latter configured with `params`.
    pub fn new(params: RefineParams) -> Self {
        let mut reg = Self {
            strategies: HashMap::new(),
        };
        reg.register(Box::new(NoRefine));
        reg.register(Box::new(Fm2 { params }));
        reg
    }

    /// Add a strategy, replacing any strategy of the same name.
    pub fn register(&mut self, strategy: Box<dyn Refiner<C>>) {
        self.strategies.insert(strategy.name(), strategy);
    }

    /// Look up a strategy by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&dyn Refiner<C>> {
        self.strategies
            .get(name.to_ascii_lowercase().as_str())
            .map(Box::as_ref)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.keys().copied()
    }
}

/// Map a configuration name to a strategy, ignoring ASCII case. Unknown names give `None`.
///
/// ```
/// # use phg::{set_refinement_strategy, RefineParams, Refiner};
/// # use phg::comm::SingleProcess;
/// let fm2 = set_refinement_strategy::<SingleProcess>("FM2", RefineParams::default()).unwrap();
/// assert_eq!(fm2.name(), "fm2");
/// assert!(set_refinement_strategy::<SingleProcess>("kway", RefineParams::default()).is_none());
/// ```
pub fn set_refinement_strategy<C: Communicator>(
    name: &str,
    params: RefineParams,
) -> Option<Box<dyn Refiner<C>>> {
    if name.eq_ignore_ascii_case(STRATEGY_NO) {
        Some(Box::new(NoRefine))
    } else if name.eq_ignore_ascii_case(STRATEGY_FM2) {
        Some(Box::new(Fm2 { params }))
    } else {
        None
    }
}

/// Refine `part` with `strategy` and report the outcome as a status code.
///
/// Collective over the whole grid of `comm`. On [`Status::Fatal`] the partition is unchanged.
pub fn refine<C: Communicator>(
    hg: &Hypergraph,
    comm: &GridComm<C>,
    target_parts: usize,
    part: &mut [usize],
    strategy: &dyn Refiner<C>,
    bal_tol: f64,
) -> Status {
    match strategy.refine(hg, comm, target_parts, part, bal_tol) {
        Ok(stats) => {
            trace!(
                "{}: {} passes, cut {} -> {}",
                strategy.name(),
                stats.passes,
                stats.initial_cut,
                stats.final_cut
            );
            Status::Ok
        }
        Err(e) => {
            error!("{} refinement failed: {e}", strategy.name());
            e.status()
        }
    }
}

/// Validate `part` without refining; what the `fm2` strategy checks before any collective.
pub fn check_partition(hg: &Hypergraph, target_parts: usize, part: &[usize]) -> RefineResult<()> {
    if target_parts != NPARTS {
        return Err(RefineError::PartCount(target_parts));
    }
    check_part(hg.nvtx(), part)
}
