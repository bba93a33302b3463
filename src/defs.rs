//! constant definitions

/// Number of parts handled by the two-way refiners.
pub const NPARTS: usize = 2;

/// Default target fraction of the total vertex weight in part 0.
pub const DEFAULT_RATIO: f64 = 0.5;

/// Default allowed imbalance used by the stress harness.
pub const DEFAULT_BAL_TOL: f64 = 1.1;

/// Number of successive passes without a kept move before refinement stops. Two are needed since
/// every pass moves in one direction only.
pub const SUCCESSIVE_FAILS_TO_STOP: usize = 2;

/// Name of the strategy that leaves the partition untouched.
pub const STRATEGY_NO: &str = "no";

/// Name of the two-way FM strategy.
pub const STRATEGY_FM2: &str = "fm2";
