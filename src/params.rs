//! Refinement parameters and debug levels

use crate::defs::DEFAULT_RATIO;
use crate::error::{RefineError, RefineResult};

/// Debug level flags, combined into [`RefineParams::dbglvl`]. Values follow METIS's `dbglvl`.
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DbgLvl {
    /// entry/exit summaries
    Info = 1,
    /// per-pass statistics
    Refine = 8,
    /// every examined vertex
    MoveInfo = 32,
    /// workspace sizes
    Memory = 2048,
}

/// Read-only configuration of the two-way FM refiner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefineParams {
    /// target fraction of the total vertex weight in part 0; part 1 gets the rest
    pub ratio: f64,
    /// length of a run of non-improving moves after which a pass stops; `<= 0` means the
    /// number of local vertices
    pub max_neg_moves: i64,
    /// maximum number of passes; `<= 0` means no limit
    pub pass_limit: i64,
    /// bitwise or of [`DbgLvl`] values
    pub dbglvl: u32,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_RATIO,
            max_neg_moves: 0,
            pass_limit: 0,
            dbglvl: 0,
        }
    }
}

impl RefineParams {
    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_max_neg_moves(mut self, max_neg_moves: i64) -> Self {
        self.max_neg_moves = max_neg_moves;
        self
    }

    pub fn with_pass_limit(mut self, pass_limit: i64) -> Self {
        self.pass_limit = pass_limit;
        self
    }

    pub fn with_dbglvl(mut self, dbglvl: u32) -> Self {
        self.dbglvl = dbglvl;
        self
    }

    /// Target fraction of the total weight for `part`.
    pub fn fraction(&self, part: usize) -> f64 {
        if part == 0 {
            self.ratio
        } else {
            1.0 - self.ratio
        }
    }

    /// Budget of successive non-improving moves for a shard of `nvtx` vertices.
    pub fn neg_move_budget(&self, nvtx: usize) -> usize {
        if self.max_neg_moves <= 0 {
            nvtx
        } else {
            self.max_neg_moves as usize
        }
    }

    /// Whether `passes` completed passes reach the configured limit.
    pub fn pass_limit_reached(&self, passes: usize) -> bool {
        self.pass_limit > 0 && passes as i64 >= self.pass_limit
    }

    pub fn validate(&self, bal_tol: f64) -> RefineResult<()> {
        if !(self.ratio > 0.0 && self.ratio < 1.0) {
            return Err(RefineError::Params(format!(
                "ratio must be in (0, 1), got {}",
                self.ratio
            )));
        }
        if !(bal_tol >= 1.0) || !bal_tol.is_finite() {
            return Err(RefineError::Params(format!(
                "balance tolerance must be a finite value >= 1, got {bal_tol}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = RefineParams::default();
        assert_eq!(p.ratio, 0.5);
        assert_eq!(p.neg_move_budget(42), 42);
        assert!(!p.pass_limit_reached(1000));
        assert!(p.validate(1.05).is_ok());
    }

    #[test]
    fn builders() {
        let p = RefineParams::default()
            .with_ratio(0.25)
            .with_max_neg_moves(5)
            .with_pass_limit(3)
            .with_dbglvl(DbgLvl::Refine as u32 | DbgLvl::Info as u32);
        assert_eq!(p.fraction(0), 0.25);
        assert_eq!(p.fraction(1), 0.75);
        assert_eq!(p.neg_move_budget(42), 5);
        assert!(!p.pass_limit_reached(2));
        assert!(p.pass_limit_reached(3));
        assert_eq!(p.dbglvl, 9);
    }

    #[test]
    fn validation() {
        let p = RefineParams::default();
        assert!(matches!(p.validate(0.9), Err(RefineError::Params(_))));
        assert!(matches!(p.validate(f64::NAN), Err(RefineError::Params(_))));
        assert!(matches!(
            p.with_ratio(1.0).validate(1.1),
            Err(RefineError::Params(_))
        ));
    }
}
