//! small helpers and macros shared by the refinement code

/// Run `$body` only if `$flag` is set in the debug level `$dbglvl`.
///
/// ```
/// # use phg::{ifset, DbgLvl};
/// let dbglvl = DbgLvl::Refine as u32;
/// let mut hits = 0;
/// ifset!(dbglvl, DbgLvl::Refine, hits += 1);
/// ifset!(dbglvl, DbgLvl::MoveInfo, hits += 1);
/// assert_eq!(hits, 1);
/// ```
#[macro_export]
macro_rules! ifset {
    ($dbglvl:expr, $flag:expr, $body:expr $(,)?) => {
        if ($dbglvl) & ($flag as u32) != 0 {
            $body;
        }
    };
}

/// `$inc += $val; $dec -= $val;`
#[macro_export]
macro_rules! inc_dec {
    ($inc:expr, $dec:expr, $val:expr) => {{
        let val = $val;
        $inc += val;
        $dec -= val;
    }};
}

/// Construct CSR offsets in place from the counts in `degs[..(degs.len()-1)]`.
///
/// The last entry is overwritten with the total.
///
/// ```
/// # use phg::util::make_csr;
/// let mut xadj = [2, 3, 1, 4, 0];
/// make_csr(&mut xadj);
/// assert_eq!(xadj, [0, 2, 5, 6, 10]);
/// ```
pub fn make_csr(degs: &mut [usize]) {
    let mut i = 0;
    for d in degs {
        let inc = *d;
        *d = i;
        i += inc;
    }
}

/// The other side of a bisection.
#[inline]
pub const fn other(side: usize) -> usize {
    1 - side
}

/// Contiguous, nearly equal block `i` out of `nparts` blocks of `0..n`. The first `n % nparts`
/// blocks get one extra item.
///
/// ```
/// # use phg::util::block_range;
/// assert_eq!(block_range(10, 3, 0), 0..4);
/// assert_eq!(block_range(10, 3, 1), 4..7);
/// assert_eq!(block_range(10, 3, 2), 7..10);
/// assert_eq!(block_range(1, 3, 2), 1..1);
/// ```
pub fn block_range(n: usize, nparts: usize, i: usize) -> std::ops::Range<usize> {
    debug_assert!(i < nparts);
    let base = n / nparts;
    let extra = n % nparts;
    let start = i * base + i.min(extra);
    let len = base + (i < extra) as usize;
    start..(start + len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_cover_range() {
        for n in 0..20 {
            for nparts in 1..6 {
                let mut next = 0;
                for i in 0..nparts {
                    let r = block_range(n, nparts, i);
                    assert_eq!(r.start, next);
                    next = r.end;
                }
                assert_eq!(next, n);
            }
        }
    }

    #[test]
    fn inc_dec_moves_weight() {
        let mut w = [3.0, 1.0];
        inc_dec!(w[1], w[0], 2.0);
        assert_eq!(w, [1.0, 3.0]);
    }
}
