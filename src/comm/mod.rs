//! Collective communication over the process grid.
//!
//! The refiners only need blocking collectives scoped to one group at a time: all-reduce,
//! reduce-to-root and broadcast. A call is a rendezvous point: every member of the group must
//! issue the matching call, in the same order, before any of them returns.

pub mod local;

pub use local::{LocalComm, LocalGrid};

/// Reduction operator for [`Communicator::all_reduce`] and [`Communicator::reduce`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Max,
    Min,
    /// nonzero in any contribution gives 1, otherwise 0
    LogicalOr,
}

/// Types that can travel through a collective.
pub trait Element: Copy + Default + PartialOrd + Send + Sync + 'static {
    fn combine(op: ReduceOp, a: Self, b: Self) -> Self;
}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl Element for $t {
                #[inline]
                fn combine(op: ReduceOp, a: Self, b: Self) -> Self {
                    match op {
                        ReduceOp::Sum => a + b,
                        ReduceOp::Max => if b > a { b } else { a },
                        ReduceOp::Min => if b < a { b } else { a },
                        ReduceOp::LogicalOr => {
                            if a != <$t>::default() || b != <$t>::default() {
                                1 as $t
                            } else {
                                <$t>::default()
                            }
                        }
                    }
                }
            }
        )*
    };
}

impl_element!(i32, i64, u32, u64, usize, f32, f64);

/// One communicator group (a grid row or a grid column).
pub trait Communicator {
    /// This process's rank within the group.
    fn rank(&self) -> usize;

    /// Number of processes in the group.
    fn size(&self) -> usize;

    /// Element-wise reduction of `buf` over the group; every member receives the result in place.
    fn all_reduce<T: Element>(&self, op: ReduceOp, buf: &mut [T]);

    /// Element-wise reduction of `buf` over the group; only `root` receives the result in place.
    /// The buffers of the other members are left untouched.
    fn reduce<T: Element>(&self, op: ReduceOp, buf: &mut [T], root: usize);

    /// Copy `root`'s `buf` into every member's `buf`. All members pass buffers of equal length.
    fn broadcast<T: Element>(&self, buf: &mut [T], root: usize);

    fn all_reduce_scalar<T: Element>(&self, op: ReduceOp, val: T) -> T {
        let mut buf = [val];
        self.all_reduce(op, &mut buf);
        buf[0]
    }

    fn broadcast_scalar<T: Element>(&self, val: T, root: usize) -> T {
        let mut buf = [val];
        self.broadcast(&mut buf, root);
        buf[0]
    }
}

/// The two groups a process belongs to.
///
/// `row` spans the processes holding the same hyperedges (and different vertices); `col` spans
/// the processes holding the same vertices (and different hyperedges).
pub struct GridComm<C> {
    pub row: C,
    pub col: C,
}

impl<C: Communicator> GridComm<C> {
    pub fn new(row: C, col: C) -> Self {
        Self { row, col }
    }

    /// `(nprow, npcol)`: number of grid rows and columns.
    pub fn shape(&self) -> (usize, usize) {
        (self.col.size(), self.row.size())
    }

    /// `(row, col)` position of this process.
    pub fn position(&self) -> (usize, usize) {
        (self.col.rank(), self.row.rank())
    }

    /// Rank in the whole grid, row major.
    pub fn world_rank(&self) -> usize {
        self.col.rank() * self.row.size() + self.row.rank()
    }
}

impl GridComm<SingleProcess> {
    /// A 1x1 grid.
    pub fn single() -> Self {
        Self::new(SingleProcess, SingleProcess)
    }
}

/// Group of one; every collective is the identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce<T: Element>(&self, op: ReduceOp, buf: &mut [T]) {
        if op == ReduceOp::LogicalOr {
            for x in buf {
                *x = T::combine(op, *x, T::default());
            }
        }
    }

    fn reduce<T: Element>(&self, op: ReduceOp, buf: &mut [T], root: usize) {
        debug_assert_eq!(root, 0);
        self.all_reduce(op, buf);
    }

    fn broadcast<T: Element>(&self, _buf: &mut [T], root: usize) {
        debug_assert_eq!(root, 0);
    }
}
