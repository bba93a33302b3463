//! The per-pass move log.
//!
//! Every vertex the root examines during a pass is recorded in order, either as an applied move
//! or as a rejected attempt. The log is what gets rolled back and what is broadcast to the
//! replicas, so it travels as plain signed integers.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Move {
    Applied(usize),
    Rejected(usize),
}

impl Move {
    /// Applied `v` is `v + 1`, rejected `v` is `-(v + 1)`; zero is never produced.
    ///
    /// ```
    /// # use phg::moves::Move;
    /// assert_eq!(Move::Applied(0).encode(), 1);
    /// assert_eq!(Move::Rejected(0).encode(), -1);
    /// assert_eq!(Move::decode(-4), Move::Rejected(3));
    /// ```
    pub fn encode(self) -> i64 {
        match self {
            Move::Applied(v) => v as i64 + 1,
            Move::Rejected(v) => -(v as i64 + 1),
        }
    }

    pub fn decode(code: i64) -> Self {
        debug_assert_ne!(code, 0);
        if code > 0 {
            Move::Applied((code - 1) as usize)
        } else {
            Move::Rejected((-code - 1) as usize)
        }
    }

    pub fn vertex(self) -> usize {
        match self {
            Move::Applied(v) | Move::Rejected(v) => v,
        }
    }

    pub fn is_applied(self) -> bool {
        matches!(self, Move::Applied(_))
    }
}

/// Fixed-capacity log. Each vertex is examined at most once per pass, so `nvtx` entries suffice.
pub struct MoveLog {
    buf: Vec<i64>,
    len: usize,
}

impl MoveLog {
    pub(crate) fn from_buf(buf: Vec<i64>) -> Self {
        Self { buf, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn push(&mut self, mv: Move) {
        self.buf[self.len] = mv.encode();
        self.len += 1;
    }

    pub fn get(&self, i: usize) -> Move {
        debug_assert!(i < self.len);
        Move::decode(self.buf[i])
    }

    /// The moves in `range`, in log order.
    pub fn iter_range(&self, range: std::ops::Range<usize>) -> impl DoubleEndedIterator<Item = Move> + '_ {
        self.buf[range].iter().map(|&c| Move::decode(c))
    }

    /// The encoded first `len` entries, for broadcasting. Replicas receive into this slice and
    /// then call [`MoveLog::set_len`].
    pub fn prefix_mut(&mut self, len: usize) -> &mut [i64] {
        &mut self.buf[..len]
    }

    pub fn set_len(&mut self, len: usize) {
        assert!(len <= self.buf.len());
        self.len = len;
    }
}
