//! status codes and error types

use thiserror::Error;

/// Status returned by [`crate::refine`]. Values follow the METIS `rstatus` codes.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// success, including a legitimate no-op
    Ok = 1,
    /// a working array could not be allocated
    MemoryError = -3,
    /// a precondition was violated; nothing was mutated
    Fatal = -4,
}

impl Status {
    /// Returns `true` if the status is [`Ok`].
    ///
    /// [`Ok`]: Status::Ok
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Errors raised by the refiners. Every variant except [`RefineError::Memory`] is detected
/// before the partition is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefineError {
    #[error("two-way refinement needs exactly 2 parts, got {0}")]
    PartCount(usize),

    #[error("partition has {actual} entries but the shard has {expected} vertices")]
    PartLength { expected: usize, actual: usize },

    #[error("vertex {vtx} is assigned to part {label}, expected 0 or 1")]
    PartLabel { vtx: usize, label: usize },

    #[error("invalid refinement parameter: {0}")]
    Params(String),

    #[error("could not allocate {what} ({len} entries)")]
    Memory { what: &'static str, len: usize },

    /// Another process of the grid failed a precondition; raised so that every process leaves
    /// the call together.
    #[error("a precondition failed on another process")]
    Peer,
}

impl RefineError {
    pub fn status(&self) -> Status {
        match self {
            RefineError::Memory { .. } => Status::MemoryError,
            RefineError::PartCount(_)
            | RefineError::PartLength { .. }
            | RefineError::PartLabel { .. }
            | RefineError::Params(_)
            | RefineError::Peer => Status::Fatal,
        }
    }
}

impl From<&RefineError> for Status {
    fn from(value: &RefineError) -> Self {
        value.status()
    }
}

impl<T> From<&RefineResult<T>> for Status {
    fn from(value: &RefineResult<T>) -> Self {
        match value {
            Ok(_) => Status::Ok,
            Err(e) => e.status(),
        }
    }
}

pub type RefineResult<T> = Result<T, RefineError>;

/// Errors from building or checking a [`crate::Hypergraph`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HypergraphError {
    #[error("hindex must start at 0, be nondecreasing and end at {npins} (problem at edge {edge})")]
    BadIndex { edge: usize, npins: usize },

    #[error("edge {edge} has pin {vtx}, but the shard has only {nvtx} vertices")]
    PinOutOfRange { edge: usize, vtx: usize, nvtx: usize },

    #[error("edge {edge} lists vertex {vtx} more than once")]
    DuplicatePin { edge: usize, vtx: usize },

    #[error("{what} has {actual} entries, expected {expected}")]
    WeightLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what}[{idx}] = {val} is not a finite nonnegative weight")]
    BadWeight { what: &'static str, idx: usize, val: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(RefineError::PartCount(3).status(), Status::Fatal);
        assert_eq!(
            RefineError::Memory { what: "pins", len: 10 }.status(),
            Status::MemoryError
        );
        let ok: RefineResult<()> = Ok(());
        assert_eq!(Status::from(&ok), Status::Ok);
        assert_eq!(Status::Ok as i32, 1);
        assert_eq!(Status::Fatal as i32, -4);
    }

    #[test]
    fn messages() {
        let e = RefineError::PartLabel { vtx: 4, label: 2 };
        assert_eq!(e.to_string(), "vertex 4 is assigned to part 2, expected 0 or 1");
    }
}
