//! Error taxonomy shared by every Strata container.
//!
//! Only two kinds of failure originate in the containers themselves: a
//! caller argument that violates a precondition, and an allocator that
//! refused a request. Peeking into an empty container is reported as its
//! own variant rather than being folded into either.

use thiserror::Error;

/// Errors returned by allocator, box, dequeue and error-stack operations.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum StrataError {
    /// A zero-length, out-of-range or otherwise invalid argument.
    #[error("invalid input: {reason}")]
    InputValue {
        /// Which precondition was violated.
        reason: &'static str,
    },
    /// The allocator returned null, or a node budget was exhausted.
    #[error("out of memory: {requested} bytes could not be obtained")]
    OutOfMemory {
        /// Size of the request that failed, in bytes.
        requested: usize,
    },
    /// A peek was attempted on a container holding no elements.
    #[error("container is empty")]
    Empty,
}

impl StrataError {
    /// Shorthand for [`StrataError::InputValue`].
    pub const fn input(reason: &'static str) -> Self {
        Self::InputValue { reason }
    }

    /// Shorthand for [`StrataError::OutOfMemory`].
    pub const fn oom(requested: usize) -> Self {
        Self::OutOfMemory { requested }
    }

    /// Whether this error came from an allocator refusal.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

/// Result alias used throughout the Strata crates.
pub type Result<T, E = StrataError> = std::result::Result<T, E>;
