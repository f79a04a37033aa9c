//! Dequeue configuration parameters.

use strata_core::{Result, StrataError};

/// Sizing limits for a [`Dequeue`](crate::Dequeue).
///
/// Validated when the dequeue is built; immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DequeueConfig {
    /// Node slots reserved at construction.
    ///
    /// Default: 0, so an unused dequeue never touches its allocator.
    pub initial_capacity: u32,

    /// Upper bound on live nodes. A push past it fails with
    /// `OutOfMemory` and leaves the dequeue unchanged.
    ///
    /// Default: `u32::MAX`.
    pub max_nodes: u32,
}

impl DequeueConfig {
    /// Default reserved node slots.
    pub const DEFAULT_INITIAL_CAPACITY: u32 = 0;

    /// Default node budget.
    pub const DEFAULT_MAX_NODES: u32 = u32::MAX;

    /// Config with default capacity and the given node budget.
    pub fn new(max_nodes: u32) -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            max_nodes,
        }
    }

    /// Set the number of slots reserved up front.
    pub fn with_initial_capacity(mut self, initial_capacity: u32) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Check the limits are coherent.
    pub fn validate(&self) -> Result<()> {
        if self.max_nodes == 0 {
            return Err(StrataError::input("max_nodes must be non-zero"));
        }
        if self.initial_capacity > self.max_nodes {
            return Err(StrataError::input("initial_capacity exceeds max_nodes"));
        }
        Ok(())
    }
}

impl Default for DequeueConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_NODES)
    }
}
