//! Lock failure taxonomy.

use thiserror::Error;

/// Errors returned by [`Shared`](crate::Shared) and [`RawLock`](crate::RawLock).
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncError {
    /// The calling thread already holds the lock.
    #[error("lock is already held by the calling thread")]
    Deadlock,
    /// Another thread holds the lock.
    #[error("lock is held by another thread")]
    Busy,
    /// The calling thread does not hold the lock it tried to release.
    #[error("lock is not held by the calling thread")]
    Permission,
}

/// Result alias for lock operations.
pub type Result<T, E = SyncError> = std::result::Result<T, E>;
