//! C-compatible status codes.
//!
//! [`StrataStatus`] is the `repr(i32)` value every entry point returns.
//! Conversions from [`StrataError`] and [`SyncError`] are provided.

use strata_core::StrataError;
use strata_sync::SyncError;

/// C-compatible status code returned by all FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrataStatus {
    /// Success.
    Ok = 0,
    /// Handle is unknown or was already destroyed.
    InvalidHandle = -1,
    /// A null, zero-length or out-of-range argument.
    InputValue = -2,
    /// The allocator refused a request, or a node budget is exhausted.
    OutOfMemory = -3,
    /// Peek on a container with no elements.
    Empty = -4,
    /// The calling thread already holds the lock.
    Deadlock = -5,
    /// The lock is held elsewhere, or a held lock was being destroyed.
    Busy = -6,
    /// Unlock by a thread that does not hold the lock.
    Permission = -7,
    /// A container mutex was poisoned by an earlier panic.
    InternalError = -8,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&StrataError> for StrataStatus {
    fn from(e: &StrataError) -> Self {
        match e {
            StrataError::InputValue { .. } => StrataStatus::InputValue,
            StrataError::OutOfMemory { .. } => StrataStatus::OutOfMemory,
            StrataError::Empty => StrataStatus::Empty,
        }
    }
}

impl From<&SyncError> for StrataStatus {
    fn from(e: &SyncError) -> Self {
        match e {
            SyncError::Deadlock => StrataStatus::Deadlock,
            SyncError::Busy => StrataStatus::Busy,
            SyncError::Permission => StrataStatus::Permission,
        }
    }
}

/// Collapse a unit result into a raw status code.
pub(crate) fn code<E>(result: Result<(), E>) -> i32
where
    for<'a> StrataStatus: From<&'a E>,
{
    match result {
        Ok(()) => StrataStatus::Ok as i32,
        Err(e) => StrataStatus::from(&e) as i32,
    }
}
