//! Optional mutual exclusion for Strata containers.
//!
//! Nothing in `strata-core`, `strata-dequeue` or `strata-errstack` locks
//! on its own. Callers that share a container between threads wrap it in
//! a [`Shared`] and hold the guard around every call.
//!
//! With the default `mutex` feature, [`Shared`] and [`RawLock`] are
//! backed by `parking_lot` and track the owning thread, so re-locking is
//! reported as [`SyncError::Deadlock`] rather than hanging. Built with
//! `default-features = false` they collapse to a borrow flag and a no-op
//! lock: [`Shared`] is then `!Sync`, so sharing it across threads is a
//! compile error.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod error;
pub mod raw;
pub mod shared;

pub use error::{Result, SyncError};
pub use raw::RawLock;
pub use shared::{Shared, SharedGuard};

/// Identity of the calling thread. Never zero and never reused, even
/// after the thread exits.
#[cfg(feature = "mutex")]
pub(crate) fn thread_token() -> usize {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(1);
    thread_local! {
        static TOKEN: usize = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    TOKEN.with(|t| *t)
}
