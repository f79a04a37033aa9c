//! Guard-less lock for callers that pair lock and unlock themselves.
//!
//! Used across the C boundary, where a guard cannot be held. Ownership is
//! tracked per thread so a stray unlock is refused instead of releasing a
//! lock some other thread holds.

use crate::error::{Result, SyncError};

#[cfg(feature = "mutex")]
mod imp {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::lock_api::RawMutex as _;
    use parking_lot::RawMutex;

    use super::*;
    use crate::thread_token;

    pub(super) struct Inner {
        raw: RawMutex,
        owner: AtomicUsize,
    }

    impl Inner {
        pub(super) const fn new() -> Self {
            Self {
                raw: RawMutex::INIT,
                owner: AtomicUsize::new(0),
            }
        }

        fn held_by_caller(&self) -> bool {
            self.owner.load(Ordering::Acquire) == thread_token()
        }

        pub(super) fn lock(&self) -> Result<()> {
            if self.held_by_caller() {
                return Err(SyncError::Deadlock);
            }
            self.raw.lock();
            self.owner.store(thread_token(), Ordering::Release);
            Ok(())
        }

        pub(super) fn try_lock(&self) -> Result<()> {
            if self.held_by_caller() {
                return Err(SyncError::Deadlock);
            }
            if !self.raw.try_lock() {
                return Err(SyncError::Busy);
            }
            self.owner.store(thread_token(), Ordering::Release);
            Ok(())
        }

        #[allow(unsafe_code)]
        pub(super) fn unlock(&self) -> Result<()> {
            if !self.held_by_caller() {
                return Err(SyncError::Permission);
            }
            self.owner.store(0, Ordering::Release);
            // SAFETY: the owner check above proves this thread locked it.
            unsafe { self.raw.unlock() };
            Ok(())
        }

        pub(super) fn is_locked(&self) -> bool {
            self.raw.is_locked()
        }
    }
}

#[cfg(not(feature = "mutex"))]
mod imp {
    use super::Result;

    pub(super) struct Inner;

    impl Inner {
        pub(super) const fn new() -> Self {
            Self
        }

        pub(super) fn lock(&self) -> Result<()> {
            Ok(())
        }

        pub(super) fn try_lock(&self) -> Result<()> {
            Ok(())
        }

        pub(super) fn unlock(&self) -> Result<()> {
            Ok(())
        }

        pub(super) fn is_locked(&self) -> bool {
            false
        }
    }
}

/// A lock with explicit `lock`/`unlock` calls and owner checking.
///
/// Without the `mutex` feature every call succeeds and nothing is locked.
pub struct RawLock {
    inner: imp::Inner,
}

impl RawLock {
    /// An unlocked lock.
    pub const fn new() -> Self {
        Self {
            inner: imp::Inner::new(),
        }
    }

    /// Block until the lock is acquired. Re-locking from the holding
    /// thread fails with [`SyncError::Deadlock`].
    pub fn lock(&self) -> Result<()> {
        self.inner.lock()
    }

    /// Acquire only if free; [`SyncError::Busy`] otherwise.
    pub fn try_lock(&self) -> Result<()> {
        self.inner.try_lock()
    }

    /// Release the lock. Fails with [`SyncError::Permission`] unless the
    /// calling thread holds it.
    pub fn unlock(&self) -> Result<()> {
        self.inner.unlock()
    }

    /// Whether any thread holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Fail with [`SyncError::Busy`] if the lock is held. Checked before a
    /// lock is destroyed.
    pub fn ensure_unlocked(&self) -> Result<()> {
        if self.is_locked() {
            return Err(SyncError::Busy);
        }
        Ok(())
    }
}

impl Default for RawLock {
    fn default() -> Self {
        Self::new()
    }
}
