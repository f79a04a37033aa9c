//! Owner-checked wrapper around a shared value.

use std::ops::{Deref, DerefMut};

use crate::error::{Result, SyncError};

#[cfg(feature = "mutex")]
mod imp {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::{Mutex, MutexGuard};

    use super::*;
    use crate::thread_token;

    pub(super) struct Inner<T> {
        owner: AtomicUsize,
        value: Mutex<T>,
    }

    pub(super) struct Guard<'a, T> {
        owner: &'a AtomicUsize,
        guard: MutexGuard<'a, T>,
    }

    impl<T> Inner<T> {
        pub(super) fn new(value: T) -> Self {
            Self {
                owner: AtomicUsize::new(0),
                value: Mutex::new(value),
            }
        }

        fn held_by_caller(&self) -> bool {
            self.owner.load(Ordering::Acquire) == thread_token()
        }

        fn claim<'a>(&'a self, guard: MutexGuard<'a, T>) -> Guard<'a, T> {
            self.owner.store(thread_token(), Ordering::Release);
            Guard {
                owner: &self.owner,
                guard,
            }
        }

        pub(super) fn lock(&self) -> Result<Guard<'_, T>> {
            if self.held_by_caller() {
                return Err(SyncError::Deadlock);
            }
            Ok(self.claim(self.value.lock()))
        }

        pub(super) fn try_lock(&self) -> Result<Guard<'_, T>> {
            if self.held_by_caller() {
                return Err(SyncError::Deadlock);
            }
            let guard = self.value.try_lock().ok_or(SyncError::Busy)?;
            Ok(self.claim(guard))
        }

        pub(super) fn get_mut(&mut self) -> &mut T {
            self.value.get_mut()
        }

        pub(super) fn into_inner(self) -> T {
            self.value.into_inner()
        }
    }

    impl<T> Deref for Guard<'_, T> {
        type Target = T;
        fn deref(&self) -> &T {
            &self.guard
        }
    }

    impl<T> DerefMut for Guard<'_, T> {
        fn deref_mut(&mut self) -> &mut T {
            &mut self.guard
        }
    }

    impl<T> Drop for Guard<'_, T> {
        fn drop(&mut self) {
            // Cleared before `guard` unlocks the mutex.
            self.owner.store(0, Ordering::Release);
        }
    }
}

#[cfg(not(feature = "mutex"))]
mod imp {
    use std::cell::{RefCell, RefMut};

    use super::*;

    pub(super) struct Inner<T> {
        value: RefCell<T>,
    }

    pub(super) struct Guard<'a, T> {
        guard: RefMut<'a, T>,
    }

    impl<T> Inner<T> {
        pub(super) fn new(value: T) -> Self {
            Self {
                value: RefCell::new(value),
            }
        }

        pub(super) fn lock(&self) -> Result<Guard<'_, T>> {
            self.value
                .try_borrow_mut()
                .map(|guard| Guard { guard })
                .map_err(|_| SyncError::Deadlock)
        }

        pub(super) fn try_lock(&self) -> Result<Guard<'_, T>> {
            self.lock()
        }

        pub(super) fn get_mut(&mut self) -> &mut T {
            self.value.get_mut()
        }

        pub(super) fn into_inner(self) -> T {
            self.value.into_inner()
        }
    }

    impl<T> Deref for Guard<'_, T> {
        type Target = T;
        fn deref(&self) -> &T {
            &self.guard
        }
    }

    impl<T> DerefMut for Guard<'_, T> {
        fn deref_mut(&mut self) -> &mut T {
            &mut self.guard
        }
    }
}

/// A value guarded by an optional, owner-checked lock.
pub struct Shared<T> {
    inner: imp::Inner<T>,
}

/// Exclusive access to the value inside a [`Shared`]. Unlocks on drop.
pub struct SharedGuard<'a, T> {
    inner: imp::Guard<'a, T>,
}

impl<T> Shared<T> {
    /// Wrap `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: imp::Inner::new(value),
        }
    }

    /// Block until the lock is acquired.
    ///
    /// Fails with [`SyncError::Deadlock`] if the caller already holds it.
    pub fn lock(&self) -> Result<SharedGuard<'_, T>> {
        self.inner.lock().map(|inner| SharedGuard { inner })
    }

    /// Acquire the lock only if it is free.
    ///
    /// Fails with [`SyncError::Busy`] if another thread holds it and
    /// [`SyncError::Deadlock`] if the caller does.
    pub fn try_lock(&self) -> Result<SharedGuard<'_, T>> {
        self.inner.try_lock().map(|inner| SharedGuard { inner })
    }

    /// Direct access through a unique borrow; no locking needed.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    /// Unwrap the value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Deref for SharedGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for SharedGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}
