//! Lock handles over the C ABI.
//!
//! Locks are owned per thread: the thread that locks must be the one that
//! unlocks. Blocking happens outside the table lock so a waiting thread
//! never stalls unrelated handle lookups. Built without the `mutex`
//! feature of `strata-sync`, every call succeeds and nothing is locked.

use std::sync::{Arc, Mutex};

use strata_sync::RawLock;

use crate::handle::HandleTable;
use crate::status::{code, StrataStatus};

static MUTEXES: Mutex<HandleTable<Arc<RawLock>>> = Mutex::new(HandleTable::new());

fn get_lock(handle: u64) -> Option<Arc<RawLock>> {
    let found = MUTEXES.lock().ok()?.get(handle).cloned();
    if found.is_none() {
        tracing::debug!(handle, "unknown mutex handle");
    }
    found
}

/// Create an unlocked mutex.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_mutex_create(out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return StrataStatus::InputValue as i32;
        }
        let handle = ffi_lock!(MUTEXES).insert(Arc::new(RawLock::new()));
        ffi_write!(out, handle);
        StrataStatus::Ok as i32
    })
}

/// Destroy a mutex. A held mutex is left alive and reported as busy.
///
/// `handle` is retired; passing it again returns `STRATA_STATUS_INVALID_HANDLE`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_mutex_destroy(handle: u64) -> i32 {
    ffi_guard!({
        let mut table = ffi_lock!(MUTEXES);
        let Some(lock) = table.get(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        if let Err(e) = lock.ensure_unlocked() {
            return StrataStatus::from(&e) as i32;
        }
        table.remove(handle);
        StrataStatus::Ok as i32
    })
}

/// Block until the mutex is acquired by the calling thread.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_mutex_lock(handle: u64) -> i32 {
    ffi_guard!({
        match get_lock(handle) {
            Some(lock) => code(lock.lock()),
            None => StrataStatus::InvalidHandle as i32,
        }
    })
}

/// Acquire the mutex only if it is free.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_mutex_try_lock(handle: u64) -> i32 {
    ffi_guard!({
        match get_lock(handle) {
            Some(lock) => code(lock.try_lock()),
            None => StrataStatus::InvalidHandle as i32,
        }
    })
}

/// Release a mutex held by the calling thread.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_mutex_unlock(handle: u64) -> i32 {
    ffi_guard!({
        match get_lock(handle) {
            Some(lock) => code(lock.unlock()),
            None => StrataStatus::InvalidHandle as i32,
        }
    })
}
