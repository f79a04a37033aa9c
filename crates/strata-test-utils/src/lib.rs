//! Test utilities for Strata development.
//!
//! Provides a [`counting_allocator`] whose functions delegate to the C
//! runtime while recording every call, and a fault switch that makes
//! allocations fail after a chosen number of successes. Counters are
//! thread-local so parallel test threads never see each other's traffic.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cell::Cell;
use std::ffi::c_void;

use strata_core::Allocator;

/// Snapshot of the calls made through [`counting_allocator`] on this thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocStats {
    pub allocate_calls: u64,
    pub resize_calls: u64,
    pub release_calls: u64,
    /// Allocate or resize calls that returned null.
    pub failed_calls: u64,
    /// Blocks handed out and not yet released.
    pub live_blocks: i64,
}

impl AllocStats {
    /// Total allocate and resize attempts, successful or not.
    pub fn acquisitions(&self) -> u64 {
        self.allocate_calls + self.resize_calls
    }
}

thread_local! {
    static STATS: Cell<AllocStats> = const { Cell::new(AllocStats {
        allocate_calls: 0,
        resize_calls: 0,
        release_calls: 0,
        failed_calls: 0,
        live_blocks: 0,
    }) };
    static BUDGET: Cell<Option<u64>> = const { Cell::new(None) };
}

fn update(f: impl FnOnce(&mut AllocStats)) {
    STATS.with(|cell| {
        let mut s = cell.get();
        f(&mut s);
        cell.set(s);
    });
}

/// Consume one unit of the fault budget. Returns `false` when the call
/// must fail.
fn admit() -> bool {
    BUDGET.with(|cell| match cell.get() {
        None => true,
        Some(0) => false,
        Some(n) => {
            cell.set(Some(n - 1));
            true
        }
    })
}

#[allow(unsafe_code)]
unsafe extern "C" fn counting_allocate(size: usize) -> *mut c_void {
    update(|s| s.allocate_calls += 1);
    if !admit() {
        update(|s| s.failed_calls += 1);
        return std::ptr::null_mut();
    }
    // SAFETY: plain forwarding to the C runtime.
    let p = unsafe { libc::malloc(size) };
    if !p.is_null() {
        update(|s| s.live_blocks += 1);
    }
    p
}

#[allow(unsafe_code)]
unsafe extern "C" fn counting_resize(ptr: *mut c_void, size: usize) -> *mut c_void {
    update(|s| s.resize_calls += 1);
    if !admit() {
        update(|s| s.failed_calls += 1);
        return std::ptr::null_mut();
    }
    // SAFETY: `ptr` came from `counting_allocate` or a previous resize.
    unsafe { libc::realloc(ptr, size) }
}

#[allow(unsafe_code)]
unsafe extern "C" fn counting_release(ptr: *mut c_void) {
    update(|s| {
        s.release_calls += 1;
        s.live_blocks -= 1;
    });
    // SAFETY: `ptr` came from `counting_allocate` or a resize.
    unsafe { libc::free(ptr) }
}

/// An allocator that records every call in this thread's [`stats`].
pub fn counting_allocator() -> Allocator {
    Allocator::new(
        Some(counting_allocate),
        Some(counting_resize),
        Some(counting_release),
    )
    .unwrap_or_else(|_| unreachable!("all three functions are present"))
}

/// Current counters for this thread.
pub fn stats() -> AllocStats {
    STATS.with(Cell::get)
}

/// Zero the counters and clear any pending fault.
pub fn reset() {
    STATS.with(|cell| cell.set(AllocStats::default()));
    clear_faults();
}

/// Let the next `n` allocate/resize calls succeed, then fail every one
/// after that until [`clear_faults`] or [`reset`].
pub fn fail_after(n: u64) {
    BUDGET.with(|cell| cell.set(Some(n)));
}

/// Stop injecting failures.
pub fn clear_faults() {
    BUDGET.with(|cell| cell.set(None));
}

/// Deterministic payload of `len` bytes tagged by `seed`.
pub fn payload(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}
