//! C ABI for Strata.
//!
//! Every container is exposed through an opaque `u64` handle drawn from a
//! slot+generation table, so a destroyed or forged handle is reported as
//! `STRATA_STATUS_INVALID_HANDLE` instead of being dereferenced. Entry
//! points return an `i32` [`StrataStatus`](status::StrataStatus) (queries
//! return their value directly) and never let a Rust panic unwind into C.
//!
//! `*_destroy` takes the handle by value and cannot clear the caller's
//! copy. Handles are never reissued, so any later use of a destroyed
//! handle, including a second destroy, fails with
//! `STRATA_STATUS_INVALID_HANDLE`.
//!
//! Containers copy the allocator they are created with, so destroying an
//! allocator handle does not affect structures already built from it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run `$body`, converting a panic into `STRATA_STATUS_PANICKED`.
macro_rules! ffi_guard {
    ($body:block) => {
        ffi_guard_or!($crate::status::StrataStatus::Panicked as i32, $body)
    };
}

/// Run `$body`, returning `$default` if it panics.
macro_rules! ffi_guard_or {
    ($default:expr, $body:block) => {
        match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $body)) {
            Ok(value) => value,
            Err(_) => {
                ::tracing::warn!("panic caught at the C boundary");
                $default
            }
        }
    };
}

/// Lock a table or container mutex, returning `STRATA_STATUS_INTERNAL_ERROR`
/// from the enclosing guard if a previous panic poisoned it.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::StrataStatus::InternalError as i32,
        }
    };
}

/// Write `$value` through `$out`, rejecting a null pointer.
macro_rules! ffi_write {
    ($out:expr, $value:expr) => {{
        if $out.is_null() {
            return $crate::status::StrataStatus::InputValue as i32;
        }
        // SAFETY: non-null and valid for writes per caller contract.
        unsafe { *$out = $value };
    }};
}

pub mod allocator;
pub mod dequeue;
pub mod error_stack;
pub(crate) mod handle;
pub mod mutex;
pub mod status;

pub use status::StrataStatus;
