//! Allocator handles over the C ABI.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Mutex;

use strata_core::Allocator;

use crate::handle::HandleTable;
use crate::status::StrataStatus;

/// `malloc`-shaped allocation function.
pub type StrataAllocateFn = unsafe extern "C" fn(size: usize) -> *mut c_void;
/// `realloc`-shaped resize function.
pub type StrataResizeFn = unsafe extern "C" fn(block: *mut c_void, size: usize) -> *mut c_void;
/// `free`-shaped release function.
pub type StrataReleaseFn = unsafe extern "C" fn(block: *mut c_void);

static ALLOCATORS: Mutex<HandleTable<Allocator>> = Mutex::new(HandleTable::new());

/// Copy the allocator behind `handle` out of the table.
///
/// Returns `None` if the handle is stale or the table is poisoned.
pub(crate) fn lookup(handle: u64) -> Option<Allocator> {
    let found = ALLOCATORS.lock().ok()?.get(handle).copied();
    if found.is_none() {
        tracing::debug!(handle, "unknown allocator handle");
    }
    found
}

/// Register three allocator functions and write the new handle to `out`.
///
/// Any null function yields `STRATA_STATUS_INPUT_VALUE`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_allocator_create(
    allocate: Option<StrataAllocateFn>,
    resize: Option<StrataResizeFn>,
    release: Option<StrataReleaseFn>,
    out: *mut u64,
) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return StrataStatus::InputValue as i32;
        }
        let allocator = match Allocator::new(allocate, resize, release) {
            Ok(a) => a,
            Err(e) => return StrataStatus::from(&e) as i32,
        };
        let handle = ffi_lock!(ALLOCATORS).insert(allocator);
        ffi_write!(out, handle);
        StrataStatus::Ok as i32
    })
}

/// Register the C runtime's `malloc`/`realloc`/`free`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_allocator_create_system(out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return StrataStatus::InputValue as i32;
        }
        let handle = ffi_lock!(ALLOCATORS).insert(Allocator::system());
        ffi_write!(out, handle);
        StrataStatus::Ok as i32
    })
}

/// Forget an allocator handle. Structures built from it keep working.
///
/// `handle` is retired; passing it again returns `STRATA_STATUS_INVALID_HANDLE`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_allocator_destroy(handle: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(ALLOCATORS).remove(handle) {
            Some(_) => StrataStatus::Ok as i32,
            None => StrataStatus::InvalidHandle as i32,
        }
    })
}

/// Allocate `size` bytes and write the block to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_allocator_allocate(handle: u64, size: usize, out: *mut *mut c_void) -> i32 {
    ffi_guard!({
        let Some(allocator) = lookup(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        if out.is_null() {
            return StrataStatus::InputValue as i32;
        }
        match allocator.allocate(size) {
            Ok(block) => {
                ffi_write!(out, block.as_ptr().cast::<c_void>());
                StrataStatus::Ok as i32
            }
            Err(e) => StrataStatus::from(&e) as i32,
        }
    })
}

/// Resize `*block` to `size` bytes in place of the caller's pointer.
///
/// On failure `*block` is unchanged and still owned by the caller.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_allocator_resize(handle: u64, size: usize, block: *mut *mut c_void) -> i32 {
    ffi_guard!({
        let Some(allocator) = lookup(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        if block.is_null() {
            return StrataStatus::InputValue as i32;
        }
        // SAFETY: `block` is non-null and readable per caller contract.
        let Some(current) = NonNull::new(unsafe { *block }.cast::<u8>()) else {
            return StrataStatus::InputValue as i32;
        };
        // SAFETY: the caller guarantees `*block` came from this allocator.
        match unsafe { allocator.resize(current, size) } {
            Ok(grown) => {
                ffi_write!(block, grown.as_ptr().cast::<c_void>());
                StrataStatus::Ok as i32
            }
            Err(e) => StrataStatus::from(&e) as i32,
        }
    })
}

/// Release `*block` and null the caller's pointer. A null `*block` is a
/// no-op, so repeated calls are harmless.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_allocator_release(handle: u64, block: *mut *mut c_void) -> i32 {
    ffi_guard!({
        let Some(allocator) = lookup(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        if block.is_null() {
            return StrataStatus::InputValue as i32;
        }
        // SAFETY: `block` is non-null and readable per caller contract.
        let mut slot = NonNull::new(unsafe { *block }.cast::<u8>());
        // SAFETY: the caller guarantees `*block` came from this allocator
        // and is not referenced elsewhere.
        unsafe { allocator.release(&mut slot) };
        ffi_write!(block, std::ptr::null_mut());
        StrataStatus::Ok as i32
    })
}
