//! Dequeue handles over the C ABI.
//!
//! Each dequeue sits behind its own `Arc<Mutex<_>>`, so the global table
//! lock is held only for the handle lookup. Peeked pointers stay valid
//! until the element is discarded or the dequeue is cleared or destroyed.

use std::sync::{Arc, Mutex};

use strata_dequeue::Dequeue;

use crate::allocator;
use crate::handle::HandleTable;
use crate::status::{code, StrataStatus};

type DequeueArc = Arc<Mutex<Dequeue>>;

static DEQUEUES: Mutex<HandleTable<DequeueArc>> = Mutex::new(HandleTable::new());

fn get_dequeue(handle: u64) -> Option<DequeueArc> {
    let found = DEQUEUES.lock().ok()?.get(handle).cloned();
    if found.is_none() {
        tracing::debug!(handle, "unknown dequeue handle");
    }
    found
}

/// Borrow `len` bytes at `data` as a slice. Null or empty input yields an
/// empty slice, which the containers reject as `InputValue`.
#[allow(unsafe_code)]
pub(crate) fn input_bytes<'a>(data: *const u8, len: usize) -> &'a [u8] {
    if data.is_null() || len == 0 {
        return &[];
    }
    // SAFETY: `data` is non-null and points at `len` readable bytes per
    // caller contract.
    unsafe { std::slice::from_raw_parts(data, len) }
}

/// Create an empty dequeue that allocates through `allocator_handle`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_create(allocator_handle: u64, out: *mut u64) -> i32 {
    ffi_guard!({
        let Some(alloc) = allocator::lookup(allocator_handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        if out.is_null() {
            return StrataStatus::InputValue as i32;
        }
        let handle = ffi_lock!(DEQUEUES).insert(Arc::new(Mutex::new(Dequeue::new(&alloc))));
        ffi_write!(out, handle);
        StrataStatus::Ok as i32
    })
}

/// Destroy a dequeue and every element in it.
///
/// `handle` is retired; passing it again returns `STRATA_STATUS_INVALID_HANDLE`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_destroy(handle: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(DEQUEUES).remove(handle) {
            Some(_) => StrataStatus::Ok as i32,
            None => StrataStatus::InvalidHandle as i32,
        }
    })
}

/// Copy `len` bytes from `data` into a new front element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_push_first(handle: u64, data: *const u8, len: usize) -> i32 {
    ffi_guard!({
        let Some(d) = get_dequeue(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        let mut d = ffi_lock!(d);
        code(d.push_first(input_bytes(data, len)))
    })
}

/// Copy `len` bytes from `data` into a new back element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_push_last(handle: u64, data: *const u8, len: usize) -> i32 {
    ffi_guard!({
        let Some(d) = get_dequeue(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        let mut d = ffi_lock!(d);
        code(d.push_last(input_bytes(data, len)))
    })
}

/// Release the front element. Succeeds on an empty dequeue.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_discard_first(handle: u64) -> i32 {
    ffi_guard!({
        let Some(d) = get_dequeue(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        ffi_lock!(d).discard_first();
        StrataStatus::Ok as i32
    })
}

/// Release the back element. Succeeds on an empty dequeue.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_discard_last(handle: u64) -> i32 {
    ffi_guard!({
        let Some(d) = get_dequeue(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        ffi_lock!(d).discard_last();
        StrataStatus::Ok as i32
    })
}

/// Borrow the front element: its length goes to `len_out` and a pointer
/// to its bytes to `data_out`. `STRATA_STATUS_EMPTY` if there is none.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_peek_first(
    handle: u64,
    len_out: *mut usize,
    data_out: *mut *const u8,
) -> i32 {
    ffi_guard!({
        let Some(d) = get_dequeue(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        if len_out.is_null() || data_out.is_null() {
            return StrataStatus::InputValue as i32;
        }
        let d = ffi_lock!(d);
        match d.peek_first() {
            Ok(bytes) => {
                ffi_write!(len_out, bytes.len());
                ffi_write!(data_out, bytes.as_ptr());
                StrataStatus::Ok as i32
            }
            Err(e) => StrataStatus::from(&e) as i32,
        }
    })
}

/// Borrow the back element. See [`strata_dequeue_peek_first`].
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_peek_last(
    handle: u64,
    len_out: *mut usize,
    data_out: *mut *const u8,
) -> i32 {
    ffi_guard!({
        let Some(d) = get_dequeue(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        if len_out.is_null() || data_out.is_null() {
            return StrataStatus::InputValue as i32;
        }
        let d = ffi_lock!(d);
        match d.peek_last() {
            Ok(bytes) => {
                ffi_write!(len_out, bytes.len());
                ffi_write!(data_out, bytes.as_ptr());
                StrataStatus::Ok as i32
            }
            Err(e) => StrataStatus::from(&e) as i32,
        }
    })
}

/// Release every element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_clear(handle: u64) -> i32 {
    ffi_guard!({
        let Some(d) = get_dequeue(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        ffi_lock!(d).clear();
        StrataStatus::Ok as i32
    })
}

/// Number of elements, or 0 for an invalid handle.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_len(handle: u64) -> usize {
    ffi_guard_or!(0, {
        let Some(d) = get_dequeue(handle) else {
            return 0;
        };
        let len = d.lock().map(|d| d.len()).unwrap_or(0);
        len
    })
}

/// 1 if the dequeue holds no elements, 0 otherwise or for an invalid
/// handle.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_dequeue_is_empty(handle: u64) -> i32 {
    ffi_guard_or!(0, {
        let Some(d) = get_dequeue(handle) else {
            return 0;
        };
        let empty = d.lock().map(|d| i32::from(d.is_empty())).unwrap_or(0);
        empty
    })
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::allocator::{strata_allocator_create_system, strata_allocator_destroy};

    fn peek(
        f: extern "C" fn(u64, *mut usize, *mut *const u8) -> i32,
        h: u64,
    ) -> Result<Vec<u8>, i32> {
        let mut len = 0usize;
        let mut data: *const u8 = std::ptr::null();
        match f(h, &mut len, &mut data) {
            0 => Ok(unsafe { std::slice::from_raw_parts(data, len) }.to_vec()),
            status => Err(status),
        }
    }

    fn create() -> u64 {
        let mut a = 0;
        assert_eq!(strata_allocator_create_system(&mut a), 0);
        let mut h = 0;
        assert_eq!(strata_dequeue_create(a, &mut h), 0);
        // The dequeue keeps its own copy of the allocator.
        assert_eq!(strata_allocator_destroy(a), 0);
        h
    }

    #[test]
    fn five_step_scenario() {
        let h = create();
        assert_eq!(strata_dequeue_is_empty(h), 1);

        assert_eq!(strata_dequeue_push_last(h, b"ABCDE".as_ptr(), 5), 0);
        assert_eq!(strata_dequeue_len(h), 1);
        assert_eq!(peek(strata_dequeue_peek_last, h), Ok(b"ABCDE".to_vec()));

        assert_eq!(strata_dequeue_push_first(h, b"XYZ".as_ptr(), 3), 0);
        assert_eq!(strata_dequeue_len(h), 2);
        assert_eq!(peek(strata_dequeue_peek_first, h), Ok(b"XYZ".to_vec()));
        assert_eq!(peek(strata_dequeue_peek_last, h), Ok(b"ABCDE".to_vec()));

        assert_eq!(strata_dequeue_discard_first(h), 0);
        assert_eq!(strata_dequeue_len(h), 1);
        assert_eq!(peek(strata_dequeue_peek_first, h), Ok(b"ABCDE".to_vec()));

        assert_eq!(strata_dequeue_discard_last(h), 0);
        assert_eq!(strata_dequeue_len(h), 0);
        assert_eq!(strata_dequeue_is_empty(h), 1);
        assert_eq!(strata_dequeue_destroy(h), 0);
    }

    #[test]
    fn null_or_empty_push_rejected() {
        let h = create();
        assert_eq!(
            strata_dequeue_push_last(h, std::ptr::null(), 4),
            StrataStatus::InputValue as i32
        );
        assert_eq!(
            strata_dequeue_push_first(h, b"x".as_ptr(), 0),
            StrataStatus::InputValue as i32
        );
        assert_eq!(strata_dequeue_len(h), 0);
        strata_dequeue_destroy(h);
    }

    #[test]
    fn peek_on_empty_reports_empty() {
        let h = create();
        assert_eq!(
            peek(strata_dequeue_peek_first, h),
            Err(StrataStatus::Empty as i32)
        );
        assert_eq!(strata_dequeue_discard_last(h), 0);
        strata_dequeue_destroy(h);
    }

    #[test]
    fn clear_then_reuse() {
        let h = create();
        for i in 0..8u8 {
            strata_dequeue_push_last(h, [i].as_ptr(), 1);
        }
        assert_eq!(strata_dequeue_clear(h), 0);
        assert_eq!(strata_dequeue_is_empty(h), 1);
        assert_eq!(strata_dequeue_push_first(h, b"z".as_ptr(), 1), 0);
        assert_eq!(strata_dequeue_len(h), 1);
        strata_dequeue_destroy(h);
    }

    #[test]
    fn stale_handle_everywhere() {
        let h = create();
        assert_eq!(strata_dequeue_destroy(h), 0);
        let invalid = StrataStatus::InvalidHandle as i32;
        assert_eq!(strata_dequeue_destroy(h), invalid);
        assert_eq!(strata_dequeue_push_last(h, b"a".as_ptr(), 1), invalid);
        assert_eq!(strata_dequeue_discard_first(h), invalid);
        assert_eq!(strata_dequeue_clear(h), invalid);
        assert_eq!(peek(strata_dequeue_peek_last, h), Err(invalid));
        assert_eq!(strata_dequeue_len(h), 0);
        assert_eq!(strata_dequeue_is_empty(h), 0);
    }

    #[test]
    fn create_with_unknown_allocator_fails() {
        let mut h = 0;
        assert_eq!(
            strata_dequeue_create(u64::MAX, &mut h),
            StrataStatus::InvalidHandle as i32
        );
    }
}
