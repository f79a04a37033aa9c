//! Error stack handles over the C ABI.
//!
//! `file` and `function` are NUL-terminated C strings that must live for
//! the rest of the process (string literals, `__FILE__`, `__func__`).
//! Only their addresses are stored; peeking hands the same pointers back.

use std::ffi::{c_char, CStr};
use std::sync::{Arc, Mutex};

use strata_errstack::{ErrorRecord, ErrorStack};

use crate::allocator;
use crate::dequeue::input_bytes;
use crate::handle::HandleTable;
use crate::status::{code, StrataStatus};

type StackArc = Arc<Mutex<ErrorStack>>;

static ERROR_STACKS: Mutex<HandleTable<StackArc>> = Mutex::new(HandleTable::new());

/// One error record as seen from C.
///
/// `file` and `function` are the pointers passed at push time.
/// `auxiliary` is null and `auxiliary_len` zero when no payload was
/// attached; otherwise they borrow the stored bytes until the record is
/// discarded.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct StrataErrorRecord {
    /// Caller-defined error code.
    pub code: i64,
    /// Source file name.
    pub file: *const c_char,
    /// Source line.
    pub line: u64,
    /// Function name.
    pub function: *const c_char,
    /// Payload bytes, or null.
    pub auxiliary: *const u8,
    /// Payload length in bytes.
    pub auxiliary_len: usize,
}

impl From<ErrorRecord<'_>> for StrataErrorRecord {
    fn from(r: ErrorRecord<'_>) -> Self {
        let (auxiliary, auxiliary_len) = match r.auxiliary() {
            Some(aux) => (aux.as_ptr(), aux.len()),
            None => (std::ptr::null(), 0),
        };
        Self {
            code: r.code(),
            file: r.file().as_ptr().cast::<c_char>(),
            line: r.line(),
            function: r.function().as_ptr().cast::<c_char>(),
            auxiliary,
            auxiliary_len,
        }
    }
}

fn get_stack(handle: u64) -> Option<StackArc> {
    let found = ERROR_STACKS.lock().ok()?.get(handle).cloned();
    if found.is_none() {
        tracing::debug!(handle, "unknown error stack handle");
    }
    found
}

/// Read a process-lifetime C string. Null or non-UTF-8 input is `None`.
#[allow(unsafe_code)]
fn static_c_str(ptr: *const c_char) -> Option<&'static str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null, NUL-terminated and alive for the whole process per
    // caller contract.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Arguments shared by both push entry points.
struct PushArgs {
    code: i64,
    file: *const c_char,
    line: u64,
    function: *const c_char,
    auxiliary: *const u8,
    auxiliary_len: usize,
}

impl PushArgs {
    fn apply(
        self,
        handle: u64,
        push: fn(&mut ErrorStack, i64, &'static str, u64, &'static str, &[u8]) -> strata_core::Result<()>,
    ) -> i32 {
        let (Some(file), Some(function)) = (static_c_str(self.file), static_c_str(self.function))
        else {
            return StrataStatus::InputValue as i32;
        };
        if self.auxiliary.is_null() && self.auxiliary_len != 0 {
            return StrataStatus::InputValue as i32;
        }
        let Some(stack) = get_stack(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        let mut stack = ffi_lock!(stack);
        let auxiliary = input_bytes(self.auxiliary, self.auxiliary_len);
        code(push(&mut *stack, self.code, file, self.line, function, auxiliary))
    }
}

/// Create an empty error stack that allocates through `allocator_handle`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_create(allocator_handle: u64, out: *mut u64) -> i32 {
    ffi_guard!({
        let Some(alloc) = allocator::lookup(allocator_handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        if out.is_null() {
            return StrataStatus::InputValue as i32;
        }
        let stack = Arc::new(Mutex::new(ErrorStack::new(&alloc)));
        let handle = ffi_lock!(ERROR_STACKS).insert(stack);
        ffi_write!(out, handle);
        StrataStatus::Ok as i32
    })
}

/// Destroy an error stack and every record in it.
///
/// `handle` is retired; passing it again returns `STRATA_STATUS_INVALID_HANDLE`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_destroy(handle: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(ERROR_STACKS).remove(handle) {
            Some(_) => StrataStatus::Ok as i32,
            None => StrataStatus::InvalidHandle as i32,
        }
    })
}

/// Record an error at the first end.
///
/// `auxiliary` may be null when `auxiliary_len` is zero.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_push_first(
    handle: u64,
    code: i64,
    file: *const c_char,
    line: u64,
    function: *const c_char,
    auxiliary: *const u8,
    auxiliary_len: usize,
) -> i32 {
    ffi_guard!({
        PushArgs {
            code,
            file,
            line,
            function,
            auxiliary,
            auxiliary_len,
        }
        .apply(handle, ErrorStack::push_first)
    })
}

/// Record an error at the last end. See [`strata_error_stack_push_first`].
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_push_last(
    handle: u64,
    code: i64,
    file: *const c_char,
    line: u64,
    function: *const c_char,
    auxiliary: *const u8,
    auxiliary_len: usize,
) -> i32 {
    ffi_guard!({
        PushArgs {
            code,
            file,
            line,
            function,
            auxiliary,
            auxiliary_len,
        }
        .apply(handle, ErrorStack::push_last)
    })
}

/// Drop the record at the first end. Succeeds on an empty stack.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_discard_first(handle: u64) -> i32 {
    ffi_guard!({
        let Some(s) = get_stack(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        ffi_lock!(s).discard_first();
        StrataStatus::Ok as i32
    })
}

/// Drop the record at the last end. Succeeds on an empty stack.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_discard_last(handle: u64) -> i32 {
    ffi_guard!({
        let Some(s) = get_stack(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        ffi_lock!(s).discard_last();
        StrataStatus::Ok as i32
    })
}

/// Copy a view of the first record into `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_peek_first(handle: u64, out: *mut StrataErrorRecord) -> i32 {
    ffi_guard!({
        let Some(s) = get_stack(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        if out.is_null() {
            return StrataStatus::InputValue as i32;
        }
        let s = ffi_lock!(s);
        match s.peek_first() {
            Ok(record) => {
                ffi_write!(out, StrataErrorRecord::from(record));
                StrataStatus::Ok as i32
            }
            Err(e) => StrataStatus::from(&e) as i32,
        }
    })
}

/// Copy a view of the last record into `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_peek_last(handle: u64, out: *mut StrataErrorRecord) -> i32 {
    ffi_guard!({
        let Some(s) = get_stack(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        if out.is_null() {
            return StrataStatus::InputValue as i32;
        }
        let s = ffi_lock!(s);
        match s.peek_last() {
            Ok(record) => {
                ffi_write!(out, StrataErrorRecord::from(record));
                StrataStatus::Ok as i32
            }
            Err(e) => StrataStatus::from(&e) as i32,
        }
    })
}

/// Drop every record.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_clear(handle: u64) -> i32 {
    ffi_guard!({
        let Some(s) = get_stack(handle) else {
            return StrataStatus::InvalidHandle as i32;
        };
        ffi_lock!(s).clear();
        StrataStatus::Ok as i32
    })
}

/// Number of records, or 0 for an invalid handle.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_len(handle: u64) -> usize {
    ffi_guard_or!(0, {
        let Some(s) = get_stack(handle) else {
            return 0;
        };
        let len = s.lock().map(|s| s.len()).unwrap_or(0);
        len
    })
}

/// 1 if the stack holds no records, 0 otherwise or for an invalid handle.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn strata_error_stack_is_empty(handle: u64) -> i32 {
    ffi_guard_or!(0, {
        let Some(s) = get_stack(handle) else {
            return 0;
        };
        let empty = s.lock().map(|s| i32::from(s.is_empty())).unwrap_or(0);
        empty
    })
}
