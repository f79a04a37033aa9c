//! Owned, growable byte buffers.
//!
//! A [`ByteBox`] owns one contiguous allocation obtained from an
//! [`Allocator`] and records its length. It is built by copying caller
//! bytes, grows only by appending, and is released through the same
//! allocator when dropped.

use std::fmt;
use std::ptr::NonNull;

use crate::allocator::Allocator;
use crate::error::{Result, StrataError};

/// An owned, non-empty byte buffer allocated through an [`Allocator`].
///
/// Growth is `realloc`-based with no spare capacity: `n` single-byte
/// appends cost O(n²) copies in total. Boxes are meant to be assembled
/// from a few large parts, not streamed into.
pub struct ByteBox {
    allocator: Allocator,
    data: NonNull<u8>,
    len: usize,
}

// SAFETY: the buffer is uniquely owned and the allocator contract requires
// its functions to be callable from any thread.
#[allow(unsafe_code)]
unsafe impl Send for ByteBox {}

// SAFETY: shared access only ever reads the buffer.
#[allow(unsafe_code)]
unsafe impl Sync for ByteBox {}

impl ByteBox {
    /// Copy `bytes` into a freshly allocated box.
    ///
    /// Empty input is rejected before the allocator is touched.
    #[allow(unsafe_code)]
    pub fn new(allocator: &Allocator, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(StrataError::input("box contents must be non-empty"));
        }
        let data = allocator.allocate(bytes.len())?;
        // SAFETY: `data` is a fresh allocation of `bytes.len()` bytes.
        unsafe { data.as_ptr().copy_from_nonoverlapping(bytes.as_ptr(), bytes.len()) };
        Ok(Self {
            allocator: *allocator,
            data,
            len: bytes.len(),
        })
    }

    /// Append a copy of `bytes` to the end of the box.
    ///
    /// If the allocator cannot grow the buffer the box is left exactly as
    /// it was before the call.
    #[allow(unsafe_code)]
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Err(StrataError::input("appended bytes must be non-empty"));
        }
        let new_len = self
            .len
            .checked_add(bytes.len())
            .ok_or(StrataError::input("appended length overflows usize"))?;
        // SAFETY: `self.data` is our live allocation from `self.allocator`.
        let data = unsafe { self.allocator.resize(self.data, new_len)? };
        // SAFETY: the grown block holds `new_len` bytes; the tail is ours.
        unsafe {
            data.as_ptr()
                .add(self.len)
                .copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
        }
        self.data = data;
        self.len = new_len;
        Ok(())
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: a box holds at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Borrow the contents. Valid until the next mutation or drop.
    #[allow(unsafe_code)]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `data` points at `len` initialised bytes owned by `self`.
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    /// Raw pointer to the first byte.
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Borrow the bytes from `index` to the end.
    ///
    /// The returned slice starts at `as_ptr() + index` and holds
    /// `len() - index` bytes. `index >= len()` is rejected.
    pub fn split_at(&self, index: usize) -> Result<&[u8]> {
        if index >= self.len {
            return Err(StrataError::input("split index is past the last byte"));
        }
        Ok(&self.as_slice()[index..])
    }

    /// The allocator this box was built with.
    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }
}

impl Drop for ByteBox {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        // SAFETY: `data` is our live allocation; nothing else references it.
        unsafe { self.allocator.release(&mut Some(self.data)) };
    }
}

impl AsRef<[u8]> for ByteBox {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq<[u8]> for ByteBox {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl fmt::Debug for ByteBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBox")
            .field("len", &self.len)
            .field("data", &self.as_slice())
            .finish()
    }
}
