//! Injectable allocation functions.
//!
//! An [`Allocator`] bundles three C-compatible function pointers that
//! behave like `malloc`, `realloc` and `free`. Every owning structure in
//! the workspace stores the allocator it was built with and routes all
//! allocation, growth and release through it.

use std::ffi::c_void;
use std::ptr::NonNull;

use crate::error::{Result, StrataError};

/// `malloc`-shaped allocation function: returns null on failure.
pub type AllocateFn = unsafe extern "C" fn(size: usize) -> *mut c_void;

/// `realloc`-shaped resize function: returns null on failure and leaves
/// the original block valid.
pub type ResizeFn = unsafe extern "C" fn(ptr: *mut c_void, size: usize) -> *mut c_void;

/// `free`-shaped release function.
pub type ReleaseFn = unsafe extern "C" fn(ptr: *mut c_void);

/// Handle over caller-supplied allocate/resize/release functions.
///
/// The handle is a plain value; copies are interchangeable and refer to
/// the same underlying functions. Structures keep their own copy, so a
/// buffer is always released through the allocator that produced it.
///
/// # Contract
///
/// The functions must behave like their C standard library counterparts:
/// return storage aligned for any fundamental type, return null on
/// failure, preserve the original block when a resize fails, and be
/// callable from any thread.
#[derive(Clone, Copy, Debug)]
pub struct Allocator {
    allocate: AllocateFn,
    resize: ResizeFn,
    release: ReleaseFn,
}

impl Allocator {
    /// Build an allocator from three possibly-null function pointers.
    ///
    /// `None` corresponds to a null pointer on the C side and is rejected
    /// with [`StrataError::InputValue`].
    pub fn new(
        allocate: Option<AllocateFn>,
        resize: Option<ResizeFn>,
        release: Option<ReleaseFn>,
    ) -> Result<Self> {
        let allocate = allocate.ok_or(StrataError::input("allocate function is null"))?;
        let resize = resize.ok_or(StrataError::input("resize function is null"))?;
        let release = release.ok_or(StrataError::input("release function is null"))?;
        Ok(Self {
            allocate,
            resize,
            release,
        })
    }

    /// Allocator backed by the C runtime's `malloc`, `realloc` and `free`.
    pub fn system() -> Self {
        Self {
            allocate: libc::malloc,
            resize: libc::realloc,
            release: libc::free,
        }
    }

    /// Allocate `size` bytes of uninitialised storage.
    ///
    /// Fails with `InputValue` when `size` is zero (no call is made) and
    /// with `OutOfMemory` when the allocate function returns null.
    #[allow(unsafe_code)]
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        if size == 0 {
            return Err(StrataError::input("allocation size must be non-zero"));
        }
        // SAFETY: the allocate function is malloc-shaped per the type contract.
        let raw = unsafe { (self.allocate)(size) };
        NonNull::new(raw.cast::<u8>()).ok_or_else(|| {
            tracing::trace!(size, "allocate refused");
            StrataError::oom(size)
        })
    }

    /// Resize a block previously returned by this allocator.
    ///
    /// On failure the original block is untouched and still owned by the
    /// caller; on success the old pointer must no longer be used.
    ///
    /// # Safety
    ///
    /// `block` must be a live allocation obtained from this allocator.
    #[allow(unsafe_code)]
    pub unsafe fn resize(&self, block: NonNull<u8>, size: usize) -> Result<NonNull<u8>> {
        if size == 0 {
            return Err(StrataError::input("resize size must be non-zero"));
        }
        // SAFETY: caller guarantees `block` is live and ours.
        let raw = unsafe { (self.resize)(block.as_ptr().cast::<c_void>(), size) };
        NonNull::new(raw.cast::<u8>()).ok_or_else(|| {
            tracing::trace!(size, "resize refused");
            StrataError::oom(size)
        })
    }

    /// Release the block held in `slot` and reset the slot to `None`.
    ///
    /// An empty slot is a no-op, so repeated calls are harmless.
    ///
    /// # Safety
    ///
    /// A `Some` slot must hold a live allocation obtained from this
    /// allocator that is not referenced anywhere else.
    #[allow(unsafe_code)]
    pub unsafe fn release(&self, slot: &mut Option<NonNull<u8>>) {
        if let Some(block) = slot.take() {
            // SAFETY: caller guarantees the block is live and uniquely ours.
            unsafe { (self.release)(block.as_ptr().cast::<c_void>()) };
        }
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::system()
    }
}
