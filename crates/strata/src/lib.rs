//! Strata: allocator-injectable byte buffers, double-ended queues and
//! error stacks.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Strata sub-crates. The C ABI lives separately in `strata-ffi`.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let alloc = Allocator::system();
//!
//! let mut queue = Dequeue::new(&alloc);
//! queue.push_last(b"ABCDE").unwrap();
//! queue.push_first(b"XYZ").unwrap();
//! assert_eq!(queue.peek_first().unwrap(), b"XYZ");
//! assert_eq!(queue.len(), 2);
//!
//! let mut errors = ErrorStack::new(&alloc);
//! strata::push_first!(errors, -7, &[1, 2, 3]).unwrap();
//! assert_eq!(errors.peek_first().unwrap().code(), -7);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`memory`] | `strata-core` | `Allocator`, `ByteBox`, `StrataError` |
//! | [`dequeue`] | `strata-dequeue` | `Dequeue`, `DequeueConfig` |
//! | [`errstack`] | `strata-errstack` | `ErrorStack`, `ErrorRecord` |
//! | [`sync`] | `strata-sync` | `Shared`, `RawLock`, `SyncError` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Allocator, byte buffers and the error taxonomy (`strata-core`).
pub use strata_core as memory;

/// Double-ended queue of byte buffers (`strata-dequeue`).
pub use strata_dequeue as dequeue;

/// Error records and the error stack (`strata-errstack`).
pub use strata_errstack as errstack;

/// Optional mutual exclusion (`strata-sync`).
///
/// With the `mutex` feature disabled, [`sync::Shared`] is a `!Sync`
/// borrow flag and [`sync::RawLock`] never blocks.
pub use strata_sync as sync;

pub use strata_errstack::{function_path, push_first, push_last};

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use strata_core::{Allocator, ByteBox, StrataError};

    // Containers
    pub use strata_dequeue::{Dequeue, DequeueConfig};
    pub use strata_errstack::{ErrorRecord, ErrorStack};

    // Locking
    pub use strata_sync::{RawLock, Shared, SyncError};
}
