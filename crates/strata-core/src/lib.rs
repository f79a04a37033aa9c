//! Allocator-injectable primitives for Strata.
//!
//! This crate holds the pieces every other Strata container builds on:
//!
//! ```text
//! Allocator (malloc/realloc/free triple, copied into each owner)
//! └── ByteBox (owned non-empty byte buffer, grows by append)
//! StrataError (InputValue | OutOfMemory | Empty)
//! ```
//!
//! No operation here installs a logging subscriber. Allocator refusals
//! are emitted as `trace`-level `tracing` events only.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod allocator;
pub mod bytebox;
pub mod error;

pub use allocator::{AllocateFn, Allocator, ReleaseFn, ResizeFn};
pub use bytebox::ByteBox;
pub use error::{Result, StrataError};
