//! Allocator-backed double-ended queue for Strata.
//!
//! A [`Dequeue`] stores owned [`ByteBox`](strata_core::ByteBox) elements
//! in a slab of linked nodes. Both the slab and every element are
//! obtained from the [`Allocator`](strata_core::Allocator) the dequeue was
//! built with.
//!
//! ```text
//! Dequeue
//! ├── first / last : Option<u32>
//! └── Slab<Node>   (one allocator block, doubled on growth)
//!     └── Node { prev, next, payload: ByteBox }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod dequeue;
mod slab;

pub use config::DequeueConfig;
pub use dequeue::{Dequeue, Iter};
