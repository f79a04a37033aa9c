//! Error stacks for Strata.
//!
//! An [`ErrorStack`] collects `(code, file, line, function, payload)`
//! records in a [`Dequeue`](strata_dequeue::Dequeue). It only stores
//! them; rendering or logging the records is left to the caller.
//!
//! ```
//! use strata_core::Allocator;
//! use strata_errstack::ErrorStack;
//!
//! let mut errors = ErrorStack::new(&Allocator::system());
//! errors.push_first(-7, "a.c", 42, "f", &[1, 2, 3]).unwrap();
//! let record = errors.peek_first().unwrap();
//! assert_eq!(record.to_string(), "a.c:42 in f: code -7 (+3 bytes)");
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

mod macros;
pub mod record;
pub mod stack;

pub use record::{ErrorRecord, RecordHeader, HEADER_LEN};
pub use stack::ErrorStack;
