//! The error stack container.

use strata_core::{Allocator, ByteBox, Result};
use strata_dequeue::{Dequeue, DequeueConfig};

use crate::record::{encode, ErrorRecord};

/// A double-ended queue of [`ErrorRecord`]s.
///
/// Either end can be pushed, peeked and discarded independently. Pushing
/// and peeking at the first end gives LIFO unwinding order; pushing at the
/// last end and peeking at the first gives a FIFO error trail.
///
/// Each record costs one allocation for its body plus its share of the
/// node slab.
pub struct ErrorStack {
    records: Dequeue,
}

impl ErrorStack {
    /// An empty stack that allocates through `allocator`.
    pub fn new(allocator: &Allocator) -> Self {
        Self {
            records: Dequeue::new(allocator),
        }
    }

    /// An empty stack with explicit sizing limits.
    pub fn with_config(allocator: &Allocator, config: DequeueConfig) -> Result<Self> {
        Ok(Self {
            records: Dequeue::with_config(allocator, config)?,
        })
    }

    /// Record an error at the first end.
    ///
    /// `file` and `function` are stored by reference. An empty
    /// `auxiliary` slice attaches no payload. On failure the stack is
    /// unchanged and nothing stays allocated.
    pub fn push_first(
        &mut self,
        code: i64,
        file: &'static str,
        line: u64,
        function: &'static str,
        auxiliary: &[u8],
    ) -> Result<()> {
        let record = encode(self.allocator(), code, file, line, function, auxiliary)?;
        self.records.push_first_box(record)
    }

    /// Record an error at the last end. See [`push_first`](Self::push_first).
    pub fn push_last(
        &mut self,
        code: i64,
        file: &'static str,
        line: u64,
        function: &'static str,
        auxiliary: &[u8],
    ) -> Result<()> {
        let record = encode(self.allocator(), code, file, line, function, auxiliary)?;
        self.records.push_last_box(record)
    }

    /// View the record at the first end.
    pub fn peek_first(&self) -> Result<ErrorRecord<'_>> {
        ErrorRecord::decode(self.records.peek_first_box()?)
    }

    /// View the record at the last end.
    pub fn peek_last(&self) -> Result<ErrorRecord<'_>> {
        ErrorRecord::decode(self.records.peek_last_box()?)
    }

    /// Drop the record at the first end. No-op when empty.
    pub fn discard_first(&mut self) {
        self.records.discard_first();
    }

    /// Drop the record at the last end. No-op when empty.
    pub fn discard_last(&mut self) {
        self.records.discard_last();
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The allocator records are obtained from.
    pub fn allocator(&self) -> &Allocator {
        self.records.allocator()
    }

    /// Iterate records from first to last.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = ErrorRecord<'_>> + ExactSizeIterator {
        self.records.iter().map(decode_stored)
    }
}

fn decode_stored(record: &ByteBox) -> ErrorRecord<'_> {
    match ErrorRecord::decode(record) {
        Ok(view) => view,
        Err(_) => unreachable!("error stack holds a record it did not encode"),
    }
}

impl std::fmt::Debug for ErrorStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
