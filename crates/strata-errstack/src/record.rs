//! Error record encoding.
//!
//! A record is one [`ByteBox`]: a fixed [`RecordHeader`] followed by the
//! auxiliary bytes, if any. The header keeps `file` and `function` as an
//! address and length into `'static` string data; the text itself is
//! never copied.

use std::fmt;
use std::mem::size_of;

use strata_core::{Allocator, ByteBox, Result, StrataError};

pub use header::RecordHeader;

// `Pod`/`Zeroable` derives expand to `unsafe impl`s.
#[allow(unsafe_code)]
mod header {
    use bytemuck::{Pod, Zeroable};

    /// Fixed-layout prefix of every encoded record.
    #[repr(C)]
    #[derive(Clone, Copy, Debug, Pod, Zeroable)]
    pub struct RecordHeader {
        /// Caller-defined error code.
        pub code: i64,
        /// Source line.
        pub line: u64,
        /// Address of the `'static` file name.
        pub file_addr: usize,
        /// Length of the file name in bytes.
        pub file_len: usize,
        /// Address of the `'static` function name.
        pub function_addr: usize,
        /// Length of the function name in bytes.
        pub function_len: usize,
        /// Number of auxiliary bytes that follow the header.
        pub auxiliary_len: u64,
    }
}

/// Encoded size of [`RecordHeader`].
pub const HEADER_LEN: usize = size_of::<RecordHeader>();

/// Assemble a record box. On failure nothing stays allocated.
pub(crate) fn encode(
    allocator: &Allocator,
    code: i64,
    file: &'static str,
    line: u64,
    function: &'static str,
    auxiliary: &[u8],
) -> Result<ByteBox> {
    let header = RecordHeader {
        code,
        line,
        file_addr: file.as_ptr() as usize,
        file_len: file.len(),
        function_addr: function.as_ptr() as usize,
        function_len: function.len(),
        auxiliary_len: auxiliary.len() as u64,
    };
    let mut record = ByteBox::new(allocator, bytemuck::bytes_of(&header))?;
    if !auxiliary.is_empty() {
        record.append(auxiliary)?;
    }
    Ok(record)
}

/// Borrowed, typed view of one stored error record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorRecord<'a> {
    code: i64,
    file: &'static str,
    line: u64,
    function: &'static str,
    auxiliary: Option<&'a [u8]>,
}

impl<'a> ErrorRecord<'a> {
    /// Interpret a box produced by [`encode`].
    #[allow(unsafe_code)]
    pub(crate) fn decode(record: &'a ByteBox) -> Result<Self> {
        let head = record
            .as_slice()
            .get(..HEADER_LEN)
            .ok_or(StrataError::input("record shorter than its header"))?;
        let header: RecordHeader = bytemuck::pod_read_unaligned(head);
        let auxiliary = record.split_at(HEADER_LEN).ok();
        if auxiliary.map_or(0, <[u8]>::len) as u64 != header.auxiliary_len {
            return Err(StrataError::input("record payload length mismatch"));
        }
        // SAFETY: headers are only written by `encode`, which takes the
        // address and length of `&'static str` values. Records live in a
        // private dequeue, so the fields cannot have been forged.
        let (file, function) = unsafe {
            (
                static_str(header.file_addr, header.file_len),
                static_str(header.function_addr, header.function_len),
            )
        };
        Ok(Self {
            code: header.code,
            file,
            line: header.line,
            function,
            auxiliary,
        })
    }

    /// Caller-defined error code.
    pub fn code(&self) -> i64 {
        self.code
    }

    /// Source file the record was pushed from.
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// Source line the record was pushed from.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Function the record was pushed from.
    pub fn function(&self) -> &'static str {
        self.function
    }

    /// Attached payload, or `None` if the record was pushed without one.
    pub fn auxiliary(&self) -> Option<&'a [u8]> {
        self.auxiliary
    }
}

impl fmt::Display for ErrorRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} in {}: code {}",
            self.file, self.line, self.function, self.code
        )?;
        if let Some(aux) = self.auxiliary {
            write!(f, " (+{} bytes)", aux.len())?;
        }
        Ok(())
    }
}

/// # Safety
///
/// `addr..addr + len` must be the bytes of a `&'static str`.
#[allow(unsafe_code)]
unsafe fn static_str(addr: usize, len: usize) -> &'static str {
    // SAFETY: forwarded to the caller.
    unsafe { std::str::from_utf8_unchecked(std::slice::from_raw_parts(addr as *const u8, len)) }
}
