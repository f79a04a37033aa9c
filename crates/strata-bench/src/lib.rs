//! Workload profiles for benchmarking the Strata containers.
//!
//! - [`payload_profile`]: deterministic payloads of mixed sizes
//! - [`filled_dequeue`]: a dequeue preloaded with a profile
//! - [`filled_error_stack`]: an error stack preloaded with records

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_core::{Allocator, Result};
use strata_dequeue::Dequeue;
use strata_errstack::ErrorStack;

/// Smallest payload produced by [`payload_profile`].
pub const MIN_PAYLOAD: usize = 16;

/// Largest payload produced by [`payload_profile`].
pub const MAX_PAYLOAD: usize = 256;

/// Generate `count` payloads with sizes in `MIN_PAYLOAD..=MAX_PAYLOAD`.
///
/// Sizes and contents come from a 64-bit LCG seeded with `seed`, so a
/// profile is identical across runs.
pub fn payload_profile(count: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state >> 33
    };
    (0..count)
        .map(|_| {
            let span = (MAX_PAYLOAD - MIN_PAYLOAD + 1) as u64;
            let len = MIN_PAYLOAD + (next() % span) as usize;
            let fill = next() as u8;
            (0..len).map(|i| fill.wrapping_add(i as u8)).collect()
        })
        .collect()
}

/// A dequeue holding every payload, pushed at the back.
pub fn filled_dequeue(allocator: &Allocator, payloads: &[Vec<u8>]) -> Result<Dequeue> {
    let mut d = Dequeue::new(allocator);
    for p in payloads {
        d.push_last(p)?;
    }
    Ok(d)
}

/// An error stack holding one record per payload, pushed at the first end.
pub fn filled_error_stack(allocator: &Allocator, payloads: &[Vec<u8>]) -> Result<ErrorStack> {
    let mut s = ErrorStack::new(allocator);
    for (i, p) in payloads.iter().enumerate() {
        s.push_first(-(i as i64), file!(), i as u64, "filled_error_stack", p)?;
    }
    Ok(s)
}
