//! Allocator traffic and rollback behaviour of the dequeue.

use strata_core::StrataError;
use strata_dequeue::{Dequeue, DequeueConfig};
use strata_test_utils::{counting_allocator, fail_after, payload, reset, stats};

#[test]
fn construct_and_drop_untouched_dequeue_makes_no_calls() {
    reset();
    let d = Dequeue::new(&counting_allocator());
    drop(d);
    assert_eq!(stats().acquisitions(), 0);
    assert_eq!(stats().release_calls, 0);
}

#[test]
fn empty_push_makes_no_allocator_calls() {
    reset();
    let mut d = Dequeue::new(&counting_allocator());
    assert!(matches!(d.push_last(&[]), Err(StrataError::InputValue { .. })));
    assert_eq!(stats().acquisitions(), 0);
}

#[test]
fn every_block_is_released_on_drop() {
    reset();
    {
        let mut d = Dequeue::new(&counting_allocator());
        for i in 0..20u8 {
            d.push_last(&payload(i, 1 + i as usize)).unwrap();
        }
        for _ in 0..7 {
            d.discard_first();
        }
        assert_eq!(d.len(), 13);
    }
    let s = stats();
    assert_eq!(s.live_blocks, 0);
    assert_eq!(s.failed_calls, 0);
}

#[test]
fn failed_box_allocation_leaves_dequeue_unchanged() {
    reset();
    let mut d = Dequeue::new(&counting_allocator());
    d.push_last(b"a").unwrap();
    let live = stats().live_blocks;
    fail_after(0);
    assert!(d.push_first(b"b").unwrap_err().is_out_of_memory());
    assert_eq!(d.len(), 1);
    assert_eq!(d.peek_first().unwrap(), b"a");
    assert_eq!(stats().live_blocks, live);
}

#[test]
fn failed_slab_growth_releases_the_new_box() {
    reset();
    let mut d = Dequeue::new(&counting_allocator());
    for i in 0..4u8 {
        d.push_last(&[i]).unwrap();
    }
    assert_eq!(d.capacity(), 4);
    let live = stats().live_blocks;
    // The element box succeeds, the slab doubling that follows does not.
    fail_after(1);
    assert!(d.push_last(b"x").unwrap_err().is_out_of_memory());
    assert_eq!(stats().live_blocks, live);
    assert_eq!(d.len(), 4);
    assert_eq!(d.peek_last().unwrap(), &[3]);
    assert_eq!(d.capacity(), 4);
}

#[test]
fn failed_reservation_fails_construction() {
    reset();
    fail_after(0);
    let config = DequeueConfig::default().with_initial_capacity(8);
    let err = Dequeue::with_config(&counting_allocator(), config).unwrap_err();
    assert!(err.is_out_of_memory());
    assert_eq!(stats().live_blocks, 0);
}

#[test]
fn clear_releases_elements_and_slab() {
    reset();
    let mut d = Dequeue::new(&counting_allocator());
    for i in 0..5u8 {
        d.push_first(&[i]).unwrap();
    }
    d.clear();
    assert_eq!(d.capacity(), 0);
    assert_eq!(stats().live_blocks, 0);
    drop(d);
    assert_eq!(stats().live_blocks, 0);
}

#[test]
fn clear_after_draining_a_burst_returns_storage() {
    reset();
    let mut d = Dequeue::new(&counting_allocator());
    for i in 0..1000u32 {
        d.push_last(&i.to_le_bytes()).unwrap();
    }
    while !d.is_empty() {
        d.discard_first();
    }
    assert_eq!(d.capacity(), 1024);
    // Only the slab block is still held.
    assert_eq!(stats().live_blocks, 1);

    d.clear();
    assert_eq!(d.capacity(), 0);
    assert_eq!(stats().live_blocks, 0);

    // Clearing an empty dequeue with no storage touches nothing.
    let before = stats();
    for _ in 0..1000 {
        d.clear();
    }
    assert_eq!(stats().acquisitions(), before.acquisitions());
    assert_eq!(stats().release_calls, before.release_calls);
}

#[test]
fn clear_keeps_configured_reservation() {
    reset();
    let config = DequeueConfig::default().with_initial_capacity(4);
    let mut d = Dequeue::with_config(&counting_allocator(), config).unwrap();
    for i in 0..9u8 {
        d.push_last(&[i]).unwrap();
    }
    d.clear();
    assert_eq!(d.capacity(), 4);
    assert_eq!(stats().live_blocks, 1);
    drop(d);
    assert_eq!(stats().live_blocks, 0);
}

#[test]
fn popped_box_outlives_dequeue() {
    reset();
    let mut d = Dequeue::new(&counting_allocator());
    d.push_last(b"survivor").unwrap();
    let b = d.pop_last().unwrap();
    drop(d);
    assert_eq!(b.as_slice(), b"survivor");
    assert_eq!(stats().live_blocks, 1);
    drop(b);
    assert_eq!(stats().live_blocks, 0);
}
