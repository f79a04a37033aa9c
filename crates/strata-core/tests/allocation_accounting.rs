//! Allocator traffic produced by boxes, checked with the counting allocator.

use strata_core::{ByteBox, StrataError};
use strata_test_utils::{counting_allocator, fail_after, payload, reset, stats};

#[test]
fn rejected_input_never_reaches_allocator() {
    reset();
    let alloc = counting_allocator();
    assert!(matches!(
        ByteBox::new(&alloc, &[]),
        Err(StrataError::InputValue { .. })
    ));
    let mut b = ByteBox::new(&alloc, b"x").unwrap();
    assert!(b.append(&[]).is_err());
    let s = stats();
    assert_eq!(s.allocate_calls, 1);
    assert_eq!(s.resize_calls, 0);
}

#[test]
fn failed_construct_releases_nothing() {
    reset();
    let alloc = counting_allocator();
    fail_after(0);
    let err = ByteBox::new(&alloc, &payload(1, 32)).unwrap_err();
    assert_eq!(err, StrataError::oom(32));
    let s = stats();
    assert_eq!(s.failed_calls, 1);
    assert_eq!(s.release_calls, 0);
    assert_eq!(s.live_blocks, 0);
}

#[test]
fn failed_append_rolls_back() {
    reset();
    let alloc = counting_allocator();
    let mut b = ByteBox::new(&alloc, b"stable").unwrap();
    let before = b.as_ptr();
    fail_after(0);
    let err = b.append(&payload(7, 100)).unwrap_err();
    assert!(err.is_out_of_memory());
    assert_eq!(b.as_slice(), b"stable");
    assert_eq!(b.len(), 6);
    assert_eq!(b.as_ptr(), before);

    reset();
    b.append(b"!").unwrap();
    assert_eq!(b.as_slice(), b"stable!");
}

#[test]
fn drop_releases_through_owning_allocator() {
    reset();
    let alloc = counting_allocator();
    {
        let mut b = ByteBox::new(&alloc, &payload(0, 8)).unwrap();
        b.append(&payload(8, 8)).unwrap();
        b.append(&payload(16, 8)).unwrap();
        assert_eq!(b.as_slice(), payload(0, 24).as_slice());
        assert_eq!(stats().live_blocks, 1);
    }
    let s = stats();
    assert_eq!(s.allocate_calls, 1);
    assert_eq!(s.resize_calls, 2);
    assert_eq!(s.release_calls, 1);
    assert_eq!(s.live_blocks, 0);
}

#[test]
fn box_keeps_its_own_allocator_copy() {
    reset();
    let b = {
        let alloc = counting_allocator();
        ByteBox::new(&alloc, b"outlives").unwrap()
    };
    drop(b);
    assert_eq!(stats().release_calls, 1);
}
