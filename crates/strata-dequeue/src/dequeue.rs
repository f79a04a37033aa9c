//! Double-ended queue of owned byte buffers.

use std::fmt;
use std::iter::FusedIterator;

use strata_core::{Allocator, ByteBox, Result, StrataError};

use crate::config::DequeueConfig;
use crate::slab::Slab;

struct Node {
    prev: Option<u32>,
    next: Option<u32>,
    payload: ByteBox,
}

/// A doubly linked sequence of [`ByteBox`]es.
///
/// Nodes live in an allocator-backed slab and link to their neighbours by
/// slot index. Pushing copies the caller's bytes into a new box; peeking
/// borrows the stored bytes; discarding releases both box and node.
///
/// ```text
/// first ──► [n0] ◄──► [n1] ◄──► [n2] ◄── last
/// ```
///
/// Not internally synchronised. Wrap it in a `strata_sync::Shared` to use
/// it from several threads.
pub struct Dequeue {
    nodes: Slab<Node>,
    first: Option<u32>,
    last: Option<u32>,
    reserved: u32,
}

impl Dequeue {
    /// An empty dequeue that allocates through `allocator`.
    ///
    /// No allocation happens until the first push.
    pub fn new(allocator: &Allocator) -> Self {
        Self {
            nodes: Slab::new(*allocator, DequeueConfig::DEFAULT_MAX_NODES),
            first: None,
            last: None,
            reserved: DequeueConfig::DEFAULT_INITIAL_CAPACITY,
        }
    }

    /// An empty dequeue with explicit sizing limits.
    pub fn with_config(allocator: &Allocator, config: DequeueConfig) -> Result<Self> {
        config.validate()?;
        let mut nodes = Slab::new(*allocator, config.max_nodes);
        nodes.reserve(config.initial_capacity)?;
        Ok(Self {
            nodes,
            first: None,
            last: None,
            reserved: config.initial_capacity,
        })
    }

    /// Copy `bytes` into a new element at the front.
    pub fn push_first(&mut self, bytes: &[u8]) -> Result<()> {
        let payload = ByteBox::new(self.allocator(), bytes)?;
        self.push_first_box(payload)
    }

    /// Copy `bytes` into a new element at the back.
    pub fn push_last(&mut self, bytes: &[u8]) -> Result<()> {
        let payload = ByteBox::new(self.allocator(), bytes)?;
        self.push_last_box(payload)
    }

    /// Move an already built box to the front.
    ///
    /// On failure the box is dropped and the dequeue is unchanged.
    pub fn push_first_box(&mut self, payload: ByteBox) -> Result<()> {
        let index = self.nodes.insert(Node {
            prev: None,
            next: self.first,
            payload,
        })?;
        match self.first {
            Some(old) => self.link_mut(old).prev = Some(index),
            None => self.last = Some(index),
        }
        self.first = Some(index);
        Ok(())
    }

    /// Move an already built box to the back.
    ///
    /// On failure the box is dropped and the dequeue is unchanged.
    pub fn push_last_box(&mut self, payload: ByteBox) -> Result<()> {
        let index = self.nodes.insert(Node {
            prev: self.last,
            next: None,
            payload,
        })?;
        match self.last {
            Some(old) => self.link_mut(old).next = Some(index),
            None => self.first = Some(index),
        }
        self.last = Some(index);
        Ok(())
    }

    /// Detach the front element and hand its box to the caller.
    pub fn pop_first(&mut self) -> Option<ByteBox> {
        let node = self.nodes.remove(self.first?)?;
        self.first = node.next;
        match node.next {
            Some(next) => self.link_mut(next).prev = None,
            None => self.last = None,
        }
        Some(node.payload)
    }

    /// Detach the back element and hand its box to the caller.
    pub fn pop_last(&mut self) -> Option<ByteBox> {
        let node = self.nodes.remove(self.last?)?;
        self.last = node.prev;
        match node.prev {
            Some(prev) => self.link_mut(prev).next = None,
            None => self.first = None,
        }
        Some(node.payload)
    }

    /// Release the front element. No-op when empty.
    pub fn discard_first(&mut self) {
        drop(self.pop_first());
    }

    /// Release the back element. No-op when empty.
    pub fn discard_last(&mut self) {
        drop(self.pop_last());
    }

    /// Borrow the bytes of the front element.
    pub fn peek_first(&self) -> Result<&[u8]> {
        self.peek_first_box().map(ByteBox::as_slice)
    }

    /// Borrow the bytes of the back element.
    pub fn peek_last(&self) -> Result<&[u8]> {
        self.peek_last_box().map(ByteBox::as_slice)
    }

    /// Borrow the box at the front.
    pub fn peek_first_box(&self) -> Result<&ByteBox> {
        self.payload_at(self.first)
    }

    /// Borrow the box at the back.
    pub fn peek_last_box(&self) -> Result<&ByteBox> {
        self.payload_at(self.last)
    }

    /// Release every element, walking only the live nodes.
    ///
    /// Node storage grown past the configured initial capacity is handed
    /// back to the allocator.
    pub fn clear(&mut self) {
        let mut dropped = 0usize;
        let mut cursor = self.first.take();
        while let Some(index) = cursor {
            cursor = self.nodes.remove(index).and_then(|node| node.next);
            dropped += 1;
        }
        self.last = None;
        if self.nodes.capacity() != self.reserved {
            self.nodes.reset(self.reserved);
        }
        tracing::debug!(dropped, "dequeue cleared");
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.nodes.len() as usize
    }

    /// Whether the dequeue holds no elements.
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// Node slots currently reserved.
    pub fn capacity(&self) -> usize {
        self.nodes.capacity() as usize
    }

    /// The allocator nodes and boxes are obtained from.
    pub fn allocator(&self) -> &Allocator {
        self.nodes.allocator()
    }

    /// Iterate from first to last.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: &self.nodes,
            front: self.first,
            back: self.last,
            remaining: self.len(),
        }
    }

    fn payload_at(&self, index: Option<u32>) -> Result<&ByteBox> {
        index
            .and_then(|i| self.nodes.get(i))
            .map(|node| &node.payload)
            .ok_or(StrataError::Empty)
    }

    fn link_mut(&mut self, index: u32) -> &mut Node {
        match self.nodes.get_mut(index) {
            Some(node) => node,
            None => unreachable!("dequeue link points at a vacant slot"),
        }
    }
}

impl fmt::Debug for Dequeue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(ByteBox::as_slice)).finish()
    }
}

impl<'a> IntoIterator for &'a Dequeue {
    type Item = &'a ByteBox;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Borrowing iterator over a [`Dequeue`], first to last.
pub struct Iter<'a> {
    nodes: &'a Slab<Node>,
    front: Option<u32>,
    back: Option<u32>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ByteBox;

    fn next(&mut self) -> Option<&'a ByteBox> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.nodes.get(self.front?)?;
        self.front = node.next;
        self.remaining -= 1;
        Some(&node.payload)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.nodes.get(self.back?)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.payload)
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn dequeue() -> Dequeue {
        Dequeue::new(&Allocator::system())
    }

    /// Walk the links both ways and check they agree with `len`.
    fn assert_links(d: &Dequeue) {
        let forward: Vec<&[u8]> = d.iter().map(ByteBox::as_slice).collect();
        let mut backward: Vec<&[u8]> = d.iter().rev().map(ByteBox::as_slice).collect();
        backward.reverse();
        assert_eq!(forward.len(), d.len());
        assert_eq!(forward, backward);
        assert_eq!(d.is_empty(), d.first.is_none());
        assert_eq!(d.first.is_none(), d.last.is_none());
        if let Some(first) = d.first {
            assert!(d.nodes.get(first).unwrap().prev.is_none());
        }
        if let Some(last) = d.last {
            assert!(d.nodes.get(last).unwrap().next.is_none());
        }
    }

    #[test]
    fn fresh_dequeue_is_empty() {
        let d = dequeue();
        assert_eq!(d.len(), 0);
        assert!(d.is_empty());
        assert_eq!(d.capacity(), 0);
        assert_eq!(d.peek_first(), Err(StrataError::Empty));
        assert_eq!(d.peek_last(), Err(StrataError::Empty));
    }

    #[test]
    fn mixed_pushes_and_discards() {
        let mut d = dequeue();
        d.push_first(b"A").unwrap();
        d.push_last(b"B").unwrap();
        d.push_first(b"C").unwrap();
        assert_eq!(d.peek_first().unwrap(), b"C");
        assert_eq!(d.peek_last().unwrap(), b"B");
        assert_eq!(d.len(), 3);
        assert_links(&d);

        d.discard_first();
        assert_eq!(d.peek_first().unwrap(), b"A");
        d.discard_last();
        assert_eq!(d.peek_last().unwrap(), b"A");
        assert_eq!(d.len(), 1);
        d.discard_last();
        assert!(d.is_empty());
        assert_links(&d);
    }

    #[test]
    fn push_last_pop_first_is_fifo() {
        let mut d = dequeue();
        for word in ["one", "two", "three"] {
            d.push_last(word.as_bytes()).unwrap();
        }
        let out: Vec<Vec<u8>> = std::iter::from_fn(|| d.pop_first())
            .map(|b| b.as_slice().to_vec())
            .collect();
        assert_eq!(out, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn push_first_pop_first_is_lifo() {
        let mut d = dequeue();
        for byte in 1u8..=3 {
            d.push_first(&[byte]).unwrap();
        }
        assert_eq!(d.pop_first().unwrap().as_slice(), &[3]);
        assert_eq!(d.pop_first().unwrap().as_slice(), &[2]);
        assert_eq!(d.pop_first().unwrap().as_slice(), &[1]);
        assert!(d.pop_first().is_none());
    }

    #[test]
    fn discard_on_empty_is_noop() {
        let mut d = dequeue();
        d.discard_first();
        d.discard_last();
        assert!(d.is_empty());
        assert_links(&d);
    }

    #[test]
    fn empty_push_rejected_without_change() {
        let mut d = dequeue();
        d.push_last(b"keep").unwrap();
        assert!(matches!(d.push_first(&[]), Err(StrataError::InputValue { .. })));
        assert!(matches!(d.push_last(&[]), Err(StrataError::InputValue { .. })));
        assert_eq!(d.len(), 1);
        assert_eq!(d.peek_first().unwrap(), b"keep");
    }

    #[test]
    fn peek_views_stored_copy() {
        let mut d = dequeue();
        let mut src = vec![9u8; 4];
        d.push_last(&src).unwrap();
        src[0] = 0;
        assert_eq!(d.peek_last().unwrap(), &[9, 9, 9, 9]);
        let b = d.peek_last_box().unwrap();
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn clear_empties_and_allows_reuse() {
        let mut d = dequeue();
        for i in 0..10u8 {
            d.push_last(&[i]).unwrap();
        }
        assert_eq!(d.capacity(), 16);
        d.clear();
        assert!(d.is_empty());
        assert_eq!(d.capacity(), 0);
        assert_links(&d);
        d.push_first(b"again").unwrap();
        assert_eq!(d.peek_last().unwrap(), b"again");
    }

    #[test]
    fn budget_exhaustion_is_out_of_memory() {
        let config = DequeueConfig::new(2);
        let mut d = Dequeue::with_config(&Allocator::system(), config).unwrap();
        d.push_last(b"a").unwrap();
        d.push_last(b"b").unwrap();
        assert!(d.push_first(b"c").unwrap_err().is_out_of_memory());
        assert_eq!(d.len(), 2);
        assert_eq!(d.peek_first().unwrap(), b"a");
        assert_links(&d);
    }

    #[test]
    fn initial_capacity_is_reserved() {
        let config = DequeueConfig::default().with_initial_capacity(32);
        let d = Dequeue::with_config(&Allocator::system(), config).unwrap();
        assert_eq!(d.capacity(), 32);
        assert!(d.is_empty());
    }

    #[test]
    fn clear_shrinks_back_to_initial_capacity() {
        let config = DequeueConfig::default().with_initial_capacity(4);
        let mut d = Dequeue::with_config(&Allocator::system(), config).unwrap();
        for i in 0..40u8 {
            d.push_first(&[i]).unwrap();
        }
        assert_eq!(d.capacity(), 64);
        d.clear();
        assert_eq!(d.capacity(), 4);
        d.push_last(b"fits").unwrap();
        assert_eq!(d.capacity(), 4);
        assert_links(&d);
    }

    #[test]
    fn invalid_config_rejected() {
        let err = Dequeue::with_config(&Allocator::system(), DequeueConfig::new(0)).unwrap_err();
        assert!(matches!(err, StrataError::InputValue { .. }));
    }

    #[test]
    fn iter_is_double_ended_and_exact() {
        let mut d = dequeue();
        for i in 0..5u8 {
            d.push_last(&[i]).unwrap();
        }
        let mut it = d.iter();
        assert_eq!(it.len(), 5);
        assert_eq!(it.next().unwrap().as_slice(), &[0]);
        assert_eq!(it.next_back().unwrap().as_slice(), &[4]);
        assert_eq!(it.len(), 3);
        let middle: Vec<u8> = it.map(|b| b.as_slice()[0]).collect();
        assert_eq!(middle, vec![1, 2, 3]);
    }

    #[test]
    fn debug_lists_elements() {
        let mut d = dequeue();
        d.push_last(&[1]).unwrap();
        d.push_last(&[2, 3]).unwrap();
        assert_eq!(format!("{d:?}"), "[[1], [2, 3]]");
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::VecDeque;

        #[derive(Clone, Debug)]
        enum Op {
            PushFirst(Vec<u8>),
            PushLast(Vec<u8>),
            DiscardFirst,
            DiscardLast,
            Clear,
        }

        fn op() -> impl Strategy<Value = Op> {
            let bytes = proptest::collection::vec(any::<u8>(), 1..16);
            prop_oneof![
                4 => bytes.clone().prop_map(Op::PushFirst),
                4 => bytes.prop_map(Op::PushLast),
                3 => Just(Op::DiscardFirst),
                3 => Just(Op::DiscardLast),
                1 => Just(Op::Clear),
            ]
        }

        proptest! {
            #[test]
            fn matches_vecdeque_model(ops in proptest::collection::vec(op(), 0..64)) {
                let mut d = dequeue();
                let mut model: VecDeque<Vec<u8>> = VecDeque::new();
                for op in ops {
                    match op {
                        Op::PushFirst(b) => { d.push_first(&b).unwrap(); model.push_front(b); }
                        Op::PushLast(b) => { d.push_last(&b).unwrap(); model.push_back(b); }
                        Op::DiscardFirst => { d.discard_first(); model.pop_front(); }
                        Op::DiscardLast => { d.discard_last(); model.pop_back(); }
                        Op::Clear => { d.clear(); model.clear(); }
                    }
                    prop_assert_eq!(d.len(), model.len());
                    prop_assert_eq!(d.peek_first().ok(), model.front().map(Vec::as_slice));
                    prop_assert_eq!(d.peek_last().ok(), model.back().map(Vec::as_slice));
                }
                let contents: Vec<&[u8]> = d.iter().map(ByteBox::as_slice).collect();
                let expected: Vec<&[u8]> = model.iter().map(Vec::as_slice).collect();
                prop_assert_eq!(contents, expected);
                assert_links(&d);
            }
        }
    }
}
