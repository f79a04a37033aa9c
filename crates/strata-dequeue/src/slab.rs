//! Allocator-backed slot storage with an intrusive free list.
//!
//! Values live in one contiguous block of `Slot`s obtained from the
//! owning [`Allocator`]. Every slot below `capacity` is initialised:
//! either occupied, or vacant and linked into the free list. Growth
//! doubles the slot count (minimum `MIN_GROWTH`) by allocating a new
//! block, moving the slots across and releasing the old one, so a failed
//! growth leaves the existing block untouched.

use std::mem::{align_of, size_of};
use std::ptr::NonNull;

use strata_core::{Allocator, Result, StrataError};

/// Smallest slot count reserved by the first growth.
pub(crate) const MIN_GROWTH: u32 = 4;

enum Slot<T> {
    Occupied(T),
    Vacant { next_free: Option<u32> },
}

pub(crate) struct Slab<T> {
    allocator: Allocator,
    storage: Option<NonNull<Slot<T>>>,
    capacity: u32,
    occupied: u32,
    free_head: Option<u32>,
    max_slots: u32,
}

// SAFETY: the slab uniquely owns its block and every `T` in it; allocator
// functions are callable from any thread.
#[allow(unsafe_code)]
unsafe impl<T: Send> Send for Slab<T> {}

// SAFETY: `&Slab` only hands out `&T`.
#[allow(unsafe_code)]
unsafe impl<T: Sync> Sync for Slab<T> {}

impl<T> Slab<T> {
    pub(crate) fn new(allocator: Allocator, max_slots: u32) -> Self {
        Self {
            allocator,
            storage: None,
            capacity: 0,
            occupied: 0,
            free_head: None,
            max_slots,
        }
    }

    pub(crate) fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub(crate) fn len(&self) -> u32 {
        self.occupied
    }

    pub(crate) fn capacity(&self) -> u32 {
        self.capacity
    }

    #[allow(unsafe_code)]
    fn slots(&self) -> &[Slot<T>] {
        match self.storage {
            // SAFETY: slots `0..capacity` are initialised and owned by us.
            Some(p) => unsafe { std::slice::from_raw_parts(p.as_ptr(), self.capacity as usize) },
            None => &[],
        }
    }

    #[allow(unsafe_code)]
    fn slots_mut(&mut self) -> &mut [Slot<T>] {
        match self.storage {
            // SAFETY: as `slots`, and `&mut self` guarantees exclusivity.
            Some(p) => unsafe {
                std::slice::from_raw_parts_mut(p.as_ptr(), self.capacity as usize)
            },
            None => &mut [],
        }
    }

    /// Grow to exactly `target` slots. No-op if already that large.
    #[allow(unsafe_code)]
    pub(crate) fn reserve(&mut self, target: u32) -> Result<()> {
        if target <= self.capacity {
            return Ok(());
        }
        if target > self.max_slots {
            return Err(StrataError::input("reservation exceeds the node budget"));
        }
        let bytes = (target as usize)
            .checked_mul(size_of::<Slot<T>>())
            .ok_or(StrataError::oom(usize::MAX))?;
        let block = self.allocator.allocate(bytes)?.cast::<Slot<T>>();
        if block.as_ptr() as usize % align_of::<Slot<T>>() != 0 {
            // SAFETY: fresh block from our allocator, not yet shared.
            unsafe { self.allocator.release(&mut Some(block.cast())) };
            return Err(StrataError::input("allocator returned misaligned storage"));
        }

        if let Some(old) = self.storage {
            // SAFETY: `old` holds `capacity` initialised slots and `block`
            // has room for at least that many; the regions are distinct.
            // The slots are moved bitwise, so `old` must not drop them.
            unsafe {
                block
                    .as_ptr()
                    .copy_from_nonoverlapping(old.as_ptr(), self.capacity as usize);
                self.allocator.release(&mut Some(old.cast()));
            }
        }

        for index in (self.capacity..target).rev() {
            // SAFETY: `index < target`, inside the new block and not yet
            // initialised.
            unsafe {
                block.as_ptr().add(index as usize).write(Slot::Vacant {
                    next_free: self.free_head,
                });
            }
            self.free_head = Some(index);
        }

        tracing::trace!(from = self.capacity, to = target, bytes, "slab grown");
        self.storage = Some(block);
        self.capacity = target;
        Ok(())
    }

    /// Store `value`, growing if no slot is vacant. On failure `value` is
    /// dropped and the slab is unchanged.
    pub(crate) fn insert(&mut self, value: T) -> Result<u32> {
        if self.free_head.is_none() {
            if self.capacity >= self.max_slots {
                return Err(StrataError::oom(size_of::<Slot<T>>()));
            }
            let target = self
                .capacity
                .saturating_mul(2)
                .max(MIN_GROWTH)
                .min(self.max_slots);
            self.reserve(target)?;
        }
        let index = self.free_head.ok_or(StrataError::oom(size_of::<Slot<T>>()))?;
        let slot = &mut self.slots_mut()[index as usize];
        let Slot::Vacant { next_free } = std::mem::replace(slot, Slot::Occupied(value)) else {
            unreachable!("free list points at an occupied slot");
        };
        self.free_head = next_free;
        self.occupied += 1;
        Ok(index)
    }

    pub(crate) fn get(&self, index: u32) -> Option<&T> {
        match self.slots().get(index as usize)? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub(crate) fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        match self.slots_mut().get_mut(index as usize)? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Take the value out of `index`, returning the slot to the free list.
    pub(crate) fn remove(&mut self, index: u32) -> Option<T> {
        let next_free = self.free_head;
        let slot = self.slots_mut().get_mut(index as usize)?;
        if !matches!(slot, Slot::Occupied(_)) {
            return None;
        }
        let Slot::Occupied(value) = std::mem::replace(slot, Slot::Vacant { next_free }) else {
            return None;
        };
        self.free_head = Some(index);
        self.occupied -= 1;
        Some(value)
    }

    /// Release the block and reserve a fresh one of `target` slots.
    ///
    /// Only valid once every value has been removed. A refused
    /// reservation leaves the slab with no storage, which is still a valid
    /// empty slab.
    #[allow(unsafe_code)]
    pub(crate) fn reset(&mut self, target: u32) {
        debug_assert_eq!(self.occupied, 0, "reset with live values");
        if let Some(block) = self.storage.take() {
            // SAFETY: no slot is occupied and vacant slots own nothing, so
            // the block can be released without dropping anything.
            unsafe { self.allocator.release(&mut Some(block.cast())) };
        }
        let released = self.capacity;
        self.capacity = 0;
        self.free_head = None;
        if let Err(error) = self.reserve(target) {
            tracing::trace!(slots = target, %error, "slab reservation after reset refused");
        }
        tracing::trace!(from = released, to = self.capacity, "slab reset");
    }
}

impl<T> Drop for Slab<T> {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        if let Some(block) = self.storage.take() {
            // SAFETY: `block` holds `capacity` initialised slots we own; after
            // dropping them in place the block is released exactly once.
            unsafe {
                std::ptr::drop_in_place(std::ptr::slice_from_raw_parts_mut(
                    block.as_ptr(),
                    self.capacity as usize,
                ));
                self.allocator.release(&mut Some(block.cast()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slab<T>(max: u32) -> Slab<T> {
        Slab::new(Allocator::system(), max)
    }

    #[test]
    fn empty_slab_owns_no_storage() {
        let s: Slab<u64> = slab(u32::MAX);
        assert_eq!(s.capacity(), 0);
        assert_eq!(s.len(), 0);
        assert!(s.get(0).is_none());
    }

    #[test]
    fn insert_get_remove() {
        let mut s = slab(u32::MAX);
        let a = s.insert(String::from("a")).unwrap();
        let b = s.insert(String::from("b")).unwrap();
        assert_eq!(s.get(a).map(String::as_str), Some("a"));
        s.get_mut(b).unwrap().push('!');
        assert_eq!(s.remove(b).as_deref(), Some("b!"));
        assert!(s.get(b).is_none());
        assert!(s.remove(b).is_none());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn first_growth_reserves_minimum() {
        let mut s = slab(u32::MAX);
        s.insert(1u8).unwrap();
        assert_eq!(s.capacity(), MIN_GROWTH);
    }

    #[test]
    fn growth_doubles_and_preserves_values() {
        let mut s = slab(u32::MAX);
        let indices: Vec<u32> = (0..9u64).map(|v| s.insert(v * 10).unwrap()).collect();
        assert_eq!(s.capacity(), 16);
        for (v, &i) in indices.iter().enumerate() {
            assert_eq!(s.get(i), Some(&(v as u64 * 10)));
        }
    }

    #[test]
    fn vacated_slots_are_reused_before_growth() {
        let mut s = slab(u32::MAX);
        let ids: Vec<u32> = (0..4).map(|v| s.insert(v).unwrap()).collect();
        s.remove(ids[1]);
        let reused = s.insert(99).unwrap();
        assert_eq!(reused, ids[1]);
        assert_eq!(s.capacity(), 4);
    }

    #[test]
    fn budget_caps_growth() {
        let mut s = slab(5);
        for v in 0..5 {
            s.insert(v).unwrap();
        }
        assert_eq!(s.capacity(), 5);
        assert!(s.insert(5).unwrap_err().is_out_of_memory());
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn reset_releases_block_and_reserves_target() {
        let mut s = slab(u32::MAX);
        let ids: Vec<u32> = (0..6).map(|v| s.insert(vec![v; 3]).unwrap()).collect();
        assert_eq!(s.capacity(), 8);
        for id in ids {
            s.remove(id);
        }
        s.reset(0);
        assert_eq!(s.capacity(), 0);
        assert_eq!(s.insert(vec![1]).unwrap(), 0);
        s.remove(0);
        s.reset(3);
        assert_eq!(s.capacity(), 3);
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn reserve_past_budget_rejected() {
        let mut s: Slab<u8> = slab(3);
        assert!(s.reserve(4).is_err());
        s.reserve(3).unwrap();
        assert_eq!(s.capacity(), 3);
    }
}
