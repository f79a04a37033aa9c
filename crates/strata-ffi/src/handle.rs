//! Generational handle table.
//!
//! A handle packs a slot index (upper 32 bits) and the slot's generation
//! (lower 32 bits). Removing a value bumps the generation, so handles to
//! it go stale instead of aliasing whatever reuses the slot.

fn pack(index: u32, generation: u32) -> u64 {
    (u64::from(index) << 32) | u64::from(generation)
}

fn unpack(handle: u64) -> (u32, u32) {
    ((handle >> 32) as u32, handle as u32)
}

struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Maps `u64` handles to owned values.
pub(crate) struct HandleTable<T> {
    entries: Vec<Entry<T>>,
    vacant: Vec<u32>,
}

impl<T> HandleTable<T> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
            vacant: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> u64 {
        match self.vacant.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                entry.value = Some(value);
                pack(index, entry.generation)
            }
            None => {
                let index = self.entries.len() as u32;
                self.entries.push(Entry {
                    generation: 0,
                    value: Some(value),
                });
                pack(index, 0)
            }
        }
    }

    fn entry(&self, handle: u64) -> Option<&Entry<T>> {
        let (index, generation) = unpack(handle);
        self.entries
            .get(index as usize)
            .filter(|e| e.generation == generation)
    }

    pub(crate) fn get(&self, handle: u64) -> Option<&T> {
        self.entry(handle)?.value.as_ref()
    }

    /// Take the value out and invalidate `handle`.
    ///
    /// A slot whose generation wraps to zero is retired rather than
    /// reused, so no handle from an earlier epoch can match it again.
    pub(crate) fn remove(&mut self, handle: u64) -> Option<T> {
        let (index, generation) = unpack(handle);
        let entry = self
            .entries
            .get_mut(index as usize)
            .filter(|e| e.generation == generation)?;
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        if entry.generation != 0 {
            self.vacant.push(index);
        }
        Some(value)
    }

    /// Number of live values.
    #[cfg(test)]
    pub(crate) fn live(&self) -> usize {
        self.entries.len() - self.vacant.len() - self.retired()
    }

    #[cfg(test)]
    fn retired(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.value.is_none() && e.generation == 0)
            .count()
    }
}
