use std::collections::HashMap;

use crate::error::{Error, Result};

pub type PageNumber = u64;

/// A resident page and the replacement metadata its policy keeps for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<E> {
    pub page: PageNumber,
    pub entry: E,
}

/// Fixed-capacity frame table.
///
/// Frames are filled in slot order and never removed: evicting a page means
/// overwriting its slot with the incoming page, so slot indices stay stable
/// for the lifetime of the set. The Clock policy relies on this to use the
/// slot order as its circle.
#[derive(Debug)]
pub struct ResidentSet<E> {
    frames: Vec<Frame<E>>,
    slots: HashMap<PageNumber, usize>,
    capacity: usize,
}

impl<E> ResidentSet<E> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(ResidentSet {
            frames: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn contains(&self, page: PageNumber) -> bool {
        self.slots.contains_key(&page)
    }

    pub fn slot_of(&self, page: PageNumber) -> Option<usize> {
        self.slots.get(&page).copied()
    }

    pub fn get_mut(&mut self, page: PageNumber) -> Option<&mut E> {
        let slot = *self.slots.get(&page)?;
        Some(&mut self.frames[slot].entry)
    }

    pub fn frame(&self, slot: usize) -> &Frame<E> {
        &self.frames[slot]
    }

    pub fn frame_mut(&mut self, slot: usize) -> &mut Frame<E> {
        &mut self.frames[slot]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Frame<E>)> {
        self.frames.iter().enumerate()
    }

    pub fn pages(&self) -> impl Iterator<Item = PageNumber> + '_ {
        self.frames.iter().map(|f| f.page)
    }

    /// Loads `page` into the next free slot and returns that slot.
    ///
    /// Panics if the set is full or the page is already resident.
    pub fn insert(&mut self, page: PageNumber, entry: E) -> usize {
        assert!(!self.is_full(), "insert into a full resident set");
        let slot = self.frames.len();
        let prev = self.slots.insert(page, slot);
        assert!(prev.is_none(), "page {page:#x} is already resident");
        self.frames.push(Frame { page, entry });
        slot
    }

    /// Evicts whatever occupies `slot`, loads `page` in its place and returns
    /// the evicted page.
    pub fn replace(&mut self, slot: usize, page: PageNumber, entry: E) -> PageNumber {
        let victim = std::mem::replace(&mut self.frames[slot], Frame { page, entry });
        self.slots.remove(&victim.page);
        let prev = self.slots.insert(page, slot);
        assert!(prev.is_none(), "page {page:#x} is already resident");
        victim.page
    }
}
