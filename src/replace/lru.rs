use crate::{
    error::Result,
    mmu::PageState,
    resident::{PageNumber, ResidentSet},
};

use super::{AccessResult, Replace};

/// Least-recently-used replacement over per-frame access stamps.
///
/// Stamps come from a counter bumped on every access, so no two accesses share
/// one. Eviction scans the frames in slot order and takes the smallest stamp.
#[derive(Debug)]
pub struct Lru {
    frames: ResidentSet<u64>,
    clock: u64,
}

impl Lru {
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Lru {
            frames: ResidentSet::new(capacity)?,
            clock: 0,
        })
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    pub fn last_access(&self, page: PageNumber) -> Option<u64> {
        let slot = self.frames.slot_of(page)?;
        Some(self.frames.frame(slot).entry)
    }

    fn lru_slot(&self) -> Option<usize> {
        let mut oldest: Option<(usize, u64)> = None;
        for (slot, frame) in self.frames.iter() {
            if oldest.map_or(true, |(_, stamp)| frame.entry < stamp) {
                oldest = Some((slot, frame.entry));
            }
        }
        oldest.map(|(slot, _)| slot)
    }
}

impl Replace for Lru {
    fn decide(&mut self, page: PageNumber, state: &mut PageState) -> AccessResult {
        let now = self.tick();

        if let Some(stamp) = self.frames.get_mut(page) {
            *stamp = now;
            if state.debug() {
                log::debug!("  hit {page:#x}, stamped {now}");
            }
            return AccessResult::Hit;
        }

        if !self.frames.is_full() {
            self.frames.insert(page, now);
            return AccessResult::MissNoEvict;
        }

        match self.lru_slot() {
            Some(slot) => {
                let victim = self.frames.replace(slot, page, now);
                state.evict(victim, page)
            }
            // A full set with positive capacity always has a frame.
            None => unreachable!("full resident set with no frames"),
        }
    }

    fn resident(&self) -> usize {
        self.frames.len()
    }

    fn capacity(&self) -> usize {
        self.frames.capacity()
    }

    fn is_resident(&self, page: PageNumber) -> bool {
        self.frames.contains(page)
    }
}
