use crate::{
    error::Result,
    mmu::PageState,
    resident::{PageNumber, ResidentSet},
};

use super::{AccessResult, Replace};

/// Second-chance replacement. Each frame carries a use flag; the hand sweeps
/// the frames in slot order, clearing set flags until it meets a clear one.
#[derive(Debug)]
pub struct Clock {
    frames: ResidentSet<bool>,
    hand: usize,
}

impl Clock {
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Clock {
            frames: ResidentSet::new(capacity)?,
            hand: 0,
        })
    }

    pub fn hand(&self) -> usize {
        self.hand
    }

    /// Pages in slot order, with their use flags.
    pub fn circle(&self) -> impl Iterator<Item = (PageNumber, bool)> + '_ {
        self.frames.iter().map(|(_, f)| (f.page, f.entry))
    }

    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.frames.capacity();
    }

    fn evict_at_hand(&mut self, page: PageNumber, state: &mut PageState) -> AccessResult {
        let victim = self.frames.replace(self.hand, page, true);
        self.advance();
        state.evict(victim, page)
    }
}

impl Replace for Clock {
    fn decide(&mut self, page: PageNumber, state: &mut PageState) -> AccessResult {
        if let Some(used) = self.frames.get_mut(page) {
            *used = true;
            if state.debug() {
                log::debug!("  hit {page:#x}, use flag set");
            }
            return AccessResult::Hit;
        }

        if !self.frames.is_full() {
            self.frames.insert(page, true);
            if state.debug() {
                log::debug!("  loaded {page:#x} into a free frame");
            }
            return AccessResult::MissNoEvict;
        }

        let start = self.hand;
        loop {
            let frame = self.frames.frame_mut(self.hand);
            if !frame.entry {
                return self.evict_at_hand(page, state);
            }
            frame.entry = false;
            if state.debug() {
                log::debug!("  second chance for {:#x}", frame.page);
            }
            self.advance();

            // Every flag between start and here was set and is now clear, so
            // the page back at start is taken.
            if self.hand == start {
                if state.debug() {
                    log::debug!("  full circle, evicting at slot {start}");
                }
                return self.evict_at_hand(page, state);
            }
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
