use crate::{
    error::Result,
    mmu::PageState,
    resident::{PageNumber, ResidentSet},
};

use super::{AccessResult, Replace};

pub struct Random {
    frames: ResidentSet<()>,
    rng: fastrand::Rng,
}

impl Random {
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_rng(capacity, fastrand::Rng::new())
    }

    /// Uses `rng` for victim selection; seed it for reproducible runs.
    pub fn with_rng(capacity: usize, rng: fastrand::Rng) -> Result<Self> {
        Ok(Random {
            frames: ResidentSet::new(capacity)?,
            rng,
        })
    }
}

impl Replace for Random {
    fn decide(&mut self, page: PageNumber, state: &mut PageState) -> AccessResult {
        if self.frames.contains(page) {
            return AccessResult::Hit;
        }

        if !self.frames.is_full() {
            self.frames.insert(page, ());
            return AccessResult::MissNoEvict;
        }

        let slot = self.rng.usize(0..self.frames.len());
        let victim = self.frames.replace(slot, page, ());
        state.evict(victim, page)
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

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn same_seed_same_victims() {
        let pages: Vec<PageNumber> = (0..200).map(|i| (i * 7919) % 23).collect();
        let residents = |seed| {
            let mut random = Random::with_rng(5, fastrand::Rng::with_seed(seed)).unwrap();
            let mut state = PageState::default();
            let results: Vec<_> = pages.iter().map(|&p| random.decide(p, &mut state)).collect();
            (results, random.frames.pages().collect::<Vec<_>>())
        };
        assert_eq!(residents(42), residents(42));
    }

    #[test]
    fn hit_changes_nothing() {
        let mut random = Random::with_rng(2, fastrand::Rng::with_seed(1)).unwrap();
        let mut state = PageState::default();
        random.decide(1, &mut state);
        random.decide(2, &mut state);
        assert_eq!(random.decide(2, &mut state), AccessResult::Hit);
        assert_eq!(random.frames.pages().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn victims_are_uniform() {
        const CAPACITY: usize = 4;
        const TRIALS: usize = 40_000;

        let mut evicted: HashMap<PageNumber, usize> = HashMap::new();
        for seed in 0..TRIALS as u64 {
            let mut random = Random::with_rng(CAPACITY, fastrand::Rng::with_seed(seed)).unwrap();
            let mut state = PageState::default();
            for page in 0..CAPACITY as u64 {
                random.decide(page, &mut state);
            }
            random.decide(99, &mut state);
            let victim = (0..CAPACITY as u64)
                .find(|&p| !random.is_resident(p))
                .unwrap();
            *evicted.entry(victim).or_default() += 1;
        }

        let expected = TRIALS as f64 / CAPACITY as f64;
        assert_eq!(evicted.len(), CAPACITY);
        for (page, count) in evicted {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "page {page} evicted {count} times");
        }
    }

    #[test]
    fn dirty_victim_reported() {
        let mut random = Random::with_rng(1, fastrand::Rng::with_seed(9)).unwrap();
        let mut state = PageState::default();
        state.mark_dirty(1);
        random.decide(1, &mut state);
        assert_eq!(random.decide(2, &mut state), AccessResult::MissEvictDirty);
        assert_eq!(random.decide(3, &mut state), AccessResult::MissNoEvict);
    }
}
