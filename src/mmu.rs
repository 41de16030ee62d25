use std::collections::HashSet;

use crate::{
    replace::{AccessResult, Replace},
    resident::PageNumber,
};

/// Dirty-page tracking and the debug switch, shared between the accounting
/// layer and the active replacement policy.
///
/// A page is dirty from the write that marked it until it is evicted. Only
/// `evict` removes pages, so every dirty page is either resident or the page
/// whose write is currently being admitted.
#[derive(Debug, Default)]
pub struct PageState {
    dirty: HashSet<PageNumber>,
    debug: bool,
}

impl PageState {
    pub fn mark_dirty(&mut self, page: PageNumber) {
        self.dirty.insert(page);
    }

    pub fn is_dirty(&self, page: PageNumber) -> bool {
        self.dirty.contains(&page)
    }

    pub fn dirty_pages(&self) -> impl Iterator<Item = PageNumber> + '_ {
        self.dirty.iter().copied()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Records the eviction of `victim` in favour of `page` and clears the
    /// victim's dirty bit.
    pub fn evict(&mut self, victim: PageNumber, page: PageNumber) -> AccessResult {
        let was_dirty = self.dirty.remove(&victim);
        if self.debug {
            log::debug!("  evicted {victim:#x} for {page:#x} (dirty: {was_dirty})");
        }
        if was_dirty {
            AccessResult::MissEvictDirty
        } else {
            AccessResult::MissNoEvict
        }
    }
}

/// Fault and disk-I/O counters for one simulation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub page_faults: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
}

impl Counters {
    fn record(&mut self, result: AccessResult) {
        match result {
            AccessResult::Hit => {}
            AccessResult::MissNoEvict => {
                self.page_faults += 1;
                self.disk_reads += 1;
            }
            AccessResult::MissEvictDirty => {
                self.page_faults += 1;
                self.disk_reads += 1;
                self.disk_writes += 1;
            }
        }
    }
}

pub struct Mmu<R: Replace> {
    repl: R,
    state: PageState,
    counters: Counters,
}

impl<R: Replace> Mmu<R> {
    pub fn new(repl: R) -> Self {
        Mmu {
            repl,
            state: PageState::default(),
            counters: Counters::default(),
        }
    }

    pub fn policy(&self) -> &R {
        &self.repl
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    fn access(&mut self, page: PageNumber, op: &str) -> AccessResult {
        let result = self.repl.decide(page, &mut self.state);
        self.counters.record(result);
        if self.state.debug {
            let outcome = if result.is_hit() { "Hit" } else { "Miss" };
            log::debug!("{op} {page:#x}: {outcome}");
        }
        result
    }
}

/// Object-safe view of an [`Mmu`], so the driver can hold runs of different
/// policies behind `Box<dyn IsMmu>`.
pub trait IsMmu {
    fn read_page(&mut self, page: PageNumber) -> AccessResult;
    fn write_page(&mut self, page: PageNumber) -> AccessResult;
    fn counters(&self) -> Counters;
    fn enable_debug_logging(&mut self);
    fn disable_debug_logging(&mut self);

    fn total_page_faults(&self) -> u64 {
        self.counters().page_faults
    }

    fn total_disk_reads(&self) -> u64 {
        self.counters().disk_reads
    }

    fn total_disk_writes(&self) -> u64 {
        self.counters().disk_writes
    }
}

impl<R: Replace> IsMmu for Mmu<R> {
    fn read_page(&mut self, page: PageNumber) -> AccessResult {
        self.access(page, "Read")
    }

    fn write_page(&mut self, page: PageNumber) -> AccessResult {
        // Marked before admission so the page enters its frame already dirty.
        self.state.mark_dirty(page);
        self.access(page, "Write")
    }

    fn counters(&self) -> Counters {
        self.counters
    }

    fn enable_debug_logging(&mut self) {
        self.state.debug = true;
    }

    fn disable_debug_logging(&mut self) {
        self.state.debug = false;
    }
}
