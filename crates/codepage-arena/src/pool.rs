//! Runtime-level page recycling.
//!
//! A [`CodePagePool`] keeps two lists: *open* pages that still have room
//! and *full* pages that have been retired. Compilation checks a page out
//! with [`acquire`](CodePagePool::acquire), emits into it, and hands it
//! back with [`release`](CodePagePool::release). Fault reporting searches
//! both lists.
//!
//! A page that is checked out is not visible to
//! [`find_page`](CodePagePool::find_page) until it is released.

use codepage_core::{PageError, SourceLocation};
use log::trace;

use crate::address::DispatchAddress;
use crate::allocator::CodePageAllocator;
use crate::list::PageList;
use crate::page::CodePage;

/// Occupancy summary of a [`CodePagePool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Pages on the open list.
    pub open_pages: usize,
    /// Pages on the full list.
    pub full_pages: usize,
    /// Slot capacity across both lists.
    pub total_slots: u64,
    /// Slots written across both lists.
    pub used_slots: u64,
}

/// Open/full page lists plus the allocator that feeds them.
#[derive(Debug)]
pub struct CodePagePool {
    allocator: CodePageAllocator,
    open: PageList,
    full: PageList,
}

impl CodePagePool {
    /// An empty pool drawing new pages from `allocator`.
    pub fn new(allocator: CodePageAllocator) -> Self {
        Self {
            allocator,
            open: PageList::new(),
            full: PageList::new(),
        }
    }

    /// The allocator new pages come from.
    pub fn allocator(&self) -> &CodePageAllocator {
        &self.allocator
    }

    /// Pages with room left.
    pub fn open(&self) -> &PageList {
        &self.open
    }

    /// Retired pages.
    pub fn full(&self) -> &PageList {
        &self.full
    }

    /// Check out a page with at least `min_words` free slots.
    ///
    /// Reuses the head of the open list when it has room; otherwise that
    /// page is retired to the full list and a new page is created with
    /// capacity for `max(min_words, free_slots_threshold)` words.
    ///
    /// Only the head of the open list is considered. Deeper open pages are
    /// not searched, even if one of them has room; they are picked up again
    /// as the pages above them are retired.
    pub fn acquire(&mut self, min_words: u32) -> Result<CodePage, PageError> {
        if let Some(page) = self.open.pop() {
            if page.free_slots() >= min_words {
                trace!(
                    "acquire: reusing page {} with {} free slots",
                    page.sequence(),
                    page.free_slots()
                );
                return Ok(page);
            }
            trace!(
                "acquire: retiring page {} ({} free < {min_words})",
                page.sequence(),
                page.free_slots()
            );
            self.full.push(page);
        }

        let words = min_words.max(self.allocator.config().free_slots_threshold);
        self.allocator.create(words)
    }

    /// Return a checked-out page.
    ///
    /// Pages with fewer than `free_slots_threshold` free slots go to the
    /// full list; the rest go back to the open list.
    pub fn release(&mut self, page: CodePage) {
        let threshold = self.allocator.config().free_slots_threshold;
        if page.free_slots() < threshold {
            trace!("release: page {} -> full", page.sequence());
            self.full.push(page);
        } else {
            trace!("release: page {} -> open", page.sequence());
            self.open.push(page);
        }
    }

    /// The pooled page whose written range contains `address`.
    pub fn find_page(&self, address: DispatchAddress) -> Option<&CodePage> {
        self.open
            .find_containing(address)
            .or_else(|| self.full.find_containing(address))
    }

    /// Resolve `address` through whichever pooled page contains it.
    pub fn map_pc_to_offset(&self, address: DispatchAddress) -> Option<SourceLocation> {
        self.find_page(address)?.map_pc_to_offset(address)
    }

    /// Current occupancy.
    pub fn stats(&self) -> PoolStats {
        let (open_pages, _) = self.open.find_end();
        let (full_pages, _) = self.full.find_end();
        let (total_slots, used_slots) = self
            .open
            .iter()
            .chain(self.full.iter())
            .fold((0u64, 0u64), |(total, used), page| {
                (
                    total + u64::from(page.capacity()),
                    used + u64::from(page.used_slots()),
                )
            });
        PoolStats {
            open_pages,
            full_pages,
            total_slots,
            used_slots,
        }
    }

    /// Free every pooled page. Returns the number of pages freed.
    pub fn teardown(&mut self) -> usize {
        self.open.destroy() + self.full.destroy()
    }
}
