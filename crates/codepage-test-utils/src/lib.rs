//! Test utilities for code-page development.
//!
//! Provides instrumented [`RawAllocator`] implementations
//! ([`CountingAllocator`], [`FailingAllocator`]) for asserting allocation
//! and release behaviour, and emission [`fixtures`] that lay down
//! realistic instruction streams.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::alloc::Layout;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use codepage_arena::{RawAllocator, RawBlock, SystemAllocator};

/// One call observed by a [`CountingAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocEvent {
    Allocate { size: usize, align: usize },
    Release { size: usize, align: usize },
}

impl AllocEvent {
    pub fn size(&self) -> usize {
        match *self {
            Self::Allocate { size, .. } | Self::Release { size, .. } => size,
        }
    }

    pub fn align(&self) -> usize {
        match *self {
            Self::Allocate { align, .. } | Self::Release { align, .. } => align,
        }
    }

    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release { .. })
    }
}

/// Forwards to [`SystemAllocator`] and records every call in order.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    events: Mutex<Vec<AllocEvent>>,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, oldest first.
    pub fn events(&self) -> Vec<AllocEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Only the releases, in order.
    pub fn releases(&self) -> Vec<AllocEvent> {
        self.events().into_iter().filter(AllocEvent::is_release).collect()
    }

    pub fn allocation_count(&self) -> usize {
        self.events().iter().filter(|e| !e.is_release()).count()
    }

    pub fn release_count(&self) -> usize {
        self.releases().len()
    }

    /// Blocks handed out and not yet returned.
    pub fn live_blocks(&self) -> usize {
        self.allocation_count() - self.release_count()
    }

    /// Bytes handed out and not yet returned.
    pub fn live_bytes(&self) -> usize {
        self.events().iter().fold(0, |live, e| {
            if e.is_release() {
                live - e.size()
            } else {
                live + e.size()
            }
        })
    }

    fn record(&self, event: AllocEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl RawAllocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Option<RawBlock> {
        let block = SystemAllocator.allocate(layout)?;
        self.record(AllocEvent::Allocate {
            size: layout.size(),
            align: layout.align(),
        });
        Some(block)
    }

    fn release(&self, block: RawBlock) {
        let layout = block.layout();
        self.record(AllocEvent::Release {
            size: layout.size(),
            align: layout.align(),
        });
        SystemAllocator.release(block);
    }
}

/// Fails exactly the `n`-th allocation (1-based); every other call is
/// forwarded to an inner [`CountingAllocator`].
#[derive(Debug)]
pub struct FailingAllocator {
    fail_on: usize,
    attempts: AtomicUsize,
    inner: CountingAllocator,
}

impl FailingAllocator {
    pub fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            attempts: AtomicUsize::new(0),
            inner: CountingAllocator::new(),
        }
    }

    /// The successful traffic.
    pub fn counts(&self) -> &CountingAllocator {
        &self.inner
    }

    /// Allocation attempts so far, including the failed one.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl RawAllocator for FailingAllocator {
    fn allocate(&self, layout: Layout) -> Option<RawBlock> {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        if attempt == self.fail_on {
            return None;
        }
        self.inner.allocate(layout)
    }

    fn release(&self, block: RawBlock) {
        self.inner.release(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_tracks_live_bytes() {
        let alloc = CountingAllocator::new();
        let layout = Layout::from_size_align(64, 8).unwrap();
        let a = alloc.allocate(layout).unwrap();
        let b = alloc.allocate(layout).unwrap();
        assert_eq!(alloc.live_blocks(), 2);
        assert_eq!(alloc.live_bytes(), 128);
        alloc.release(a);
        alloc.release(b);
        assert_eq!(alloc.live_blocks(), 0);
        assert_eq!(alloc.live_bytes(), 0);
        assert_eq!(alloc.events().len(), 4);
    }

    #[test]
    fn failing_fails_only_the_nth() {
        let alloc = FailingAllocator::new(2);
        let layout = Layout::from_size_align(16, 8).unwrap();
        let first = alloc.allocate(layout);
        assert!(first.is_some());
        assert!(alloc.allocate(layout).is_none());
        let third = alloc.allocate(layout);
        assert!(third.is_some());
        assert_eq!(alloc.attempts(), 3);
        assert_eq!(alloc.counts().allocation_count(), 2);
        alloc.release(first.unwrap());
        alloc.release(third.unwrap());
        assert_eq!(alloc.counts().live_blocks(), 0);
    }
}
