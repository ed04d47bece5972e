//! Owning stacks of code pages.
//!
//! A [`PageList`] owns every page pushed onto it. The head is the most
//! recently pushed page; the tail is the oldest. Destroying the list (or
//! dropping it) frees the pages head first, each page's mapping table
//! before its code buffer.

use std::collections::VecDeque;

use codepage_core::SourceLocation;
use log::debug;

use crate::address::DispatchAddress;
use crate::page::CodePage;

/// Head-first stack of owned [`CodePage`]s.
#[derive(Debug, Default)]
pub struct PageList {
    pages: VecDeque<CodePage>,
}

impl PageList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `page` the new head.
    pub fn push(&mut self, page: CodePage) {
        self.pages.push_front(page);
    }

    /// Detach and return the head, or `None` if the list is empty.
    pub fn pop(&mut self) -> Option<CodePage> {
        self.pages.pop_front()
    }

    /// The head page.
    pub fn head(&self) -> Option<&CodePage> {
        self.pages.front()
    }

    /// The head page, mutably, for continued emission.
    pub fn head_mut(&mut self) -> Option<&mut CodePage> {
        self.pages.front_mut()
    }

    /// Number of pages and the tail page (`None` for an empty list).
    pub fn find_end(&self) -> (usize, Option<&CodePage>) {
        (self.pages.len(), self.pages.back())
    }

    /// Number of pages.
    pub fn count(&self) -> usize {
        self.find_end().0
    }

    /// The tail page: the oldest one still in the list.
    pub fn end(&self) -> Option<&CodePage> {
        self.find_end().1
    }

    /// Whether the list holds no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &CodePage> + '_ {
        self.pages.iter()
    }

    /// Write address of the head page, `None` for an empty list.
    pub fn current_address(&self) -> Option<DispatchAddress> {
        self.head().map(CodePage::current_address)
    }

    /// The page whose written range contains `address`.
    pub fn find_containing(&self, address: DispatchAddress) -> Option<&CodePage> {
        self.pages.iter().find(|page| page.contains(address))
    }

    /// Route `address` to its page and resolve it to a source location.
    ///
    /// `None` if no page contains the address or the owning page has no
    /// mapping entry at or below it.
    pub fn map_pc_to_offset(&self, address: DispatchAddress) -> Option<SourceLocation> {
        self.find_containing(address)?.map_pc_to_offset(address)
    }

    /// Free every page in list order and leave the list empty.
    ///
    /// Returns the number of pages freed. Destroying an empty list is a
    /// no-op.
    pub fn destroy(&mut self) -> usize {
        let mut freed = 0;
        while let Some(page) = self.pages.pop_front() {
            debug!(
                "free page: {}; {}; util: {:3.1}%",
                page.sequence(),
                page.start_address(),
                100.0 * page.utilization()
            );
            drop(page);
            freed += 1;
        }
        freed
    }
}

impl Drop for PageList {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<'a> IntoIterator for &'a PageList {
    type Item = &'a CodePage;
    type IntoIter = std::collections::vec_deque::Iter<'a, CodePage>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodePageAllocator, PageConfig};
    use codepage_core::{ModuleRef, PageSequence};

    fn allocator() -> CodePageAllocator {
        CodePageAllocator::new(PageConfig::new(256)).unwrap()
    }

    fn sequences(list: &PageList) -> Vec<PageSequence> {
        list.iter().map(CodePage::sequence).collect()
    }

    #[test]
    fn empty_list_has_no_end() {
        let list = PageList::new();
        assert_eq!(list.count(), 0);
        assert!(list.end().is_none());
        assert!(list.head().is_none());
        assert!(list.current_address().is_none());
    }

    #[test]
    fn push_makes_head_and_tail_is_oldest() {
        let alloc = allocator();
        let mut list = PageList::new();
        for _ in 0..4 {
            list.push(alloc.create(1).unwrap());
        }
        let (count, tail) = list.find_end();
        assert_eq!(count, 4);
        assert_eq!(tail.unwrap().sequence(), PageSequence(1));
        assert_eq!(list.head().unwrap().sequence(), PageSequence(4));
        assert_eq!(
            sequences(&list),
            vec![PageSequence(4), PageSequence(3), PageSequence(2), PageSequence(1)]
        );
    }

    #[test]
    fn push_then_pop_returns_same_page() {
        let alloc = allocator();
        let mut list = PageList::new();
        list.push(alloc.create(1).unwrap());
        list.push(alloc.create(1).unwrap());
        let before = sequences(&list);

        let page = alloc.create(1).unwrap();
        let start = page.start_address();
        list.push(page);
        let popped = list.pop().unwrap();

        assert_eq!(popped.start_address(), start);
        assert_eq!(sequences(&list), before);
    }

    #[test]
    fn pop_on_empty_is_none() {
        assert!(PageList::new().pop().is_none());
    }

    #[test]
    fn head_mut_continues_emission() {
        let mut list = PageList::new();
        list.push(allocator().create(4).unwrap());
        let before = list.current_address().unwrap();
        list.head_mut().unwrap().emit_word(7).unwrap();
        assert_eq!(list.current_address(), Some(before.add_slots(1)));
    }

    #[test_log::test]
    fn destroy_frees_everything_once() {
        let alloc = allocator();
        let mut list = PageList::new();
        for _ in 0..3 {
            let mut page = alloc.create(4).unwrap();
            page.emit_word(1).unwrap();
            list.push(page);
        }
        assert_eq!(list.destroy(), 3);
        assert!(list.is_empty());
        assert_eq!(list.destroy(), 0);
    }

    #[test]
    fn routes_address_to_owning_page() {
        let alloc = allocator();
        let mut list = PageList::new();
        let mut probes = Vec::new();
        for module in 0..3u32 {
            let mut page = alloc.create(4).unwrap();
            page.emit_mapping_entry(ModuleRef(module), 10).unwrap();
            page.emit_word(0).unwrap();
            page.emit_word(0).unwrap();
            probes.push((page.start_address().add_slots(1), module));
            list.push(page);
        }

        for (address, module) in probes {
            let loc = list.map_pc_to_offset(address).unwrap();
            assert_eq!(loc.module, ModuleRef(module));
            assert_eq!(loc.offset, 10);
        }
        let unwritten = list.current_address().unwrap();
        assert!(list.find_containing(unwritten).is_none());
        assert!(list.map_pc_to_offset(unwritten).is_none());
    }

    #[test]
    fn into_iter_visits_head_first() {
        let alloc = allocator();
        let mut list = PageList::new();
        list.push(alloc.create(1).unwrap());
        list.push(alloc.create(1).unwrap());
        let ids: Vec<_> = (&list).into_iter().map(|p| p.sequence().0).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
