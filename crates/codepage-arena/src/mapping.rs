//! Mapping pages: the PC index of a code page.
//!
//! A [`MappingPage`] is a fixed-capacity, append-only table of
//! [`MappingEntry`] records sorted by address. The emitter appends one
//! entry per instruction boundary; fault reporting resolves an arbitrary
//! PC with a floor search, so an address that lands on an operand word is
//! attributed to the instruction that owns it.

use std::alloc::Layout;
use std::fmt;
use std::mem::size_of;
use std::sync::Arc;

use codepage_core::{AllocRegion, PageError, SourceLocation};

use crate::address::DispatchAddress;
use crate::raw::{RawAllocator, RawBuffer};

/// One PC-to-source record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappingEntry {
    /// Address of the first word of the instruction.
    pub address: DispatchAddress,
    /// Where the instruction came from.
    pub location: SourceLocation,
}

/// Sorted, append-only PC index with a capacity fixed at creation.
pub struct MappingPage {
    table: RawBuffer,
    capacity: u32,
    len: u32,
}

impl MappingPage {
    /// Allocate an empty table with room for `capacity` entries.
    ///
    /// Returns [`PageError::OutOfMemory`] with
    /// [`AllocRegion::MappingTable`] if the allocator fails.
    pub fn with_capacity(
        capacity: u32,
        allocator: &Arc<dyn RawAllocator>,
    ) -> Result<Self, PageError> {
        // At least one entry so the layout is never zero-sized.
        let layout = Layout::array::<MappingEntry>(capacity.max(1) as usize).map_err(|_| {
            PageError::SizeOverflow {
                min_words: capacity,
            }
        })?;
        let table = RawBuffer::allocate(allocator, layout).ok_or(PageError::OutOfMemory {
            bytes: layout.size(),
            region: AllocRegion::MappingTable,
        })?;
        Ok(Self {
            table,
            capacity,
            len: 0,
        })
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of entries recorded so far.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no entry has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether another entry would be rejected.
    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    /// Size of the backing table in bytes.
    pub fn byte_size(&self) -> usize {
        self.table.len()
    }

    /// All recorded entries, in address order.
    pub fn entries(&self) -> &[MappingEntry] {
        self.table.slice(0, self.len as usize)
    }

    /// The most recently recorded entry.
    pub fn last(&self) -> Option<&MappingEntry> {
        self.entries().last()
    }

    /// Append an entry.
    ///
    /// Fails with [`PageError::MappingFull`] when the table is at capacity
    /// and [`PageError::MappingOutOfOrder`] when `address` is below the
    /// last recorded address. Equal addresses are accepted.
    pub fn push(
        &mut self,
        address: DispatchAddress,
        location: SourceLocation,
    ) -> Result<(), PageError> {
        if self.is_full() {
            return Err(PageError::MappingFull {
                capacity: self.capacity,
            });
        }
        if let Some(last) = self.last() {
            if address < last.address {
                return Err(PageError::MappingOutOfOrder {
                    last: last.address.addr(),
                    address: address.addr(),
                });
            }
        }
        let offset = self.len as usize * size_of::<MappingEntry>();
        self.table.write(offset, MappingEntry { address, location });
        self.len += 1;
        Ok(())
    }

    /// Resolve `address` to the entry at or immediately below it.
    ///
    /// An exact match wins; otherwise the nearest entry with a lower
    /// address is returned. `None` when `address` precedes every entry
    /// (or the table is empty).
    pub fn lookup(&self, address: DispatchAddress) -> Option<SourceLocation> {
        self.floor_entry(address).map(|entry| entry.location)
    }

    /// Entry-returning form of [`lookup`](Self::lookup).
    pub fn floor_entry(&self, address: DispatchAddress) -> Option<&MappingEntry> {
        let entries = self.entries();
        match entries.binary_search_by(|entry| entry.address.cmp(&address)) {
            Ok(exact) => Some(&entries[exact]),
            Err(0) => None,
            Err(insert_at) => Some(&entries[insert_at - 1]),
        }
    }
}

impl fmt::Debug for MappingPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingPage")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}
