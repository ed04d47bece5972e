//! Code pages: aligned buffers of code words with a bump cursor.
//!
//! A page buffer starts with a [`PageHeader`] followed immediately by
//! `capacity` code-word slots:
//!
//! ```text
//! start of buffer (aligned to PageConfig::align_bytes)
//! ├── PageHeader { sequence, capacity }     HEADER_BYTES
//! ├── slot 0          ← start_address()
//! ├── ...
//! ├── slot cursor     ← current_address()
//! └── slot capacity-1
//! ```
//!
//! Emission only ever appends at the cursor. Every emit checks the free
//! slot count first and returns [`PageError::CapacityExceeded`] instead
//! of writing past the end.

use std::fmt;
use std::mem::size_of;

use codepage_core::{
    CodeWord, ModuleRef, PageError, PageSequence, SourceLocation, WORD64_SLOTS, WORD_BYTES,
};

use crate::address::DispatchAddress;
use crate::mapping::MappingPage;
use crate::raw::RawBuffer;

/// Bookkeeping stored in front of the code slots.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageHeader {
    /// Creation sequence id.
    pub sequence: u64,
    /// Number of code-word slots following the header.
    pub capacity: u32,
    reserved: u32,
}

/// Size of [`PageHeader`] in bytes. A whole number of code words on every
/// supported target.
pub const HEADER_BYTES: usize = size_of::<PageHeader>();

const _: () = assert!(HEADER_BYTES % WORD_BYTES == 0);

/// One allocated page of emitted code plus its PC index.
///
/// Created by [`CodePageAllocator::create`](crate::CodePageAllocator::create)
/// and owned by a [`PageList`](crate::PageList) until teardown.
pub struct CodePage {
    // Fields drop in declaration order: the mapping table is released
    // before the code buffer.
    mapping: MappingPage,
    buffer: RawBuffer,
    cursor: u32,
}

impl CodePage {
    /// Stamp the header into `buffer` and wrap it.
    pub(crate) fn init(
        mut buffer: RawBuffer,
        mapping: MappingPage,
        sequence: PageSequence,
        capacity: u32,
    ) -> Self {
        debug_assert!(HEADER_BYTES + capacity as usize * WORD_BYTES <= buffer.len());
        buffer.write(
            0,
            PageHeader {
                sequence: sequence.0,
                capacity,
                reserved: 0,
            },
        );
        Self {
            mapping,
            buffer,
            cursor: 0,
        }
    }

    /// The header as stored in the buffer.
    pub fn header(&self) -> PageHeader {
        self.buffer.read(0)
    }

    /// Creation sequence id.
    pub fn sequence(&self) -> PageSequence {
        PageSequence(self.header().sequence)
    }

    /// Total number of code-word slots.
    pub fn capacity(&self) -> u32 {
        self.header().capacity
    }

    /// Index of the next free slot.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Number of slots written so far. Same as [`cursor`](Self::cursor).
    pub fn used_slots(&self) -> u32 {
        self.cursor
    }

    /// Slots still available for emission.
    pub fn free_slots(&self) -> u32 {
        let capacity = self.capacity();
        debug_assert!(self.cursor <= capacity, "cursor past page capacity");
        capacity - self.cursor
    }

    /// Fraction of slots in use, in `0.0..=1.0`.
    pub fn utilization(&self) -> f64 {
        match self.capacity() {
            0 => 0.0,
            capacity => f64::from(self.cursor) / f64::from(capacity),
        }
    }

    /// Size of the page buffer in bytes, header included.
    pub fn byte_size(&self) -> usize {
        self.buffer.len()
    }

    /// The page's PC index.
    pub fn mapping(&self) -> &MappingPage {
        &self.mapping
    }

    /// Address of slot 0.
    pub fn start_address(&self) -> DispatchAddress {
        DispatchAddress::new(self.buffer.addr() + HEADER_BYTES)
    }

    /// Address of the next free slot.
    pub fn current_address(&self) -> DispatchAddress {
        self.start_address().add_slots(self.cursor as usize)
    }

    /// Whether `address` falls inside the written part of the page.
    ///
    /// Unwritten capacity does not count: the range is
    /// `start_address()..current_address()`.
    pub fn contains(&self, address: DispatchAddress) -> bool {
        self.start_address() <= address && address < self.current_address()
    }

    /// Reserve `slots` slots at the cursor and return the byte offset of
    /// the first one.
    fn claim(&mut self, slots: u32) -> Result<usize, PageError> {
        let available = self.free_slots();
        if slots > available {
            return Err(PageError::CapacityExceeded {
                requested: slots,
                available,
            });
        }
        let offset = HEADER_BYTES + self.cursor as usize * WORD_BYTES;
        self.cursor += slots;
        Ok(offset)
    }

    /// Append one native word.
    pub fn emit_word(&mut self, word: CodeWord) -> Result<(), PageError> {
        let offset = self.claim(1)?;
        self.buffer.write(offset, word);
        Ok(())
    }

    /// Append a 32-bit value in one slot.
    pub fn emit_word32(&mut self, word: u32) -> Result<(), PageError> {
        let offset = self.claim(1)?;
        self.buffer.write(offset, word);
        Ok(())
    }

    /// Append a 64-bit value.
    ///
    /// Occupies [`WORD64_SLOTS`] slots: two on 32-bit targets, one on
    /// 64-bit targets.
    pub fn emit_word64(&mut self, word: u64) -> Result<(), PageError> {
        let offset = self.claim(WORD64_SLOTS)?;
        self.buffer.write(offset, word);
        Ok(())
    }

    /// Append a dispatch address, e.g. a branch target on another page.
    pub fn emit_address(&mut self, target: DispatchAddress) -> Result<(), PageError> {
        self.emit_word(target.addr())
    }

    /// Record that code emitted from here on comes from `module` at
    /// `offset`.
    ///
    /// The entry is keyed on [`current_address`](Self::current_address),
    /// the slot the next emit will fill.
    pub fn emit_mapping_entry(&mut self, module: ModuleRef, offset: u64) -> Result<(), PageError> {
        let address = self.current_address();
        self.mapping
            .push(address, SourceLocation::new(module, offset))
    }

    /// Read back a written slot. `None` for slots at or past the cursor.
    pub fn word_at(&self, slot: u32) -> Option<CodeWord> {
        (slot < self.cursor).then(|| self.buffer.read(HEADER_BYTES + slot as usize * WORD_BYTES))
    }

    /// Read back a 64-bit value written with [`emit_word64`](Self::emit_word64).
    pub fn word64_at(&self, slot: u32) -> Option<u64> {
        let end = slot.checked_add(WORD64_SLOTS)?;
        (end <= self.cursor).then(|| self.buffer.read(HEADER_BYTES + slot as usize * WORD_BYTES))
    }

    /// Resolve `address` through this page's mapping table.
    ///
    /// The address is expected to lie on this page; see
    /// [`PageList::map_pc_to_offset`](crate::PageList::map_pc_to_offset)
    /// for routing an arbitrary address.
    pub fn map_pc_to_offset(&self, address: DispatchAddress) -> Option<SourceLocation> {
        self.mapping.lookup(address)
    }
}

impl fmt::Debug for CodePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodePage")
            .field("sequence", &self.sequence())
            .field("start", &self.start_address())
            .field("cursor", &self.cursor)
            .field("capacity", &self.capacity())
            .field("mapping", &self.mapping)
            .finish()
    }
}
