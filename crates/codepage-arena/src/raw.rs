//! Raw block allocation.
//!
//! This is the only module in the crate allowed to use `unsafe`. It owns
//! the allocator seam ([`RawAllocator`], [`RawBlock`], [`SystemAllocator`])
//! and the crate-private [`RawBuffer`], which turns a block into bounds
//! checked, unaligned-tolerant reads and writes. Every other module works
//! with byte offsets and never touches a pointer.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::fmt;
use std::mem::{align_of, size_of};
use std::ptr::NonNull;
use std::sync::Arc;

/// An owned block of raw memory handed out by a [`RawAllocator`].
///
/// Only an allocator can create a block. It must be returned to the same
/// allocator through [`RawAllocator::release`].
pub struct RawBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: a block is the unique owner of its allocation; nothing else
// aliases the memory while the block is alive.
unsafe impl Send for RawBlock {}
// SAFETY: `RawBlock` exposes no interior mutability through `&self`.
unsafe impl Sync for RawBlock {}

impl RawBlock {
    /// Wrap memory produced by a custom allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must point to `layout.size()` zeroed, writable bytes aligned to
    /// `layout.align()`, exclusively owned by the returned block, and valid
    /// until the block is passed back to the allocator that produced it.
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, layout: Layout) -> Self {
        Self { ptr, layout }
    }

    /// Decompose the block, for allocators implementing `release`.
    pub fn into_raw_parts(self) -> (NonNull<u8>, Layout) {
        (self.ptr, self.layout)
    }

    /// Layout the block was allocated with.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Size of the block in bytes.
    pub fn size(&self) -> usize {
        self.layout.size()
    }
}

impl fmt::Debug for RawBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBlock")
            .field("ptr", &self.ptr)
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}

/// Source of zeroed, aligned memory for code buffers and mapping tables.
///
/// Failure is reported as `None` and is never retried internally.
pub trait RawAllocator: Send + Sync {
    /// Allocate a zeroed block for `layout`. Zero-sized layouts are refused.
    fn allocate(&self, layout: Layout) -> Option<RawBlock>;

    /// Return a block previously produced by [`allocate`](Self::allocate).
    fn release(&self, block: RawBlock);
}

/// [`RawAllocator`] backed by the global Rust allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

impl RawAllocator for SystemAllocator {
    fn allocate(&self, layout: Layout) -> Option<RawBlock> {
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).map(|ptr| RawBlock { ptr, layout })
    }

    fn release(&self, block: RawBlock) {
        let (ptr, layout) = block.into_raw_parts();
        // SAFETY: blocks reaching this allocator were produced by
        // `allocate` above with this exact layout (the `from_raw_parts`
        // contract forbids routing foreign blocks here).
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
    }
}

/// A block bound to the allocator that must release it.
///
/// Reads and writes take byte offsets and are bounds checked in every build
/// configuration; an out-of-range access panics instead of corrupting
/// memory. Values are plain `Copy` data written with unaligned stores, so
/// the element width may differ from the buffer's alignment.
pub(crate) struct RawBuffer {
    block: Option<RawBlock>,
    base: NonNull<u8>,
    len: usize,
    allocator: Arc<dyn RawAllocator>,
}

// SAFETY: `base` points into the block the buffer exclusively owns, and the
// allocator it is released to is `Send + Sync`. Moving the buffer moves
// that ownership with it.
unsafe impl Send for RawBuffer {}
// SAFETY: every mutation goes through `&mut self`; shared references only
// read.
unsafe impl Sync for RawBuffer {}

impl RawBuffer {
    /// Allocate `layout` from `allocator`. `None` if the allocator failed.
    ///
    /// # Panics
    ///
    /// Panics if the allocator returns a block that is smaller or less
    /// aligned than requested.
    pub(crate) fn allocate(allocator: &Arc<dyn RawAllocator>, layout: Layout) -> Option<Self> {
        let block = allocator.allocate(layout)?;
        assert!(
            block.size() >= layout.size() && block.ptr.as_ptr() as usize % layout.align() == 0,
            "allocator returned {block:?} for {layout:?}"
        );
        Some(Self {
            base: block.ptr,
            len: layout.size(),
            block: Some(block),
            allocator: Arc::clone(allocator),
        })
    }

    /// Address of the first byte, with its provenance exposed so that
    /// addresses derived from it can be turned back into pointers.
    pub(crate) fn addr(&self) -> usize {
        self.base.as_ptr().expose_provenance()
    }

    /// Usable size in bytes.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    fn check<T>(&self, offset: usize, count: usize) {
        let end = count
            .checked_mul(size_of::<T>())
            .and_then(|bytes| bytes.checked_add(offset));
        assert!(
            end.is_some_and(|end| end <= self.len),
            "raw access of {count} x {} bytes at offset {offset} exceeds buffer of {} bytes",
            size_of::<T>(),
            self.len
        );
    }

    /// Store `value` at byte `offset`.
    pub(crate) fn write<T: Copy>(&mut self, offset: usize, value: T) {
        self.check::<T>(offset, 1);
        // SAFETY: the range was bounds checked above and the buffer is
        // exclusively borrowed; unaligned stores are always permitted.
        unsafe { self.base.as_ptr().add(offset).cast::<T>().write_unaligned(value) };
    }

    /// Load a `T` from byte `offset`.
    ///
    /// `T` must be plain data for which every bit pattern (including the
    /// allocator's zero fill) is a valid value.
    pub(crate) fn read<T: Copy>(&self, offset: usize) -> T {
        self.check::<T>(offset, 1);
        // SAFETY: bounds checked above; the memory is initialised (zeroed
        // by the allocator or written since) and `T` is plain data.
        unsafe { self.base.as_ptr().add(offset).cast::<T>().read_unaligned() }
    }

    /// View `count` consecutive `T`s starting at byte `offset`.
    ///
    /// Same plain-data requirement as [`read`](Self::read).
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or misaligned for `T`.
    pub(crate) fn slice<T: Copy>(&self, offset: usize, count: usize) -> &[T] {
        self.check::<T>(offset, count);
        let start = self.base.as_ptr().wrapping_add(offset);
        assert!(
            start as usize % align_of::<T>() == 0,
            "misaligned slice at offset {offset}"
        );
        // SAFETY: in bounds, aligned, initialised, and borrowed for the
        // lifetime of `&self`, so no write can alias the returned slice.
        unsafe { std::slice::from_raw_parts(start.cast::<T>(), count) }
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            self.allocator.release(block);
        }
    }
}

impl fmt::Debug for RawBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("base", &format_args!("{:#x}", self.base.as_ptr() as usize))
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> Arc<dyn RawAllocator> {
        Arc::new(SystemAllocator)
    }

    #[test]
    fn system_allocator_returns_zeroed_aligned_memory() {
        let layout = Layout::from_size_align(4096, 1024).unwrap();
        let buf = RawBuffer::allocate(&system(), layout).unwrap();
        assert_eq!(buf.addr() % 1024, 0);
        assert_eq!(buf.len(), 4096);
        assert!(buf.slice::<u64>(0, 512).iter().all(|&w| w == 0));
    }

    #[test]
    fn buffer_moves_across_threads() {
        let layout = Layout::from_size_align(64, 8).unwrap();
        let mut buf = RawBuffer::allocate(&system(), layout).unwrap();
        buf.write::<u32>(0, 7);
        let buf = std::thread::spawn(move || {
            assert_eq!(buf.read::<u32>(0), 7);
            buf
        })
        .join()
        .unwrap();
        assert_eq!(buf.len(), 64);
    }

    #[test]
    fn zero_sized_layout_is_refused() {
        let layout = Layout::from_size_align(0, 8).unwrap();
        assert!(SystemAllocator.allocate(layout).is_none());
    }

    #[test]
    fn unaligned_write_read_roundtrip() {
        let layout = Layout::from_size_align(64, 8).unwrap();
        let mut buf = RawBuffer::allocate(&system(), layout).unwrap();
        buf.write::<u64>(3, 0x1122_3344_5566_7788);
        assert_eq!(buf.read::<u64>(3), 0x1122_3344_5566_7788);
        assert_eq!(buf.read::<u8>(2), 0);
    }

    #[test]
    #[should_panic(expected = "exceeds buffer")]
    fn write_past_end_panics() {
        let layout = Layout::from_size_align(16, 8).unwrap();
        let mut buf = RawBuffer::allocate(&system(), layout).unwrap();
        buf.write::<u64>(12, 1);
    }

    #[test]
    #[should_panic(expected = "exceeds buffer")]
    fn oversized_slice_panics() {
        let layout = Layout::from_size_align(16, 8).unwrap();
        let buf = RawBuffer::allocate(&system(), layout).unwrap();
        let _ = buf.slice::<u64>(0, 3);
    }
}
