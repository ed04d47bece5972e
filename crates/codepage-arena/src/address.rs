//! Dispatch addresses.
//!
//! A [`DispatchAddress`] is the raw address of a code-word slot. Pages hand
//! them out for the interpreter to jump to and for mapping entries to be
//! keyed on; everything else in the crate stays in slot indices.

use std::fmt;

use codepage_core::{CodeWord, WORD_BYTES};

/// Address of a code-word slot inside a code page.
///
/// Ordering and arithmetic are on the numeric address. Only addresses
/// obtained from a live [`CodePage`](crate::CodePage) are meaningful to
/// dereference; derived addresses (via [`add_slots`](Self::add_slots) and
/// friends) are for comparisons and lookups.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DispatchAddress(usize);

impl DispatchAddress {
    pub(crate) fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// The numeric address.
    pub fn addr(self) -> usize {
        self.0
    }

    /// Pointer form for the interpreter's dispatch step.
    ///
    /// Dereferencing is only valid while the owning page is alive and the
    /// slot lies below the page's cursor.
    pub fn as_ptr(self) -> *const CodeWord {
        std::ptr::with_exposed_provenance(self.0)
    }

    /// The address `slots` code words further on.
    pub fn add_slots(self, slots: usize) -> Self {
        Self(self.0.wrapping_add(slots.wrapping_mul(WORD_BYTES)))
    }

    /// The address `bytes` bytes earlier.
    pub fn wrapping_sub_bytes(self, bytes: usize) -> Self {
        Self(self.0.wrapping_sub(bytes))
    }

    /// Whole slots between `earlier` and `self`, or `None` if `earlier`
    /// is above `self`.
    pub fn slots_since(self, earlier: DispatchAddress) -> Option<usize> {
        self.0.checked_sub(earlier.0).map(|bytes| bytes / WORD_BYTES)
    }
}

impl fmt::Debug for DispatchAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DispatchAddress({:#x})", self.0)
    }
}

impl fmt::Display for DispatchAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
