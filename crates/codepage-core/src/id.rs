//! Strongly-typed identifiers and the page sequence generator.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Diagnostic identifier of a code page.
///
/// Assigned once at page creation from a [`SequenceGenerator`]. Used for
/// log correlation and ordering only; nothing depends on it for
/// correctness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageSequence(pub u64);

impl fmt::Display for PageSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PageSequence {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Monotonic source of [`PageSequence`] values.
///
/// Backed by an atomic counter so that several compilers sharing one
/// generator never observe duplicate ids. The first id handed out is 1.
///
/// Each allocator owns a generator by default. Share one through an `Arc`
/// when ids must be unique across several allocators.
#[derive(Debug)]
pub struct SequenceGenerator {
    last: AtomicU64,
}

impl SequenceGenerator {
    /// Create a generator whose first id is 1.
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Allocate the next id. Thread-safe.
    pub fn next(&self) -> PageSequence {
        PageSequence(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// The most recently allocated id, or 0 if none was allocated yet.
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning reference to a compiled module.
///
/// The module itself is owned by the embedding runtime; a `ModuleRef` only
/// names it so that mapping entries can attribute emitted code to a source
/// module. Nothing in this workspace manages the module's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleRef(pub u32);

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

impl From<u32> for ModuleRef {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
