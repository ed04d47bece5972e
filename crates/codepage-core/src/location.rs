//! Source attribution for emitted code.

use std::fmt;

use crate::id::ModuleRef;

/// Where a piece of emitted code came from.
///
/// Produced by PC lookups: the module that was being compiled and the
/// byte offset into that module's encoded body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// The originating module.
    pub module: ModuleRef,
    /// Byte offset within the module.
    pub offset: u64,
}

impl SourceLocation {
    /// Create a new location.
    pub fn new(module: ModuleRef, offset: u64) -> Self {
        Self { module, offset }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:#x}", self.module, self.offset)
    }
}
