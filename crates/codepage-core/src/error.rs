//! Error types for code-page management.
//!
//! Two classes share one enum: resource exhaustion
//! ([`PageError::OutOfMemory`]), which callers are expected to recover
//! from, and precondition violations (everything else), which indicate a
//! bug in the emitter. Precondition checks are always on; they never
//! degrade into unchecked writes in release builds.
//!
//! A PC lookup that finds no mapping is not an error and is reported
//! as `None` by the lookup functions.

use std::error::Error;
use std::fmt;

/// Which allocation of a code page failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocRegion {
    /// The page buffer holding the header and code words.
    CodeBuffer,
    /// The mapping table that indexes PCs back to module offsets.
    MappingTable,
}

impl fmt::Display for AllocRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodeBuffer => write!(f, "code buffer"),
            Self::MappingTable => write!(f, "mapping table"),
        }
    }
}

/// Errors from page allocation and emission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageError {
    /// The raw allocator could not provide a block. No partially
    /// constructed page is left behind.
    OutOfMemory {
        /// Size of the failed request in bytes.
        bytes: usize,
        /// Which allocation failed.
        region: AllocRegion,
    },
    /// The requested word count cannot be expressed as a page size.
    SizeOverflow {
        /// The requested minimum number of words.
        min_words: u32,
    },
    /// An emission needed more slots than the page has left.
    CapacityExceeded {
        /// Slots the emission needed.
        requested: u32,
        /// Slots still free on the page.
        available: u32,
    },
    /// The page's mapping table has no room for another entry.
    MappingFull {
        /// Entry capacity of the mapping table.
        capacity: u32,
    },
    /// A mapping entry was recorded at an address below the previous one.
    MappingOutOfOrder {
        /// Address of the last recorded entry.
        last: usize,
        /// Address of the rejected entry.
        address: usize,
    },
    /// A page configuration value was rejected.
    InvalidConfig {
        /// Why the configuration is invalid.
        reason: String,
    },
}

impl PageError {
    /// Whether the error reports resource exhaustion rather than a
    /// precondition violation.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { bytes, region } => {
                write!(f, "out of memory allocating {bytes} bytes for {region}")
            }
            Self::SizeOverflow { min_words } => {
                write!(f, "page size overflows for {min_words} words")
            }
            Self::CapacityExceeded {
                requested,
                available,
            } => {
                write!(
                    f,
                    "page capacity exceeded: requested {requested} slots, {available} free"
                )
            }
            Self::MappingFull { capacity } => {
                write!(f, "mapping table full at {capacity} entries")
            }
            Self::MappingOutOfOrder { last, address } => {
                write!(
                    f,
                    "mapping entry at {address:#x} precedes last entry at {last:#x}"
                )
            }
            Self::InvalidConfig { reason } => write!(f, "invalid page config: {reason}"),
        }
    }
}

impl Error for PageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_is_distinguishable() {
        let oom = PageError::OutOfMemory {
            bytes: 4096,
            region: AllocRegion::MappingTable,
        };
        assert!(oom.is_out_of_memory());
        assert!(!PageError::MappingFull { capacity: 4 }.is_out_of_memory());
        assert_eq!(
            oom.to_string(),
            "out of memory allocating 4096 bytes for mapping table"
        );
    }

    #[test]
    fn capacity_message_names_both_counts() {
        let err = PageError::CapacityExceeded {
            requested: 2,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "page capacity exceeded: requested 2 slots, 1 free"
        );
    }
}
