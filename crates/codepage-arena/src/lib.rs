//! Alignment-aware code-page allocation with PC-to-source mapping.
//!
//! Provides the buffers a threaded-code interpreter executes from, and the
//! index that turns a faulting PC back into a module offset. This crate is
//! the only one in the workspace that contains `unsafe` code, and all of it
//! lives in the `raw` module.
//!
//! # Architecture
//!
//! ```text
//! CodePagePool (open list + full list, acquire/release)
//! ├── CodePageAllocator (PageConfig, RawAllocator, SequenceGenerator)
//! └── PageList × 2 → CodePage[] (head = newest)
//!     ├── RawBuffer: PageHeader + code-word slots (aligned, bump cursor)
//!     └── MappingPage: sorted (DispatchAddress, SourceLocation) entries
//! ```
//!
//! # Emission
//!
//! The emitter appends words at a page's cursor and records a mapping
//! entry at each instruction boundary. All emits are bounds checked; a
//! full page yields [`PageError::CapacityExceeded`](codepage_core::PageError)
//! rather than a write past the end.
//!
//! # Lookup
//!
//! An address is routed to its page with [`CodePage::contains`] (written
//! range only) and resolved with a floor search over that page's mapping
//! entries: an operand word resolves to the instruction before it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod address;
pub mod allocator;
pub mod config;
pub mod list;
pub mod mapping;
pub mod page;
pub mod pool;
mod raw;

// Public re-exports for the primary API surface.
pub use address::DispatchAddress;
pub use allocator::CodePageAllocator;
pub use config::PageConfig;
pub use list::PageList;
pub use mapping::{MappingEntry, MappingPage};
pub use page::{CodePage, PageHeader, HEADER_BYTES};
pub use pool::{CodePagePool, PoolStats};
pub use raw::{RawAllocator, RawBlock, SystemAllocator};
