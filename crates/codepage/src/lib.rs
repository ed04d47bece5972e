//! Codepage: code-page memory management for threaded-code interpreters.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the codepage sub-crates. For most users, adding `codepage` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use codepage::prelude::*;
//!
//! let allocator = CodePageAllocator::new(PageConfig::default()).unwrap();
//! let mut pages = PageList::new();
//!
//! let mut page = allocator.create(4).unwrap();
//! let module = ModuleRef(0);
//!
//! // Map the instruction before emitting its words.
//! page.emit_mapping_entry(module, 0x20).unwrap();
//! page.emit_word(0xa).unwrap();
//! let operand = page.current_address();
//! page.emit_word32(7).unwrap();
//! pages.push(page);
//!
//! // Any address inside the instruction resolves to its source offset.
//! assert_eq!(
//!     pages.map_pc_to_offset(operand),
//!     Some(SourceLocation::new(module, 0x20))
//! );
//! assert_eq!(pages.destroy(), 1);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `codepage-arena` | Pages, mapping tables, lists, pools, raw allocation |
//! | [`types`] | `codepage-core` | IDs, source locations, code words, errors |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Page allocation, emission, and lookup (`codepage-arena`).
///
/// Most users only need [`arena::CodePageAllocator`], [`arena::CodePage`],
/// and [`arena::PageList`]; they are also available in the [`prelude`].
pub use codepage_arena as arena;

/// Core types and IDs (`codepage-core`).
///
/// Contains page sequence numbers, module references, source locations,
/// and the [`types::PageError`] type shared by every operation.
pub use codepage_core as types;

/// Common imports for typical codepage usage.
///
/// ```rust
/// use codepage::prelude::*;
/// ```
pub mod prelude {
    // Allocation and pages
    pub use codepage_arena::{
        CodePage, CodePageAllocator, CodePagePool, DispatchAddress, PageConfig, PageList,
    };

    // Core types
    pub use codepage_core::{CodeWord, ModuleRef, PageSequence, SourceLocation};

    // Errors
    pub use codepage_core::PageError;
}
