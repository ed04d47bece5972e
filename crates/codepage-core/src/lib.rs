//! Core types for code-page management.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the allocator, the emitter, and the
//! interpreter: page sequence ids, module references, the native
//! code-word width, source locations, and the [`PageError`] enum.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod location;
pub mod word;

pub use error::{AllocRegion, PageError};
pub use id::{ModuleRef, PageSequence, SequenceGenerator};
pub use location::SourceLocation;
pub use word::{CodeWord, WORD64_SLOTS, WORD_BYTES};
