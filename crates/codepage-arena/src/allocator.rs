//! Code page creation.

use std::alloc::Layout;
use std::sync::Arc;

use codepage_core::{AllocRegion, PageError, SequenceGenerator};
use log::{debug, warn};

use crate::config::PageConfig;
use crate::mapping::MappingPage;
use crate::page::CodePage;
use crate::raw::{RawAllocator, RawBuffer, SystemAllocator};

/// Creates [`CodePage`]s of aligned size with sequential ids.
///
/// Each page is two allocations from the same [`RawAllocator`]: the code
/// buffer and its mapping table. If the mapping table cannot be allocated
/// the code buffer is released again before the error is returned, so a
/// failed `create` never leaks.
pub struct CodePageAllocator {
    config: PageConfig,
    raw: Arc<dyn RawAllocator>,
    sequence: Arc<SequenceGenerator>,
}

impl CodePageAllocator {
    /// Allocator backed by [`SystemAllocator`].
    pub fn new(config: PageConfig) -> Result<Self, PageError> {
        Self::with_allocator(config, Arc::new(SystemAllocator))
    }

    /// Allocator backed by a caller-supplied raw allocator.
    ///
    /// Fails with [`PageError::InvalidConfig`] if `config` does not
    /// validate.
    pub fn with_allocator(
        config: PageConfig,
        raw: Arc<dyn RawAllocator>,
    ) -> Result<Self, PageError> {
        config.validate()?;
        Ok(Self {
            config,
            raw,
            sequence: Arc::new(SequenceGenerator::new()),
        })
    }

    /// Draw sequence ids from a shared generator instead of a private one.
    pub fn with_sequence(mut self, sequence: Arc<SequenceGenerator>) -> Self {
        self.sequence = sequence;
        self
    }

    /// The validated configuration.
    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// The generator page ids are drawn from.
    pub fn sequence(&self) -> &Arc<SequenceGenerator> {
        &self.sequence
    }

    /// Allocate a page with room for at least `min_words` code words.
    ///
    /// The buffer is rounded up to a multiple of
    /// [`PageConfig::align_bytes`] and the capacity is recomputed from the
    /// rounded size, so it is usually larger than requested. The mapping
    /// table gets the same capacity.
    ///
    /// The sequence id is drawn only after both allocations have
    /// succeeded, so a failed `create` leaves the generator untouched.
    ///
    /// # Errors
    ///
    /// - [`PageError::SizeOverflow`] if the size is not representable.
    /// - [`PageError::OutOfMemory`] if either allocation fails.
    pub fn create(&self, min_words: u32) -> Result<CodePage, PageError> {
        let overflow = PageError::SizeOverflow { min_words };
        let bytes = self.config.page_bytes(min_words).ok_or(overflow.clone())?;
        let capacity =
            u32::try_from(self.config.capacity_for(bytes)).map_err(|_| overflow.clone())?;
        let layout = Layout::from_size_align(bytes, self.config.align_bytes).map_err(|_| overflow)?;

        let buffer = RawBuffer::allocate(&self.raw, layout).ok_or(PageError::OutOfMemory {
            bytes,
            region: AllocRegion::CodeBuffer,
        })?;

        // On failure `buffer` is dropped here, returning it to the allocator.
        let mapping = MappingPage::with_capacity(capacity, &self.raw).inspect_err(|err| {
            warn!("new page rolled back: {err}");
        })?;

        let sequence = self.sequence.next();
        let page = CodePage::init(buffer, mapping, sequence, capacity);
        debug!(
            "new page: {}; seq: {}; bytes: {}; slots: {}",
            page.start_address(),
            sequence,
            bytes,
            capacity
        );
        Ok(page)
    }
}

impl std::fmt::Debug for CodePageAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodePageAllocator")
            .field("config", &self.config)
            .field("last_sequence", &self.sequence.last())
            .finish()
    }
}
