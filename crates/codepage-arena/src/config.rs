//! Page allocation parameters.

use codepage_core::{PageError, WORD_BYTES};

use crate::page::HEADER_BYTES;

/// Configuration for the code-page allocator.
///
/// Controls how page sizes are rounded and when the pool retires a page.
/// Checked by [`validate`](PageConfig::validate) when an allocator is
/// built; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageConfig {
    /// Every page allocation (header plus code words) is rounded up to a
    /// multiple of this many bytes, and the buffer is aligned to it.
    ///
    /// Default: 32 KiB. Must be a power of two and large enough for the
    /// page header plus one code word.
    pub align_bytes: usize,

    /// A released page with fewer free slots than this goes to the pool's
    /// full list instead of its open list. New pool pages are never
    /// smaller than this.
    ///
    /// Default: 64.
    pub free_slots_threshold: u32,
}

impl PageConfig {
    /// Default alignment: 32 KiB.
    pub const DEFAULT_ALIGN_BYTES: usize = 32 * 1024;

    /// Default free-slot threshold for pool routing.
    pub const DEFAULT_FREE_SLOTS_THRESHOLD: u32 = 64;

    /// Create a config with the given alignment and default threshold.
    pub fn new(align_bytes: usize) -> Self {
        Self {
            align_bytes,
            free_slots_threshold: Self::DEFAULT_FREE_SLOTS_THRESHOLD,
        }
    }

    /// Reject alignments the allocator cannot honour.
    pub fn validate(&self) -> Result<(), PageError> {
        if !self.align_bytes.is_power_of_two() {
            return Err(PageError::InvalidConfig {
                reason: format!("align_bytes {} is not a power of two", self.align_bytes),
            });
        }
        let minimum = HEADER_BYTES + WORD_BYTES;
        if self.align_bytes < minimum {
            return Err(PageError::InvalidConfig {
                reason: format!(
                    "align_bytes {} is smaller than header plus one word ({minimum})",
                    self.align_bytes
                ),
            });
        }
        Ok(())
    }

    /// Total buffer size for a page holding at least `min_words` words.
    ///
    /// The smallest multiple of `align_bytes` that is at least
    /// `HEADER_BYTES + min_words * WORD_BYTES`. `None` on overflow or when
    /// `align_bytes` is not a power of two.
    pub fn page_bytes(&self, min_words: u32) -> Option<usize> {
        if !self.align_bytes.is_power_of_two() {
            return None;
        }
        let wanted = (min_words as usize)
            .checked_mul(WORD_BYTES)?
            .checked_add(HEADER_BYTES)?;
        let mask = self.align_bytes - 1;
        Some(wanted.checked_add(mask)? & !mask)
    }

    /// Number of code words that fit in a buffer of `page_bytes` bytes.
    pub fn capacity_for(&self, page_bytes: usize) -> usize {
        page_bytes.saturating_sub(HEADER_BYTES) / WORD_BYTES
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ALIGN_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alignment_is_32k() {
        let config = PageConfig::default();
        assert_eq!(config.align_bytes, 32 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_power_of_two() {
        let config = PageConfig::new(3000);
        assert!(matches!(
            config.validate(),
            Err(PageError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_alignment_below_header() {
        let config = PageConfig::new(HEADER_BYTES);
        assert!(matches!(
            config.validate(),
            Err(PageError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn page_bytes_rounds_up() {
        let config = PageConfig::new(256);
        assert_eq!(config.page_bytes(0), Some(256));
        assert_eq!(config.page_bytes(1), Some(256));
        let exact = (256 - HEADER_BYTES) / WORD_BYTES;
        assert_eq!(config.page_bytes(exact as u32), Some(256));
        assert_eq!(config.page_bytes(exact as u32 + 1), Some(512));
    }

    #[test]
    fn page_bytes_refuses_unvalidated_alignment() {
        assert_eq!(PageConfig::new(0).page_bytes(1), None);
        assert_eq!(PageConfig::new(3000).page_bytes(1), None);
    }

    #[test]
    fn capacity_recomputed_from_rounded_size() {
        let config = PageConfig::new(256);
        let bytes = config.page_bytes(4).unwrap();
        assert_eq!(config.capacity_for(bytes), (256 - HEADER_BYTES) / WORD_BYTES);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn rounded_size_is_aligned_and_large_enough(
                shift in 5u32..17,
                min_words in 0u32..100_000,
            ) {
                let config = PageConfig::new(1usize << shift);
                let bytes = config.page_bytes(min_words).unwrap();
                prop_assert_eq!(bytes % config.align_bytes, 0);
                prop_assert!(bytes >= HEADER_BYTES + min_words as usize * WORD_BYTES);
                prop_assert!(bytes < HEADER_BYTES + min_words as usize * WORD_BYTES + config.align_bytes);
                prop_assert!(config.capacity_for(bytes) >= min_words as usize);
            }
        }
    }
}
