//! Native code-word width.
//!
//! A code word is the storage unit of a code page. Its width always
//! equals the target's pointer width, because the interpreter walks
//! pages one pointer-sized slot at a time and stores handler addresses
//! in them directly.

use std::mem::size_of;

/// One code-page slot.
pub type CodeWord = usize;

/// Width of a [`CodeWord`] in bytes.
pub const WORD_BYTES: usize = size_of::<CodeWord>();

/// Number of slots a 64-bit immediate occupies.
///
/// 2 on 32-bit targets, 1 on 64-bit targets.
pub const WORD64_SLOTS: u32 = if WORD_BYTES >= size_of::<u64>() { 1 } else { 2 };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_matches_pointer_width() {
        assert_eq!(WORD_BYTES, size_of::<*const u8>());
    }

    #[test]
    fn word64_slots_cover_eight_bytes() {
        assert!(WORD64_SLOTS as usize * WORD_BYTES >= 8);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(WORD64_SLOTS, 1);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(WORD64_SLOTS, 2);
    }
}
