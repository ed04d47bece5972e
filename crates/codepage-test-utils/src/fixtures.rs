//! Emission fixtures.
//!
//! Lay down instruction streams shaped like real compiler output: one
//! mapping entry per instruction, an opcode word, then operand words.

use codepage_arena::{CodePage, CodePageAllocator, DispatchAddress, PageConfig, PageList};
use codepage_core::{CodeWord, ModuleRef, PageError};

/// Byte distance between consecutive instructions in the source module.
pub const SOURCE_STRIDE: u64 = 4;

/// Fake handler address used as the opcode word of instruction `index`.
pub fn opcode(index: u32) -> CodeWord {
    0x1000 + index as CodeWord
}

/// Allocator with 256-byte pages, small enough to fill quickly.
pub fn small_allocator() -> CodePageAllocator {
    CodePageAllocator::new(PageConfig::new(256)).unwrap()
}

/// Slots one fixture instruction takes.
pub fn instruction_slots(operands: u32) -> u32 {
    1 + operands
}

/// Emit `count` instructions of `operands` operand words each.
///
/// Instruction `i` is mapped to `module` at offset `i * SOURCE_STRIDE`.
/// Returns the address of each instruction's opcode word.
pub fn emit_instructions(
    page: &mut CodePage,
    module: ModuleRef,
    count: u32,
    operands: u32,
) -> Result<Vec<DispatchAddress>, PageError> {
    let mut starts = Vec::with_capacity(count as usize);
    for i in 0..count {
        starts.push(page.current_address());
        page.emit_mapping_entry(module, u64::from(i) * SOURCE_STRIDE)?;
        page.emit_word(opcode(i))?;
        for operand in 0..operands {
            page.emit_word32(operand)?;
        }
    }
    Ok(starts)
}

/// Fill a list of `pages` pages, each as full as the fixture stream allows.
///
/// Page `n` (0-based, in creation order) is attributed to `ModuleRef(n)`.
pub fn filled_list(
    allocator: &CodePageAllocator,
    pages: u32,
    operands: u32,
) -> Result<PageList, PageError> {
    let mut list = PageList::new();
    for n in 0..pages {
        let mut page = allocator.create(1)?;
        let count = page.free_slots() / instruction_slots(operands);
        emit_instructions(&mut page, ModuleRef(n), count, operands)?;
        list.push(page);
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_are_mapped_at_their_opcode() {
        let mut page = small_allocator().create(16).unwrap();
        let starts = emit_instructions(&mut page, ModuleRef(3), 4, 2).unwrap();
        assert_eq!(starts.len(), 4);
        assert_eq!(page.cursor(), 12);
        assert_eq!(page.mapping().len(), 4);
        for (i, start) in starts.iter().enumerate() {
            let loc = page.map_pc_to_offset(*start).unwrap();
            assert_eq!(loc.offset, i as u64 * SOURCE_STRIDE);
        }
    }

    #[test]
    fn filled_list_attributes_pages_in_creation_order() {
        let list = filled_list(&small_allocator(), 3, 1).unwrap();
        assert_eq!(list.count(), 3);
        let tail = list.end().unwrap();
        let loc = tail.map_pc_to_offset(tail.start_address()).unwrap();
        assert_eq!(loc.module, ModuleRef(0));
    }
}
