//! Benchmark profiles for code-page allocation and lookup.
//!
//! Provides pre-built workloads shared by the Criterion benches:
//!
//! - [`reference_config`]: default 32 KiB pages
//! - [`emit_profile`]: fill a page with a mapped instruction stream
//! - [`lookup_profile`]: a multi-page list plus the probe addresses to resolve

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use codepage_arena::{CodePage, CodePageAllocator, DispatchAddress, PageConfig, PageList};
use codepage_core::{ModuleRef, PageError};

/// Operand words per instruction in the reference stream.
pub const REFERENCE_OPERANDS: u32 = 2;

/// Default-sized pages (32 KiB alignment).
pub fn reference_config() -> PageConfig {
    PageConfig::default()
}

/// Fill `page` with as many `1 + REFERENCE_OPERANDS`-slot instructions as
/// fit, mapping each one. Returns the number of instructions emitted.
pub fn emit_profile(page: &mut CodePage, module: ModuleRef) -> Result<u32, PageError> {
    let stride = 1 + REFERENCE_OPERANDS;
    let count = page.free_slots() / stride;
    for i in 0..count {
        page.emit_mapping_entry(module, u64::from(i) * 4)?;
        page.emit_word(0x4000 + i as usize)?;
        for operand in 0..REFERENCE_OPERANDS {
            page.emit_word32(operand)?;
        }
    }
    Ok(count)
}

/// `pages` filled pages plus `probes` addresses spread evenly across the
/// written code of every page, operand words included.
pub fn lookup_profile(
    allocator: &CodePageAllocator,
    pages: u32,
    probes: usize,
) -> Result<(PageList, Vec<DispatchAddress>), PageError> {
    let mut list = PageList::new();
    for n in 0..pages {
        let mut page = allocator.create(1)?;
        emit_profile(&mut page, ModuleRef(n))?;
        list.push(page);
    }

    let spots: Vec<(DispatchAddress, usize)> = list
        .iter()
        .map(|page| (page.start_address(), page.used_slots() as usize))
        .collect();
    if spots.is_empty() {
        return Ok((list, Vec::new()));
    }
    let addresses = (0..probes)
        .map(|i| {
            let (start, used) = spots[i % spots.len()];
            start.add_slots((i * 7919) % used.max(1))
        })
        .collect();
    Ok((list, addresses))
}

/// Allocator for the reference profile.
pub fn reference_allocator() -> Result<CodePageAllocator, PageError> {
    CodePageAllocator::new(reference_config())
}
