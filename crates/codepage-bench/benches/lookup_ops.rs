//! Criterion micro-benchmarks for PC-to-source lookup.

use std::hint::black_box;

use codepage_bench::{lookup_profile, reference_allocator};
use criterion::{criterion_group, criterion_main, Criterion};

/// Benchmark: floor search within a single full page.
fn bench_single_page_lookup(c: &mut Criterion) {
    let allocator = reference_allocator().unwrap();
    let (list, probes) = lookup_profile(&allocator, 1, 1024).unwrap();
    let page = list.head().unwrap();
    c.bench_function("lookup_single_page_1k", |b| {
        b.iter(|| {
            for &address in &probes {
                black_box(page.map_pc_to_offset(address));
            }
        });
    });
}

/// Benchmark: route + floor search across a 16-page list.
fn bench_list_lookup(c: &mut Criterion) {
    let allocator = reference_allocator().unwrap();
    let (list, probes) = lookup_profile(&allocator, 16, 1024).unwrap();
    c.bench_function("lookup_list_16_pages_1k", |b| {
        b.iter(|| {
            for &address in &probes {
                black_box(list.map_pc_to_offset(address));
            }
        });
    });
}

criterion_group!(benches, bench_single_page_lookup, bench_list_lookup);
criterion_main!(benches);
