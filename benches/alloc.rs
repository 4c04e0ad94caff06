//! Allocator and collector benchmarks.
//!
//! Measures the hot paths in isolation:
//!
//! 1. **Allocation**: free-list search and split, including chunk
//!    growth amortized over many blocks
//! 2. **Collection**: full mark/sweep cycles over heaps with varying
//!    live ratios

use cinder_gc::{AddressRange, Collector, GcConfig, GcHeap, RootSet};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn bench_config() -> GcConfig {
    GcConfig {
        chunk_size: 64 * 1024,
        max_heap_size: 0,
        verify_heap: false,
    }
}

/// Fill a heap with `count` blocks of `size` bytes, returning the
/// payload pointers.
fn fill(heap: &mut GcHeap, count: usize, size: usize) -> Vec<*mut u8> {
    (0..count)
        .map(|_| heap.allocate(size).expect("allocate").as_ptr())
        .collect()
}

fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation");

    for size in [16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("alloc", size), &size, |b, &size| {
            b.iter_batched(
                || GcHeap::new(bench_config()),
                |mut heap| {
                    for _ in 0..128 {
                        black_box(heap.allocate(size));
                    }
                    heap
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.bench_function("alloc_after_collect_reuses", |b| {
        b.iter_batched(
            || {
                let mut heap = GcHeap::new(bench_config());
                let mut collector = Collector::new();
                fill(&mut heap, 256, 32);
                // Everything dies; the free list ends up fully merged.
                unsafe { collector.collect(&mut heap, &RootSet::new()) };
                heap
            },
            |mut heap| {
                for _ in 0..128 {
                    black_box(heap.allocate(32));
                }
                heap
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection");

    // All blocks dead: sweep-dominated.
    group.bench_function("collect_all_dead_256", |b| {
        b.iter_batched(
            || {
                let mut heap = GcHeap::new(bench_config());
                fill(&mut heap, 256, 32);
                heap
            },
            |mut heap| {
                let mut collector = Collector::new();
                unsafe { collector.collect(&mut heap, &RootSet::new()) };
                heap
            },
            criterion::BatchSize::SmallInput,
        );
    });

    // All blocks rooted: mark-dominated, nothing reclaimed.
    group.bench_function("collect_all_live_256", |b| {
        b.iter_batched(
            || {
                let mut heap = GcHeap::new(bench_config());
                let ptrs = fill(&mut heap, 256, 32);
                let stack: Vec<usize> = ptrs.iter().map(|&p| p as usize).collect();
                (heap, stack)
            },
            |(mut heap, stack)| {
                let mut collector = Collector::new();
                let mut roots = RootSet::new();
                roots.set_stack(AddressRange::of_slice(&stack));
                unsafe { collector.collect(&mut heap, &roots) };
                (heap, stack)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_allocation, bench_collection);
criterion_main!(benches);
