//! Heap memory management.
//!
//! The heap is a pair of circular block lists over a pool of
//! OS-acquired chunks:
//! - Free list: address-ordered, coalesced, searched first-fit
//! - Used list: every live block, in allocation order
//!
//! `GcHeap` is the owning context object: all allocator and collector
//! state lives here, so a process can run any number of independent
//! heaps. Construction is initialization; `Drop` is teardown.

mod block;
mod chunks;
mod free_list;
mod used_list;

pub use block::{BlockHeader, UNIT};
pub(crate) use chunks::ChunkPool;
pub(crate) use free_list::FreeList;
pub(crate) use used_list::UsedList;

use crate::config::GcConfig;
use crate::stats::GcStats;
use std::ptr::NonNull;

/// The allocator/collector context: free list, used list, chunk pool,
/// configuration, and statistics.
///
/// All operations take `&mut self`: the design is single-threaded and
/// stop-the-world, and exclusive receivers are what enforce "never call
/// back into the allocator from the middle of another call". Embedders
/// on multi-threaded hosts must serialize access externally.
pub struct GcHeap {
    config: GcConfig,
    free: FreeList,
    used: UsedList,
    pool: ChunkPool,
    stats: GcStats,
}

impl GcHeap {
    /// Create a heap with the given configuration.
    pub fn new(config: GcConfig) -> Self {
        config.validate().expect("invalid GC configuration");

        let pool = ChunkPool::new(config.chunk_size, config.max_heap_size);
        Self {
            config,
            free: FreeList::new(),
            used: UsedList::new(),
            pool,
            stats: GcStats::new(),
        }
    }

    /// Create a heap with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(GcConfig::default())
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocate at least `size_bytes` of payload, registered as a used
    /// block. Returns `None` only when the Memory Source cannot supply
    /// more memory.
    ///
    /// The byte count is converted to whole units plus one for the
    /// header. The free list is searched from its roving cursor; a
    /// fruitless full circuit grows the pool and retries. Allocation
    /// never triggers collection.
    ///
    /// The returned memory is zeroed on first use of a chunk but may
    /// contain stale bytes when a reclaimed block is reused.
    pub fn allocate(&mut self, size_bytes: usize) -> Option<NonNull<u8>> {
        let units = BlockHeader::units_for(size_bytes);

        // SAFETY: both lists and the pool are owned here and well
        // formed; blocks move between them atomically with respect to
        // this call.
        let block = loop {
            if let Some(block) = unsafe { self.free.alloc(units) } {
                break block;
            }
            let fresh = self.pool.grow(units)?;
            unsafe { self.free.insert(fresh) };
        };

        unsafe { self.used.push(block) };
        self.stats.record_allocation(size_bytes);

        // SAFETY: payload_start points one unit into a block of at
        // least two units (units_for adds the header unit).
        NonNull::new(unsafe { (*block).payload_start() } as *mut u8)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `ptr` falls inside memory this heap acquired from the
    /// OS. True for payloads, headers, and free space alike.
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.pool.owns(ptr as usize)
    }

    /// Number of live (allocated) blocks.
    pub fn used_blocks(&self) -> usize {
        self.used.len()
    }

    /// Units currently on the free list.
    pub fn free_units(&self) -> usize {
        self.free.total_units()
    }

    /// Total bytes acquired from the OS so far.
    pub fn heap_size(&self) -> usize {
        self.pool.acquired_bytes()
    }

    /// The configuration.
    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    /// Allocator/collector statistics.
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    // =========================================================================
    // Collector plumbing
    // =========================================================================

    pub(crate) fn used_list(&self) -> &UsedList {
        &self.used
    }

    pub(crate) fn lists_mut(&mut self) -> (&mut FreeList, &mut UsedList) {
        (&mut self.free, &mut self.used)
    }

    // =========================================================================
    // Integrity checking
    // =========================================================================

    /// Walk both lists and panic on any broken invariant: free-list
    /// ordering with a single wraparound, no adjacent unmerged free
    /// blocks, every block inside pool memory, and no stray mark flags.
    ///
    /// Run automatically after collection when
    /// [`GcConfig::verify_heap`] is set; cheap heaps can also call it
    /// directly from tests.
    pub fn verify(&self) {
        let sentinel = self.free.sentinel();
        let mut prev_addr = sentinel;
        let mut prev_end = 0;
        let mut descents = 0;
        let mut first = true;

        self.free.for_each(|addr, units| {
            assert!(units > 0, "free block with zero size at {addr:#x}");
            assert!(
                self.pool.owns(addr),
                "free block at {addr:#x} outside pool memory"
            );
            if addr < prev_addr {
                descents += 1;
            }
            if !first && prev_addr != sentinel {
                assert_ne!(
                    prev_end, addr,
                    "adjacent unmerged free blocks at {prev_end:#x}"
                );
            }
            prev_addr = addr;
            prev_end = addr + units * UNIT;
            first = false;
        });
        // Address order is strict except at one wraparound boundary;
        // the walk starts at the sentinel, which may itself sit above
        // or below the chunks.
        assert!(
            descents <= 1,
            "free list not address-ordered ({descents} descents)"
        );

        self.used.for_each(|p| {
            // SAFETY: for_each only yields live list nodes.
            unsafe {
                assert!(
                    !(*p).is_marked(),
                    "mark flag escaped a collection cycle at {p:p}"
                );
                assert!((*p).size() > 0, "used block with zero size at {p:p}");
            }
            assert!(
                self.pool.owns(p as usize),
                "used block at {p:p} outside pool memory"
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GcConfig {
        GcConfig {
            chunk_size: 64 * UNIT,
            max_heap_size: 0,
            verify_heap: true,
        }
    }

    #[test]
    fn test_heap_creation() {
        let heap = GcHeap::new(test_config());
        assert_eq!(heap.used_blocks(), 0);
        assert_eq!(heap.free_units(), 0);
        heap.verify();
    }

    #[test]
    fn test_allocate_registers_used_block() {
        let mut heap = GcHeap::new(test_config());

        let ptr = heap.allocate(24).expect("allocate");
        assert_eq!(heap.used_blocks(), 1);
        assert!(heap.owns(ptr.as_ptr()));
        heap.verify();
    }

    #[test]
    fn test_allocate_is_writable_for_requested_size() {
        let mut heap = GcHeap::new(test_config());

        let ptr = heap.allocate(40).expect("allocate").as_ptr();
        // 40 bytes requested; the block actually reserves whole units.
        for i in 0..40 {
            unsafe { ptr.add(i).write(0xAB) };
        }
        for i in 0..40 {
            assert_eq!(unsafe { ptr.add(i).read() }, 0xAB);
        }
    }

    #[test]
    fn test_allocations_do_not_overlap() {
        let mut heap = GcHeap::new(test_config());

        let mut ranges = Vec::new();
        for size in [8usize, 16, 24, 48, 16, 8, 64] {
            let start = heap.allocate(size).expect("allocate").as_ptr() as usize;
            ranges.push((start, start + size));
        }

        for (i, &(a_start, a_end)) in ranges.iter().enumerate() {
            for &(b_start, b_end) in &ranges[i + 1..] {
                assert!(
                    a_end <= b_start || b_end <= a_start,
                    "payload ranges overlap: [{a_start:#x},{a_end:#x}) vs [{b_start:#x},{b_end:#x})"
                );
            }
        }
        heap.verify();
    }

    #[test]
    fn test_allocate_grows_across_chunks() {
        let mut heap = GcHeap::new(test_config());

        // Each allocation takes 2 units; a 64-unit chunk holds 32.
        for _ in 0..40 {
            heap.allocate(UNIT).expect("allocate");
        }
        assert_eq!(heap.used_blocks(), 40);
        assert!(heap.heap_size() >= 2 * 64 * UNIT);
        heap.verify();
    }

    #[test]
    fn test_oversized_allocation_succeeds() {
        let mut heap = GcHeap::new(test_config());

        // Larger than one chunk: growth must not cap the request down.
        let bytes = 200 * UNIT;
        let ptr = heap.allocate(bytes).expect("allocate").as_ptr();
        unsafe {
            ptr.write(1);
            ptr.add(bytes - 1).write(2);
        }
        heap.verify();
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let mut heap = GcHeap::new(GcConfig {
            chunk_size: 4 * UNIT,
            max_heap_size: UNIT,
            verify_heap: true,
        });

        assert!(heap.allocate(8).is_none());
        assert!(heap.allocate(0).is_none());
        assert_eq!(heap.used_blocks(), 0);
        heap.verify();
    }

    #[test]
    fn test_zero_byte_allocation() {
        let mut heap = GcHeap::new(test_config());

        // A zero-byte request still gets a header-only block.
        let ptr = heap.allocate(0).expect("allocate");
        assert!(heap.owns(ptr.as_ptr()));
        assert_eq!(heap.used_blocks(), 1);
    }
}
