//! The Memory Source: bulk acquisition of raw memory from the OS.
//!
//! Chunks are obtained from the global allocator in batches of at least
//! the configured chunk size, formatted as a single free block, and
//! retained here so teardown can release everything at once. The core
//! treats this module as "grow the arena by N units, or fail".

use super::block::{BlockHeader, UNIT};
use std::alloc::Layout;

/// One raw region obtained from the OS.
struct Chunk {
    ptr: *mut u8,
    layout: Layout,
}

impl Chunk {
    #[inline]
    fn contains(&self, addr: usize) -> bool {
        let start = self.ptr as usize;
        addr >= start && addr < start + self.layout.size()
    }
}

/// Pool of OS-acquired chunks backing the heap.
pub struct ChunkPool {
    chunks: Vec<Chunk>,
    /// Minimum units acquired per growth call (the batch size).
    batch_units: usize,
    /// Total byte budget; 0 means unlimited.
    budget_bytes: usize,
    /// Bytes acquired so far.
    acquired_bytes: usize,
}

impl ChunkPool {
    /// Create a pool growing in batches of `chunk_size` bytes, bounded
    /// by `budget_bytes` in total (0 = unlimited).
    pub fn new(chunk_size: usize, budget_bytes: usize) -> Self {
        Self {
            chunks: Vec::new(),
            batch_units: chunk_size / UNIT,
            budget_bytes,
            acquired_bytes: 0,
        }
    }

    /// Acquire at least `min_units` of fresh memory and format it as a
    /// single free block sized to exactly the units obtained. Returns
    /// `None` when the budget is exhausted or the OS refuses.
    ///
    /// Small requests are batched up to the chunk size; a request
    /// larger than one batch grows by the full request instead of being
    /// capped down, so a single growth call always suffices.
    pub fn grow(&mut self, min_units: usize) -> Option<*mut BlockHeader> {
        let units = min_units.max(self.batch_units);
        let bytes = units.checked_mul(UNIT)?;

        if self.budget_bytes != 0 && self.acquired_bytes + bytes > self.budget_bytes {
            return None;
        }

        let layout = Layout::from_size_align(bytes, UNIT).ok()?;
        // SAFETY: layout has non-zero size (units >= 1).
        let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
        if ptr.is_null() {
            return None;
        }

        self.chunks.push(Chunk { ptr, layout });
        self.acquired_bytes += bytes;

        let header = ptr as *mut BlockHeader;
        // SAFETY: the chunk is UNIT-aligned and large enough for a
        // header spanning the whole region.
        unsafe { header.write(BlockHeader::new(units)) };
        Some(header)
    }

    /// Whether `addr` falls inside any chunk this pool owns.
    pub fn owns(&self, addr: usize) -> bool {
        self.chunks.iter().any(|c| c.contains(addr))
    }

    /// Total bytes acquired from the OS.
    #[inline]
    pub fn acquired_bytes(&self) -> usize {
        self.acquired_bytes
    }

    /// Number of chunks acquired.
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl Drop for ChunkPool {
    fn drop(&mut self) {
        for chunk in self.chunks.drain(..) {
            // SAFETY: each chunk was allocated with exactly this layout
            // and is freed once.
            unsafe { std::alloc::dealloc(chunk.ptr, chunk.layout) };
        }
    }
}
