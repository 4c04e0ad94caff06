//! Stop-the-world conservative mark-and-sweep collection.
//!
//! A collection cycle runs four phases to completion, synchronously,
//! and only when explicitly invoked:
//!
//! 1. Root scan: every word in the supplied static regions, then the
//!    stack range, is treated as a candidate address and tested against
//!    the payload interval of every used block.
//! 2. Propagation: marked blocks have their own payload words scanned
//!    the same way, driven by a work list until no new block is found.
//! 3. Sweep: unmarked blocks leave the used list and coalesce back into
//!    the free list; survivors get their mark flag cleared.
//! 4. Back to idle. No flag outlives the cycle.
//!
//! Scanning is conservative: a word that merely looks like an address
//! into a live payload retains that block. There is no type
//! information and no precision — address-range containment is the
//! only reachability test.

use crate::heap::{GcHeap, UNIT, UsedList};
use crate::roots::{AddressRange, RootSet};
use std::collections::VecDeque;
use std::time::Instant;

/// Result of one collection cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectResult {
    /// Blocks returned to the free list.
    pub blocks_freed: usize,
    /// Bytes returned to the free list (headers included).
    pub bytes_freed: usize,
    /// Blocks found reachable this cycle.
    pub blocks_marked: usize,
    /// Blocks remaining on the used list after the sweep.
    pub blocks_live: usize,
}

/// The mark-and-sweep collector.
///
/// Holds only transient marking state (the work list), so one
/// collector can serve any number of heaps, one cycle at a time.
pub struct Collector {
    /// Marked blocks whose payloads are not yet scanned.
    worklist: VecDeque<*mut crate::heap::BlockHeader>,
}

impl Collector {
    /// Create a collector.
    pub fn new() -> Self {
        Self {
            worklist: VecDeque::new(),
        }
    }

    /// Run one full mark/sweep cycle over `heap` with the given roots.
    ///
    /// A heap with nothing allocated is a no-op. Allocation never calls
    /// this; the embedder decides when to collect.
    ///
    /// # Safety
    ///
    /// Every range registered in `roots` must reference memory that is
    /// readable for its whole extent. The heap's lists must be well
    /// formed — corrupting headers through the raw payload pointers is
    /// undefined behavior, not a detected error.
    pub unsafe fn collect(&mut self, heap: &mut GcHeap, roots: &RootSet) -> CollectResult {
        let started = Instant::now();
        let mut result = CollectResult::default();

        if heap.used_list().is_empty() {
            return result;
        }

        self.worklist.clear();

        // Phase 1: scan the static regions, then the stack.
        // SAFETY: the caller guarantees readable ranges; the used list
        // is well formed.
        unsafe {
            for region in roots.static_regions() {
                self.mark_region(heap.used_list(), *region);
            }
            if let Some(stack) = roots.stack_range() {
                self.mark_region(heap.used_list(), stack);
            }

            // Phase 2: propagate marks through heap-internal references.
            self.propagate(heap.used_list(), &mut result);

            // Phase 3: sweep the used list.
            self.sweep(heap, &mut result);
        }

        result.blocks_live = heap.used_blocks();

        if heap.config().verify_heap {
            heap.verify();
        }
        heap.stats()
            .record_collection(started.elapsed(), result.blocks_freed, result.bytes_freed);
        result
    }

    /// Scan one address range: every contained word is a candidate
    /// address, marked against the used list on first containment
    /// match. Idempotent per range and insensitive to region order.
    ///
    /// # Safety
    ///
    /// `region` must reference readable memory for its whole extent.
    unsafe fn mark_region(&mut self, used: &UsedList, region: AddressRange) {
        for addr in region.words() {
            // SAFETY: the range is word-aligned and readable.
            let v = unsafe { (addr as *const usize).read() };
            if let Some(block) = used.find_containing(v) {
                // SAFETY: find_containing yields live used-list nodes.
                unsafe {
                    if !(*block).is_marked() {
                        (*block).mark();
                        self.worklist.push_back(block);
                    }
                }
            }
        }
    }

    /// Drain the work list: scan each marked block's payload for
    /// references into other used blocks, marking and enqueueing every
    /// new discovery until a fixed point. Each payload is scanned
    /// exactly once per cycle.
    ///
    /// # Safety
    ///
    /// The used list must be well formed; payloads are read as raw
    /// words.
    unsafe fn propagate(&mut self, used: &UsedList, result: &mut CollectResult) {
        while let Some(block) = self.worklist.pop_front() {
            result.blocks_marked += 1;

            // SAFETY: block came off the used list during this cycle.
            let start = unsafe { (*block).payload_start() };
            let end = start + unsafe { (*block).payload_len() };

            let mut addr = start;
            while addr + AddressRange::WORD <= end {
                // SAFETY: payload memory belongs to a live block.
                let v = unsafe { (addr as *const usize).read() };
                if let Some(other) = used.find_containing(v) {
                    // SAFETY: live used-list node. A block referencing
                    // itself is already marked, so only genuinely new
                    // blocks are enqueued.
                    unsafe {
                        if !(*other).is_marked() {
                            (*other).mark();
                            self.worklist.push_back(other);
                        }
                    }
                }
                addr += AddressRange::WORD;
            }
        }
    }

    /// Walk the used list once: unmarked blocks coalesce back into the
    /// free list, survivors get their flag cleared. The anchor is
    /// handled last so its predecessor is known; reclaiming it moves
    /// the anchor to the last survivor, or empties the list.
    ///
    /// # Safety
    ///
    /// Both lists must be well formed and the used list non-empty.
    unsafe fn sweep(&mut self, heap: &mut GcHeap, result: &mut CollectResult) {
        let (free, used) = heap.lists_mut();
        let anchor = used.anchor();
        let mut prev = anchor;

        // SAFETY: the used list is circular over live headers; every
        // block handed to the free list has been unlinked first.
        unsafe {
            let mut p = (*anchor).next();
            while p != anchor {
                if (*p).is_marked() {
                    (*p).clear_mark();
                    prev = p;
                    p = (*p).next();
                } else {
                    let dead = p;
                    p = (*p).next();
                    (*prev).set_next(p);
                    result.blocks_freed += 1;
                    result.bytes_freed += (*dead).size() * UNIT;
                    free.insert(dead);
                }
            }

            if (*anchor).is_marked() {
                (*anchor).clear_mark();
            } else {
                result.blocks_freed += 1;
                result.bytes_freed += (*anchor).size() * UNIT;
                if prev == anchor {
                    // The anchor was the last block standing.
                    used.set_anchor(std::ptr::null_mut());
                } else {
                    (*prev).set_next((*anchor).next());
                    used.set_anchor(prev);
                }
                free.insert(anchor);
            }
        }
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
