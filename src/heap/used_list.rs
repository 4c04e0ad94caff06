//! Circular list of live (allocated) blocks.
//!
//! Membership is the universe the collector marks against. The anchor
//! is the oldest insertion; new blocks are threaded in next to it, so
//! list order is allocation order with no further invariant.

use super::block::BlockHeader;

/// Manager for the circular used list.
pub struct UsedList {
    /// Anchor block, or null when nothing is allocated.
    head: *mut BlockHeader,
}

impl UsedList {
    /// Create an empty used list.
    pub fn new() -> Self {
        Self {
            head: std::ptr::null_mut(),
        }
    }

    /// Whether any blocks are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    /// The anchor block, or null when empty.
    #[inline]
    pub(crate) fn anchor(&self) -> *mut BlockHeader {
        self.head
    }

    /// Replace the anchor after a sweep reclaimed the old one.
    #[inline]
    pub(crate) fn set_anchor(&mut self, head: *mut BlockHeader) {
        self.head = head;
    }

    /// Register a freshly allocated block, threading it in adjacent to
    /// the anchor.
    ///
    /// # Safety
    ///
    /// `block` must point at a valid header not currently on any list.
    pub unsafe fn push(&mut self, block: *mut BlockHeader) {
        // SAFETY: block is a valid detached header; head, when present,
        // is a live list node.
        unsafe {
            if self.head.is_null() {
                (*block).set_next(block);
                self.head = block;
            } else {
                (*block).set_next((*self.head).next());
                (*self.head).set_next(block);
            }
        }
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.for_each(|_| count += 1);
        count
    }

    /// Visit every live block, starting at the anchor.
    pub(crate) fn for_each(&self, mut f: impl FnMut(*mut BlockHeader)) {
        if self.head.is_null() {
            return;
        }
        let mut p = self.head;
        loop {
            f(p);
            // SAFETY: the list is circular over live headers; next()
            // strips the mark flag.
            p = unsafe { (*p).next() };
            if p == self.head {
                return;
            }
        }
    }

    /// First used block whose payload contains the candidate address
    /// `v`, if any. One match suffices: payloads of distinct live
    /// blocks never overlap.
    pub(crate) fn find_containing(&self, v: usize) -> Option<*mut BlockHeader> {
        if self.head.is_null() {
            return None;
        }
        let mut p = self.head;
        loop {
            // SAFETY: circular walk over live headers.
            unsafe {
                if (*p).payload_contains(v) {
                    return Some(p);
                }
                p = (*p).next();
            }
            if p == self.head {
                return None;
            }
        }
    }
}

impl Default for UsedList {
    fn default() -> Self {
        Self::new()
    }
}
