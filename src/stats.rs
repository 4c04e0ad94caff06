//! Collection statistics and the leak-tracking observer.
//!
//! [`GcStats`] counts allocator and collector activity for monitoring
//! and tuning. [`LeakTracker`] is an independent diagnostics layer that
//! callers may wrap around allocation results and manual release
//! notifications; the collector never consults it and it is not
//! required for correctness.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Statistics about allocator and collector activity.
#[derive(Debug)]
pub struct GcStats {
    /// Total payload bytes handed out since start.
    pub bytes_allocated: AtomicU64,
    /// Total blocks handed out since start.
    pub blocks_allocated: AtomicU64,
    /// Number of collection cycles run.
    pub collections: AtomicU64,
    /// Total blocks reclaimed by collection.
    pub blocks_freed: AtomicU64,
    /// Total bytes reclaimed by collection.
    pub bytes_freed: AtomicU64,
    /// Total time spent collecting (nanoseconds).
    pub gc_time_ns: AtomicU64,
}

impl GcStats {
    /// Create new empty statistics.
    pub const fn new() -> Self {
        Self {
            bytes_allocated: AtomicU64::new(0),
            blocks_allocated: AtomicU64::new(0),
            collections: AtomicU64::new(0),
            blocks_freed: AtomicU64::new(0),
            bytes_freed: AtomicU64::new(0),
            gc_time_ns: AtomicU64::new(0),
        }
    }

    /// Record an allocation of `bytes` of payload.
    #[inline]
    pub fn record_allocation(&self, bytes: usize) {
        self.bytes_allocated.fetch_add(bytes as u64, Ordering::Relaxed);
        self.blocks_allocated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed collection cycle.
    pub fn record_collection(&self, duration: Duration, blocks_freed: usize, bytes_freed: usize) {
        self.collections.fetch_add(1, Ordering::Relaxed);
        self.blocks_freed.fetch_add(blocks_freed as u64, Ordering::Relaxed);
        self.bytes_freed.fetch_add(bytes_freed as u64, Ordering::Relaxed);
        self.gc_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Total time spent in collection.
    pub fn total_gc_time(&self) -> Duration {
        Duration::from_nanos(self.gc_time_ns.load(Ordering::Relaxed))
    }

    /// Average collection pause.
    pub fn avg_pause(&self) -> Duration {
        let count = self.collections.load(Ordering::Relaxed);
        if count == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.gc_time_ns.load(Ordering::Relaxed) / count)
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.bytes_allocated.store(0, Ordering::Relaxed);
        self.blocks_allocated.store(0, Ordering::Relaxed);
        self.collections.store(0, Ordering::Relaxed);
        self.blocks_freed.store(0, Ordering::Relaxed);
        self.bytes_freed.store(0, Ordering::Relaxed);
        self.gc_time_ns.store(0, Ordering::Relaxed);
    }

    /// Print a summary of activity so far.
    pub fn print_summary(&self) {
        eprintln!("=== GC Statistics ===");
        eprintln!(
            "Allocations: {} blocks, {}",
            self.blocks_allocated.load(Ordering::Relaxed),
            format_bytes(self.bytes_allocated.load(Ordering::Relaxed))
        );
        eprintln!(
            "Reclaimed: {} blocks, {}",
            self.blocks_freed.load(Ordering::Relaxed),
            format_bytes(self.bytes_freed.load(Ordering::Relaxed))
        );
        eprintln!(
            "Collections: {} ({:?} total, {:?} avg pause)",
            self.collections.load(Ordering::Relaxed),
            self.total_gc_time(),
            self.avg_pause()
        );
    }
}

impl Default for GcStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Format bytes in human-readable form.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

// =============================================================================
// Leak Tracker
// =============================================================================

/// Record of one outstanding allocation.
#[derive(Debug, Clone)]
struct AllocationInfo {
    size: usize,
    site: &'static str,
}

/// Independent observer that tracks outstanding allocations.
///
/// Callers register each `allocate` result with [`track_alloc`] and
/// report manual releases with [`track_release`]; the difference is the
/// outstanding set. The tracker keeps recording across collections —
/// it observes what the *caller* believes is live, which is exactly
/// what makes it useful for spotting references the caller lost.
///
/// [`track_alloc`]: LeakTracker::track_alloc
/// [`track_release`]: LeakTracker::track_release
#[derive(Debug, Default)]
pub struct LeakTracker {
    live: Mutex<FxHashMap<usize, AllocationInfo>>,
    total_allocations: AtomicU64,
    total_releases: AtomicU64,
    current_bytes: AtomicU64,
    peak_bytes: AtomicU64,
}

impl LeakTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an allocation of `size` bytes at `ptr`, attributed to
    /// `site` (typically a function or test name). Null pointers are
    /// ignored.
    pub fn track_alloc(&self, ptr: *const u8, size: usize, site: &'static str) {
        if ptr.is_null() {
            return;
        }
        self.live
            .lock()
            .insert(ptr as usize, AllocationInfo { size, site });
        self.total_allocations.fetch_add(1, Ordering::Relaxed);
        let now = self
            .current_bytes
            .fetch_add(size as u64, Ordering::Relaxed)
            + size as u64;
        self.peak_bytes.fetch_max(now, Ordering::Relaxed);
    }

    /// Report that the caller released `ptr`. Returns false (and warns
    /// on stderr) when the pointer was never tracked.
    pub fn track_release(&self, ptr: *const u8) -> bool {
        if ptr.is_null() {
            return false;
        }
        match self.live.lock().remove(&(ptr as usize)) {
            Some(info) => {
                self.total_releases.fetch_add(1, Ordering::Relaxed);
                self.current_bytes
                    .fetch_sub(info.size as u64, Ordering::Relaxed);
                true
            }
            None => {
                eprintln!("[leak-tracker] warning: releasing untracked pointer {ptr:p}");
                false
            }
        }
    }

    /// Number of outstanding allocations.
    pub fn outstanding(&self) -> usize {
        self.live.lock().len()
    }

    /// Bytes currently outstanding.
    pub fn outstanding_bytes(&self) -> u64 {
        self.current_bytes.load(Ordering::Relaxed)
    }

    /// Peak outstanding bytes observed.
    pub fn peak_bytes(&self) -> u64 {
        self.peak_bytes.load(Ordering::Relaxed)
    }

    /// Report outstanding allocations. Returns true when the tracker is
    /// clean (no outstanding allocations).
    pub fn check_leaks(&self) -> bool {
        let live = self.live.lock();
        if live.is_empty() {
            eprintln!("[leak-tracker] no outstanding allocations");
            return true;
        }
        eprintln!("[leak-tracker] {} allocations outstanding:", live.len());
        for (addr, info) in live.iter() {
            eprintln!("  {:#x}: {} bytes from {}", addr, info.size, info.site);
        }
        false
    }

    /// Print tracker statistics.
    pub fn print_stats(&self) {
        eprintln!("[leak-tracker] statistics:");
        eprintln!("  outstanding: {} allocations", self.outstanding());
        eprintln!(
            "  outstanding bytes: {}",
            format_bytes(self.outstanding_bytes())
        );
        eprintln!("  peak bytes: {}", format_bytes(self.peak_bytes()));
        eprintln!(
            "  total: {} allocations, {} releases",
            self.total_allocations.load(Ordering::Relaxed),
            self.total_releases.load(Ordering::Relaxed)
        );
    }

    /// Dump every outstanding allocation with a bounded hex preview of
    /// its payload.
    ///
    /// # Safety
    ///
    /// Every tracked pointer must still reference readable memory of at
    /// least its recorded size (in particular, the heap that produced
    /// them must still be alive and no tracked block may have been
    /// reclaimed and reused).
    pub unsafe fn dump(&self) {
        let live = self.live.lock();
        eprintln!("[leak-tracker] heap contents ({} allocations):", live.len());
        for (i, (addr, info)) in live.iter().enumerate() {
            eprintln!(
                "  [{}] {:#x}: {} bytes from {}",
                i, addr, info.size, info.site
            );
            let preview = info.size.min(32);
            let mut line = String::from("      data:");
            for j in 0..preview {
                // SAFETY: caller guarantees the pointer is readable for
                // info.size bytes.
                let byte = unsafe { (*addr as *const u8).add(j).read() };
                line.push_str(&format!(" {byte:02x}"));
            }
            eprintln!("{line}");
        }
    }
}
