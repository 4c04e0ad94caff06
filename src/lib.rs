//! Cinder Garbage Collector
//!
//! A self-contained memory manager: a coalescing free-list allocator
//! layered under a conservative, stop-the-world, mark-and-sweep
//! garbage collector. Programs get manual-looking `allocate` calls
//! with no matching `free` — the collector reclaims unreachable blocks
//! by scanning raw memory for plausible pointers.
//!
//! # Architecture
//!
//! - **Heap**: a circular, address-ordered free list with immediate
//!   coalescing, a circular used list of live blocks, and a chunk pool
//!   that grows the arena from the OS in batches.
//!
//! - **Collector**: an explicit, synchronous mark/sweep cycle.
//!   Marking is conservative — every word in the supplied root ranges
//!   and in marked payloads is tested for containment in a live
//!   block's payload interval; no type information exists.
//!
//! - **Roots**: supplied by the embedder as half-open, word-aligned
//!   address ranges (the active stack plus static data regions).
//!   Platform adapters for stack bounds live in [`roots::platform`].
//!
//! # Usage
//!
//! ```ignore
//! use cinder_gc::{AddressRange, Collector, GcConfig, GcHeap, RootSet};
//!
//! let mut heap = GcHeap::new(GcConfig::default());
//! let mut collector = Collector::new();
//!
//! let ptr = heap.allocate(64).expect("out of memory");
//!
//! // Collection is explicit; hand the collector your root ranges.
//! let mut roots = RootSet::new();
//! roots.set_stack(AddressRange::new(stack_top, stack_bottom));
//! unsafe { collector.collect(&mut heap, &roots) };
//! ```
//!
//! # Safety
//!
//! The core is deliberately check-free on the hot paths. The contract:
//! - Root ranges must reference readable memory for their whole extent
//! - Never write outside a block's requested payload size
//! - All calls happen on one logical thread; the collector runs
//!   stop-the-world with no interleaved allocation
//!
//! Violations are undefined behavior, not reported errors. The only
//! recoverable condition is out-of-memory, reported as `None` from
//! `allocate`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collector;
pub mod config;
pub mod heap;
pub mod roots;
pub mod stats;

// Re-exports for convenient access
pub use collector::{CollectResult, Collector};
pub use config::{ConfigError, GcConfig};
pub use heap::{BlockHeader, GcHeap, UNIT};
pub use roots::{AddressRange, RegionSource, RootSet};
pub use stats::{GcStats, LeakTracker};
