//! Collector configuration parameters.
//!
//! All sizes are tunable; defaults match the behavior of a small
//! general-purpose heap.

use crate::heap::UNIT;

/// Configuration for the heap and collector.
///
/// # Example
///
/// ```ignore
/// use cinder_gc::GcConfig;
///
/// // Small heap for tests: one 1KB batch, hard 4KB ceiling.
/// let config = GcConfig {
///     chunk_size: 1024,
///     max_heap_size: 4096,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct GcConfig {
    /// Bytes acquired from the OS per growth call (the Memory Source
    /// batch size). Requests larger than one batch grow by the full
    /// request instead.
    ///
    /// Must be a multiple of the allocation unit.
    ///
    /// Default: 4KB
    pub chunk_size: usize,

    /// Hard ceiling on total bytes the pool may acquire from the OS.
    ///
    /// Once reached, `allocate` reports exhaustion by returning `None`.
    /// Set to 0 for unlimited (bounded only by system memory).
    ///
    /// Default: 0 (unlimited)
    pub max_heap_size: usize,

    /// Walk both lists after each collection, checking circularity,
    /// free-list ordering, coalescing, and mark-flag restoration.
    ///
    /// Expensive but useful for debugging heap corruption.
    ///
    /// Default: false (enabled in debug builds)
    pub verify_heap: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            max_heap_size: 0,
            verify_heap: cfg!(debug_assertions),
        }
    }
}

impl GcConfig {
    /// Minimum permitted chunk size in bytes.
    pub const MIN_CHUNK_SIZE: usize = 4 * UNIT;

    /// Configuration for memory-constrained embedders.
    pub fn low_memory() -> Self {
        Self {
            chunk_size: 1024,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size < Self::MIN_CHUNK_SIZE {
            return Err(ConfigError::ChunkTooSmall);
        }
        if self.chunk_size % UNIT != 0 {
            return Err(ConfigError::ChunkNotUnitMultiple);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Chunk size is below [`GcConfig::MIN_CHUNK_SIZE`].
    ChunkTooSmall,
    /// Chunk size is not a multiple of the allocation unit.
    ChunkNotUnitMultiple,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ChunkTooSmall => {
                write!(f, "chunk size must be at least {} bytes", GcConfig::MIN_CHUNK_SIZE)
            }
            ConfigError::ChunkNotUnitMultiple => {
                write!(f, "chunk size must be a multiple of {} bytes", UNIT)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
