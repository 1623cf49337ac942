//! Configuration types for bulk requests.

/// Thresholds at which a pending bulk request is flushed to the engine.
///
/// A batch is flushed as soon as it holds `max_elements` operations or its serialized
/// lines add up to `max_octets` bytes, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkBatchConfig {
    /// Maximum number of operations (action line plus payload lines) per bulk request.
    pub max_elements: usize,

    /// Maximum number of serialized bytes per bulk request.
    pub max_octets: usize,
}

impl Default for BulkBatchConfig {
    fn default() -> Self {
        Self {
            max_elements: 500,
            max_octets: 40_000_000,
        }
    }
}

impl BulkBatchConfig {
    /// Create a config with custom thresholds.
    ///
    /// # Arguments
    ///
    /// * `max_elements` - Maximum number of operations per bulk request
    /// * `max_octets` - Maximum number of serialized bytes per bulk request
    pub fn new(max_elements: usize, max_octets: usize) -> Self {
        Self {
            max_elements,
            max_octets,
        }
    }

    /// Create a config that never flushes on its own.
    ///
    /// # Warning
    ///
    /// Everything is kept in memory until an explicit flush. Only meant for tests and
    /// very small imports.
    pub fn unlimited() -> Self {
        Self {
            max_elements: usize::MAX,
            max_octets: usize::MAX,
        }
    }

    /// Whether a batch of the given size must be flushed.
    pub fn is_exceeded(&self, elements: usize, octets: usize) -> bool {
        elements >= self.max_elements || octets >= self.max_octets
    }
}
