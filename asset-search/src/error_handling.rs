//! Counting of indexing errors.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::error;

/// Logs indexing errors and counts them, so that a build can report how many
/// assets failed without aborting on the first one.
#[derive(Debug, Default)]
pub struct ErrorHandlingService {
    error_count: AtomicUsize,
}

impl ErrorHandlingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log an error and count it.
    ///
    /// # Arguments
    ///
    /// * `message` - Human readable description
    /// * `context` - Structured detail, usually the failing bulk item
    pub fn log(&self, message: &str, context: &serde_json::Value) {
        self.error_count.fetch_add(1, Ordering::SeqCst);
        error!(context = %context, "{}", message);
    }

    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::SeqCst)
    }

    pub fn has_error(&self) -> bool {
        self.error_count() > 0
    }
}
