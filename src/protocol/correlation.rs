//! Correlation-id generation.
//!
//! Ids disambiguate concurrent outstanding requests so replies route to
//! the correct waiter even when several are in flight. Each session owns
//! its own source; there is no module-global counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic correlation-id source. Ids start at 1, never repeat, and
/// never reset for the lifetime of the source.
///
/// Cloning yields a handle to the same underlying counter, so a source
/// may be shared between a session facet and its dispatcher without ids
/// ever colliding.
#[derive(Debug, Clone, Default)]
pub struct IdSource {
    next: Arc<AtomicU64>,
}

impl IdSource {
    /// Create a new source starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next unique id.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}
