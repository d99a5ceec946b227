//! Cooperative cancellation for long-running builds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared, cooperative cancellation token.
///
/// The token is polled (never awaited) at the top of every driver and worker
/// loop iteration. Once set it stays set; an in-progress compile runs to
/// completion before its worker observes the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a new, unset token.
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// Requests cancellation. Safe to call from any thread, any number of times.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
