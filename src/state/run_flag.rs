//! Per-source non-reentrancy guard
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "running" flag for one source
///
/// Clones share the same flag, so the fast loop, the slow loop and manual
/// triggers all see one another.
#[derive(Debug, Clone, Default)]
pub struct RunFlag {
    running: Arc<AtomicBool>,
}

impl RunFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims the flag
    ///
    /// Returns `None` when the source is already running. The flag is released
    /// when the returned guard is dropped, including on early return or panic.
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                running: Arc::clone(&self.running),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Proof that the holder owns a source's run flag
#[derive(Debug)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
