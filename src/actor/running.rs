//! The shared running flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation token shared by the push loop and the readers.
///
/// Starts out running. Any holder may stop it; nobody restarts it.
#[derive(Debug, Clone)]
pub struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    /// Create a flag in the running state.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Whether the bridge should keep going.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Ask the bridge to stop. Returns `true` if this call flipped it.
    pub fn stop(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl Default for RunningFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_stop_is_shared() {
        let flag = RunningFlag::new();
        let remote = flag.clone();

        thread::spawn(move || remote.stop()).join().unwrap();

        assert!(!flag.is_running());
        assert!(!flag.stop());
    }
}
