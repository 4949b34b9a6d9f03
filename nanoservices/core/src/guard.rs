use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Single-slot run permit. Cloning shares the slot.
#[derive(Debug, Clone, Default)]
pub struct PipelineGuard {
    slot: Arc<Mutex<()>>,
}

/// Held for the duration of a run; dropping it frees the slot.
pub type RunPermit = OwnedMutexGuard<()>;

impl PipelineGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the slot without waiting. `None` means a run is in progress.
    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.slot.clone().try_lock_owned().ok()
    }

    pub fn is_running(&self) -> bool {
        self.slot.try_lock().is_err()
    }

    /// Resolve once no run holds the slot.
    pub async fn wait_idle(&self) {
        let _idle = self.slot.lock().await;
    }
}
