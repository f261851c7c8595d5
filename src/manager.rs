use crate::deadlock::DeadlockStatus;
use crate::engine::{AllocationEngine, AllocationOutcome, Cleared, GraphView, ReleaseError, Released};
use crate::state_machine::{Command, CommandOutput, StateMachine};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to one allocation engine.
///
/// Every call holds the engine lock for the whole operation, so allocate,
/// release, detection and reset never interleave. Clones share the engine.
#[derive(Debug, Clone)]
pub struct AllocationManager {
    engine: Arc<Mutex<AllocationEngine>>,
}

impl AllocationManager {
    pub fn new(engine: AllocationEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    pub async fn allocate(&self, process: &str, resource: &str) -> AllocationOutcome {
        self.engine.lock().await.allocate(process, resource)
    }

    pub async fn release(&self, process: &str, resource: &str) -> Result<Released, ReleaseError> {
        self.engine.lock().await.release(process, resource)
    }

    pub async fn detect_deadlock(&self) -> DeadlockStatus {
        self.engine.lock().await.detect_deadlock()
    }

    pub async fn clear_all(&self) -> Cleared {
        self.engine.lock().await.clear_all()
    }

    /// Applies a command under the engine lock.
    pub async fn apply(&self, command: Command) -> CommandOutput {
        self.engine.lock().await.apply(command)
    }

    /// Consistent read-only view for renderers.
    pub async fn view(&self) -> GraphView {
        self.engine.lock().await.view()
    }
}

impl Default for AllocationManager {
    fn default() -> Self {
        Self::new(AllocationEngine::new())
    }
}
