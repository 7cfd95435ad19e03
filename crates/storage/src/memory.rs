//! In-memory state store for development and tests.

use evotune_core::EvolutionState;
use tokio::sync::Mutex;

use super::{Result, StateStore};

/// Volatile state store backed by a mutex-guarded slot.
#[derive(Default)]
pub struct MemoryStateStore {
    slot: Mutex<Option<EvolutionState>>,
}

impl MemoryStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<EvolutionState>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, state: &EvolutionState) -> Result<()> {
        *self.slot.lock().await = Some(state.clone());
        Ok(())
    }
}
