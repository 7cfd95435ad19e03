//! State store trait abstraction.

use async_trait::async_trait;
use evotune_core::{EvolutionState, ParamVector};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Durable store for the evolutionary state record.
///
/// One store instance owns exactly one record; the identity is fixed when
/// the store is constructed. Absence of the record is not an error — it is
/// the bootstrap trigger.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the record, or `None` if it has never been written.
    async fn load(&self) -> Result<Option<EvolutionState>>;

    /// Durably write the record, replacing any previous version.
    async fn save(&self, state: &EvolutionState) -> Result<()>;

    /// Load the record, bootstrapping it from `initial` if absent.
    ///
    /// A missing record is created from `initial` and persisted before it
    /// is returned. A present record is backfilled with parameters added
    /// to the configuration since it was written, and re-persisted only
    /// when the backfill changed it.
    async fn load_or_bootstrap(&self, initial: &ParamVector) -> Result<EvolutionState> {
        match self.load().await? {
            Some(mut state) => {
                if state.backfill(initial) {
                    tracing::info!("state record backfilled from configured initial data");
                    self.save(&state).await?;
                }
                Ok(state)
            }
            None => {
                let state = EvolutionState::bootstrap(initial);
                self.save(&state).await?;
                tracing::info!("bootstrapped state record at generation 0");
                Ok(state)
            }
        }
    }
}
