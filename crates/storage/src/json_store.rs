//! JSON file storage implementation.
//!
//! Stores the state record as a single JSON file named after the configured
//! identity. Writes go to a temporary sibling file followed by a rename, so
//! a crash mid-write leaves either the old or the fully-written new record,
//! never a corrupt mixture.

use std::path::{Path, PathBuf};

use evotune_core::EvolutionState;
use tokio::fs;

use super::{Result, StateStore};

/// File-based JSON state store.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    /// Create a store for `id` under `root`. Creates `root` if needed.
    pub async fn new(root: impl AsRef<Path>, id: &str) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            path: root.join(format!("{}.json", id)),
        })
    }

    /// Path of the durable record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        // sibling of the final path, so the rename stays on one filesystem
        self.path.with_extension("json.tmp")
    }
}

#[async_trait::async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<Option<EvolutionState>> {
        read_json(&self.path).await
    }

    async fn save(&self, state: &EvolutionState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;
        tracing::debug!("state persisted to {}", self.path.display());
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
