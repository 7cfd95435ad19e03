//! Service configuration loaded from a JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ParamVector;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 8020;

/// Errors raised while loading or validating configuration.
///
/// All variants are fatal at startup; the process must not serve requests
/// with a broken configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON or is missing a required field.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config parsed but a value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tuning-service configuration.
///
/// File keys are camelCase:
///
/// ```json
/// {
///   "id": "rotation",
///   "server": 8020,
///   "initialData": { "speed": 0.05 },
///   "mutationRates": [0.1, 0.05],
///   "generationDuration": 10
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunerConfig {
    /// Identity of the durable state record.
    pub id: String,

    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub server: u16,

    /// Directory holding the durable record.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Initial parameter vector used to bootstrap state.
    pub initial_data: ParamVector,

    /// Per-position maximum relative perturbation magnitudes.
    pub mutation_rates: Vec<f64>,

    /// Number of feedback submissions per evolution boundary.
    pub generation_duration: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

impl TunerConfig {
    /// Load and validate configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check semantic constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::Invalid("id must not be empty".to_string()));
        }
        if self.initial_data.is_empty() {
            return Err(ConfigError::Invalid(
                "initialData must not be empty".to_string(),
            ));
        }
        if self.generation_duration == 0 {
            return Err(ConfigError::Invalid(
                "generationDuration must be at least 1".to_string(),
            ));
        }
        if let Some(rate) = self
            .mutation_rates
            .iter()
            .find(|r| **r < 0.0 || !r.is_finite())
        {
            return Err(ConfigError::Invalid(format!(
                "mutation rate {} is not a non-negative number",
                rate
            )));
        }
        Ok(())
    }
}
