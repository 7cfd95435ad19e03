//! Feedback/query facade consumed by the HTTP layer.

use evotune_core::{EvolutionState, ParamVector};

use crate::{EngineError, EngineHandle};

/// Errors surfaced to the request layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The submitted score was not a finite number.
    #[error("invalid score {0:?}: expected a finite number")]
    Validation(String),

    /// The engine rejected the submission.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Read/write views over the shared evolutionary state.
///
/// Queries return the latest committed snapshot; `submit_feedback` is the
/// only mutator.
#[derive(Clone)]
pub struct TunerService {
    engine: EngineHandle,
}

impl TunerService {
    /// Wrap an engine handle.
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Candidate vector currently being evaluated.
    pub fn current(&self) -> ParamVector {
        self.engine.current()
    }

    /// Best-confirmed stable vector.
    pub fn stable(&self) -> ParamVector {
        self.engine.stable()
    }

    /// Latest committed state.
    pub fn state(&self) -> EvolutionState {
        self.engine.state()
    }

    /// Parse and submit a fitness score, returning the resulting state.
    ///
    /// Rejects input that does not parse as a number, and NaN/infinite
    /// values, before the engine is touched.
    pub async fn submit_feedback(&self, raw_score: &str) -> Result<EvolutionState, ServiceError> {
        let score: f64 = raw_score
            .trim()
            .parse()
            .map_err(|_| ServiceError::Validation(raw_score.to_string()))?;
        if !score.is_finite() {
            return Err(ServiceError::Validation(raw_score.to_string()));
        }
        Ok(self.engine.learn(score).await?)
    }
}
