//! API router and request handlers.

use axum::{
    extract::{Form, State},
    routing::{get, post},
    Json, Router,
};
use evotune_core::{EvolutionState, ParamVector};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::ApiResult;
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(usage))
        .route("/health", get(health))
        .route("/current", get(get_current))
        .route("/stable", get(get_stable))
        .route("/learn", post(learn))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn usage() -> &'static str {
    "evotune: GET /current, GET /stable, POST /learn (score=<number>). See README for usage.\n"
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests
    pub status: String,
    /// Server version
    pub version: String,
    /// Time since startup
    pub uptime: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

async fn get_current(State(state): State<AppState>) -> Json<ParamVector> {
    Json(state.service.current())
}

async fn get_stable(State(state): State<AppState>) -> Json<ParamVector> {
    Json(state.service.stable())
}

/// Feedback submission form.
#[derive(Debug, Deserialize)]
pub struct LearnRequest {
    /// Raw score value; parsed by the facade so malformed input maps to a
    /// clean client error instead of a form-decode rejection
    pub score: String,
}

async fn learn(
    State(state): State<AppState>,
    Form(request): Form<LearnRequest>,
) -> ApiResult<Json<EvolutionState>> {
    let state_after = state.service.submit_feedback(&request.score).await?;
    Ok(Json(state_after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use evotune_engine::{EngineConfig, EvolutionEngine, TunerService};
    use evotune_storage::MemoryStateStore;
    use std::sync::Arc;

    fn app_state() -> AppState {
        let initial: ParamVector = [("speed".to_string(), 0.05), ("angle".to_string(), 1.5)]
            .into_iter()
            .collect();
        let handle = EvolutionEngine::spawn_seeded(
            Arc::new(MemoryStateStore::new()),
            EngineConfig {
                generation_duration: 3,
                mutation_rates: vec![0.1, 0.1],
            },
            EvolutionState::bootstrap(&initial),
            7,
        );
        AppState::new(TunerService::new(handle))
    }

    #[tokio::test]
    async fn current_and_stable_return_the_bootstrap_vectors() {
        let state = app_state();

        let current = get_current(State(state.clone())).await;
        let stable = get_stable(State(state)).await;

        assert_eq!(current.0["speed"], 0.05);
        assert_eq!(current.0, stable.0);
    }

    #[tokio::test]
    async fn learn_returns_the_full_resulting_state() {
        let state = app_state();

        let response = learn(
            State(state),
            Form(LearnRequest {
                score: "2.5".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.generation, 1);
        assert_eq!(response.0.best_score, 0.0);
    }

    #[tokio::test]
    async fn malformed_score_maps_to_bad_request() {
        let state = app_state();

        let result = learn(
            State(state.clone()),
            Form(LearnRequest {
                score: "not-a-number".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert_eq!(state.service.state().generation, 0);
    }

    #[tokio::test]
    async fn health_reports_version() {
        let state = app_state();

        let response = health(State(state)).await;
        assert_eq!(response.0.status, "healthy");
        assert_eq!(response.0.version, env!("CARGO_PKG_VERSION"));
    }
}
