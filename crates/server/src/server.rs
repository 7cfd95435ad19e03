//! Server setup and lifecycle management.

use std::net::SocketAddr;
use std::sync::Arc;

use evotune_core::TunerConfig;
use evotune_engine::{EngineConfig, EvolutionEngine, TunerService};
use evotune_storage::{JsonStateStore, StateStore};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::create_router;
use crate::state::AppState;

/// The evotune HTTP server.
pub struct Server {
    config: TunerConfig,
}

impl Server {
    /// Create a server from validated configuration.
    pub fn new(config: TunerConfig) -> Self {
        Self { config }
    }

    /// Load-or-bootstrap state, spawn the engine, and serve until shutdown.
    ///
    /// The durable record is fully loaded before the listener binds, so no
    /// request is ever served against uninitialized state.
    pub async fn run(self) -> anyhow::Result<()> {
        let store = Arc::new(JsonStateStore::new(&self.config.data_dir, &self.config.id).await?);
        let state = store.load_or_bootstrap(&self.config.initial_data).await?;
        info!(
            "state loaded from {}: generation={} best score={}",
            store.path().display(),
            state.generation,
            state.best_score
        );

        let engine = EvolutionEngine::spawn(
            store,
            EngineConfig {
                generation_duration: self.config.generation_duration,
                mutation_rates: self.config.mutation_rates.clone(),
            },
            state,
        );

        let app = create_router(AppState::new(TunerService::new(engine)));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.server));
        let listener = TcpListener::bind(addr).await?;
        info!("evotune listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("evotune shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
