//! Application state for API handlers.

use evotune_engine::TunerService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Facade over the evolution engine
    pub service: TunerService,

    /// Server version
    pub version: String,

    /// Server start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(service: TunerService) -> Self {
        Self {
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Human-readable uptime
    pub fn uptime(&self) -> String {
        let secs = (chrono::Utc::now() - self.started_at).num_seconds();
        format!("{}s", secs)
    }
}
