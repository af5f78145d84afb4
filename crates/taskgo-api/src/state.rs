//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use taskgo_core::config::AppConfig;
use taskgo_limiter::VisitorRegistry;

/// Application state containing all shared dependencies.
///
/// Passed to every handler and middleware via `State<AppState>`.
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Per-client token buckets consulted by the admission middleware
    pub visitors: Arc<VisitorRegistry>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Creates state around an already constructed visitor registry.
    pub fn new(config: AppConfig, visitors: Arc<VisitorRegistry>) -> Self {
        Self {
            config: Arc::new(config),
            visitors,
            started_at: Instant::now(),
        }
    }
}
