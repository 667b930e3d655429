//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use imgshift_convert::{Backends, ConversionService};
use imgshift_core::config::AppConfig;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Conversion service.
    pub service: ConversionService,
    /// Process start, for `/health` uptime.
    pub started_at: Instant,
}

impl AppState {
    /// Build state over the given backends.
    pub fn new(config: AppConfig, backends: Backends) -> Self {
        let service = ConversionService::new(&config.conversion, backends);
        Self {
            config: Arc::new(config),
            service,
            started_at: Instant::now(),
        }
    }
}
