use ringback_core::{CallService, Config, SanitizedConfig};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    calls: Arc<CallService>,
}

impl AppState {
    pub fn new(config: Config, calls: Arc<CallService>) -> Self {
        Self { config, calls }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn calls(&self) -> &CallService {
        self.calls.as_ref()
    }
}
