use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Provider section exists (enforced by serde)
/// - Server port is not 0
/// - Provider credential, agent id and base URL are usable
/// - Poll attempts and execution cache size are at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let provider = &config.provider;
    if provider.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "provider.api_key cannot be empty".to_string(),
        ));
    }
    if provider.agent_id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "provider.agent_id cannot be empty".to_string(),
        ));
    }
    if !(provider.base_url.starts_with("http://") || provider.base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "provider.base_url must be an http(s) URL, got {:?}",
            provider.base_url
        )));
    }

    if config.calls.max_poll_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "calls.max_poll_attempts must be at least 1".to_string(),
        ));
    }
    if config.calls.execution_cache_size == 0 {
        return Err(ConfigError::ValidationError(
            "calls.execution_cache_size must be at least 1".to_string(),
        ));
    }

    Ok(())
}
