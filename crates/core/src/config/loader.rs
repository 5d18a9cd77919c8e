use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides (e.g. `RINGBACK_PROVIDER__API_KEY`).
pub const ENV_PREFIX: &str = "RINGBACK_";

/// String settings that commonly look numeric.
const VERBATIM_ENV_KEYS: &[&str] = &[
    "provider.api_key",
    "provider.agent_id",
    "provider.from_phone_number",
];

/// Load configuration from an optional TOML file with environment variable overrides.
///
/// When `path` is `None` the configuration comes from the environment alone.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    extract(path, ENV_PREFIX)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn extract(path: Option<&Path>, env_prefix: &str) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed(env_prefix).split("__"));

    // Env values are parsed as typed values, which turns "+15550000000"
    // into a number. Re-read these keys verbatim.
    for key in VERBATIM_ENV_KEYS {
        let var = format!("{}{}", env_prefix, key.replace('.', "__").to_uppercase());
        if let Ok(value) = std::env::var(&var) {
            figment = figment.merge((*key, value));
        }
    }

    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
