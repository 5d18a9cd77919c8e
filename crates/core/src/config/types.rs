use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub calls: CallsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin is allowed.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ringback.db")
}

/// Voice call provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider API base URL (e.g., "https://api.bolna.ai")
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    /// Static bearer credential
    pub api_key: String,
    /// Agent that places the calls
    pub agent_id: String,
    /// Caller id; empty lets the provider pick one
    #[serde(default)]
    pub from_phone_number: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_provider_url() -> String {
    "https://api.bolna.ai".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Call flow configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallsConfig {
    /// Status fetches before giving up on an execution.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Fixed delay between status fetches (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How many phone number -> execution id entries are kept in memory.
    #[serde(default = "default_execution_cache_size")]
    pub execution_cache_size: usize,
}

fn default_max_poll_attempts() -> u32 {
    30
}

fn default_poll_interval() -> u64 {
    10_000 // 10 seconds
}

fn default_execution_cache_size() -> usize {
    1024
}

impl Default for CallsConfig {
    fn default() -> Self {
        Self {
            max_poll_attempts: default_max_poll_attempts(),
            poll_interval_ms: default_poll_interval(),
            execution_cache_size: default_execution_cache_size(),
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub provider: SanitizedProviderConfig,
    pub calls: CallsConfig,
}

/// Sanitized provider config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub agent_id: String,
    pub from_phone_number: String,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            provider: SanitizedProviderConfig {
                base_url: config.provider.base_url.clone(),
                api_key_configured: !config.provider.api_key.is_empty(),
                agent_id: config.provider.agent_id.clone(),
                from_phone_number: config.provider.from_phone_number.clone(),
                timeout_secs: config.provider.timeout_secs,
            },
            calls: config.calls.clone(),
        }
    }
}
