//! Testing utilities and mock implementations.
//!
//! Provides a mock of the call provider trait so the call flow can be
//! exercised end to end without a real voice provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use ringback_core::testing::{fixtures, MockCallProvider};
//!
//! let provider = MockCallProvider::new();
//! provider.push_status("completed", Some("hello")).await;
//!
//! let service = CallService::new(provider, store, &fixtures::fast_calls_config(3));
//! ```

mod mock_call_provider;

pub use mock_call_provider::MockCallProvider;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::{CallsConfig, Config, DatabaseConfig, ProviderConfig, ServerConfig};

    /// Calls config that polls without delay.
    pub fn fast_calls_config(max_poll_attempts: u32) -> CallsConfig {
        CallsConfig {
            max_poll_attempts,
            poll_interval_ms: 0,
            execution_cache_size: 64,
        }
    }

    /// Provider config pointing at `base_url` with dummy credentials.
    pub fn provider_config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            base_url: base_url.to_string(),
            api_key: "test-api-key".to_string(),
            agent_id: "test-agent".to_string(),
            from_phone_number: String::new(),
            timeout_secs: 5,
        }
    }

    /// Complete config suitable for in-process tests.
    pub fn config(calls: CallsConfig) -> Config {
        Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 3000,
                cors_allowed_origins: Vec::new(),
            },
            database: DatabaseConfig::default(),
            provider: provider_config("http://127.0.0.1:1"),
            calls,
        }
    }
}
