pub mod calls;
pub mod config;
pub mod metrics;
pub mod poller;
pub mod provider;
pub mod store;
pub mod testing;

pub use calls::{
    CallError, CallOutcome, CallResult, CallService, DetachedCall, ExecutionRegistry, PhoneNumber,
    STATUS_COMPLETED, STATUS_PENDING,
};
pub use config::{
    load_config, load_config_from_str, validate_config, CallsConfig, Config, ConfigError,
    DatabaseConfig, ProviderConfig, SanitizedConfig, ServerConfig,
};
pub use poller::{CompletedExecution, CompletionPoller, PollError};
pub use provider::{
    BolnaClient, CallProvider, CallStarted, ExecutionSnapshot, ExecutionStatus, ProviderError,
};
pub use store::{SqliteUserStore, StoreError, User, UserStore};
