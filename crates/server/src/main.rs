use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ringback_core::{
    load_config, validate_config, BolnaClient, CallProvider, CallService, SqliteUserStore,
    UserStore,
};
use ringback_server::{api::create_router, state::AppState};

/// Environment variable naming the config file
const CONFIG_PATH_VAR: &str = "RINGBACK_CONFIG";

/// Config file used when `RINGBACK_CONFIG` is unset
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // An explicit path must exist; the default one is optional
    let config_path = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => Some(PathBuf::from(path)),
        Err(_) => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()),
    };

    match &config_path {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No config file found, using environment only"),
    }
    let config = load_config(config_path.as_deref()).context("Failed to load config")?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Provider: {}", config.provider.base_url);

    let store: Arc<dyn UserStore> = Arc::new(
        SqliteUserStore::new(&config.database.path).context("Failed to open user store")?,
    );
    info!("User store initialized");

    let provider: Arc<dyn CallProvider> = Arc::new(
        BolnaClient::new(config.provider.clone()).context("Failed to create provider client")?,
    );
    info!("Using call provider: {}", provider.name());

    let calls = Arc::new(CallService::new(provider, store, &config.calls));
    info!(
        "Completion polling: {} attempts every {}ms",
        config.calls.max_poll_attempts, config.calls.poll_interval_ms
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, calls));
    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
