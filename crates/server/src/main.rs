use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidgrab_core::{
    create_backends, load_config, validate_config, CookieSource, DownloadStorage,
    EnvCookieSource, MuxCapability, Orchestrator, OrchestratorConfig,
};
use vidgrab_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

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

    info!("vidgrab v{}", VERSION);

    // Determine config path
    let config_path = std::env::var("VIDGRAB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Download directory: {:?}", config.storage.download_dir);

    // Storage
    let storage = Arc::new(DownloadStorage::new(&config.storage.download_dir));
    storage
        .ensure_dir()
        .await
        .context("Failed to prepare download directory")?;

    // Multiplexer, detected once
    let mux = MuxCapability::detect(&config.muxer).await;

    // Cookie material is read per invocation so a rotated secret needs no restart
    let cookie_source: Arc<dyn CookieSource> =
        Arc::new(EnvCookieSource::new(config.cookies.env_var.clone()));
    if cookie_source.load().is_none() {
        warn!(
            "No cookie material in {}; restricted videos will likely fail",
            cookie_source.describe()
        );
    }

    // Backend chain
    let backends = create_backends(&config);
    info!(
        "Backend chain: {}",
        backends
            .iter()
            .map(|b| b.name())
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    let orchestrator = Arc::new(Orchestrator::new(
        OrchestratorConfig::from_config(&config, mux),
        backends,
        storage.clone(),
        cookie_source.clone(),
    ));

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        orchestrator,
        storage,
        cookie_source,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
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
