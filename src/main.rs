//! Clinic Cache server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_cache::api::{create_router, AppState};
use clinic_cache::search::InMemoryDataSource;
use clinic_cache::{spawn_cleanup_task, Config};

/// # Startup Sequence
/// 1. Initialize tracing
/// 2. Load configuration from environment variables
/// 3. Load the seed dataset, if any
/// 4. Start the background expiry sweep
/// 5. Serve HTTP until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Clinic Cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_ttl={}ms, search_ttl={}ms, port={}, cleanup_interval={}s, coalesce={}",
        config.default_ttl_ms,
        config.search_ttl_ms,
        config.server_port,
        config.cleanup_interval,
        config.coalesce_misses
    );

    let source = match &config.seed_file {
        Some(path) => InMemoryDataSource::from_file(path).await?,
        None => {
            warn!("SEED_FILE not set, starting with an empty dataset");
            InMemoryDataSource::default()
        }
    };

    let state = AppState::new(&config, Arc::new(source));

    let cleanup_handle = spawn_cleanup_task(state.cache.clone(), config.cleanup_interval);
    info!("Background expiry sweep started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then stops the expiry sweep.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Expiry sweep aborted");
}
