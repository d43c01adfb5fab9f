// Cats API server
// Decision: One shared task pool, created here and injected into the cat service
// Decision: HTTP drain and pool drain each get their own SHUTDOWN_TIMEOUT budget

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cats_control_plane::api;
use cats_control_plane::config::Config;
use cats_control_plane::services::{CatService, TracingThumbnailGenerator};
use cats_control_plane::storage::StorageBackend;
use cats_core::telemetry::{init_telemetry, TelemetryConfig};
use cats_worker::TaskPool;
use tokio::sync::Notify;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    let _ = dotenvy::dotenv();

    // Configure via environment variables:
    // - RUST_LOG / LOG_LEVEL: Log filter (default: "cats_control_plane=debug,cats_worker=debug,tower_http=debug")
    // - LOG_FORMAT=json: structured output
    let mut telemetry_config = TelemetryConfig::from_env();
    telemetry_config.service_version = Some(env!("CARGO_PKG_VERSION").to_string());
    init_telemetry(telemetry_config);

    let config = Config::from_env();
    info!(
        addr = %config.addr,
        dev_mode = config.dev_mode,
        worker_concurrency = config.worker_concurrency,
        request_timeout = ?config.request_timeout,
        shutdown_timeout = ?config.shutdown_timeout,
        "cats-api starting..."
    );

    // Initialize storage
    let db = if config.dev_mode {
        info!("Dev mode: using in-memory storage");
        StorageBackend::in_memory()
    } else {
        let db = StorageBackend::postgres(&config.database_url, &config.database_options())
            .await
            .context("Failed to initialize database")?;
        info!(
            max_connections = config.db_max_connections,
            min_connections = config.db_min_connections,
            "Connected to database"
        );
        db
    };

    let pool = Arc::new(TaskPool::new(config.worker_concurrency));
    pool.start();

    let service = Arc::new(CatService::new(
        db,
        Arc::clone(&pool),
        Arc::new(TracingThumbnailGenerator::new()),
        config.request_timeout,
    ));

    let app = api::router(service, Arc::clone(&pool));

    let listener = match tokio::net::TcpListener::bind(&config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            // Workers are already running; let them finish before exiting
            drain_pool(&pool, config.shutdown_timeout).await;
            return Err(e).with_context(|| format!("Failed to bind to {}", config.addr));
        }
    };
    info!("HTTP server listening on {}", config.addr);

    let signalled = Arc::new(Notify::new());
    let server = {
        let signalled = Arc::clone(&signalled);
        axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown_signal().await;
            signalled.notify_one();
        })
    };
    let mut server = tokio::spawn(server.into_future());

    let server_result = tokio::select! {
        result = &mut server => {
            // Exited without a signal, so this is a server failure
            result
                .context("Server task failed")
                .and_then(|served| served.context("Server error"))
        }
        _ = signalled.notified() => {
            info!("Shutdown signal received, draining HTTP connections");
            match tokio::time::timeout(config.shutdown_timeout, &mut server).await {
                Ok(result) => result
                    .context("Server task failed")
                    .and_then(|served| served.context("Server error")),
                Err(_) => {
                    warn!(
                        timeout = ?config.shutdown_timeout,
                        "Graceful HTTP shutdown timed out, dropping open connections"
                    );
                    server.abort();
                    Ok(())
                }
            }
        }
    };

    if let Err(e) = &server_result {
        error!("{:#}", e);
    }

    drain_pool(&pool, config.shutdown_timeout).await;

    info!("bye!");
    server_result
}

/// Stop intake and wait for queued side effects, bounded by `timeout`
async fn drain_pool(pool: &TaskPool, timeout: Duration) {
    info!("Draining task pool");
    match tokio::time::timeout(timeout, pool.shutdown()).await {
        Ok(()) => info!(stats = ?pool.stats(), "Task pool drained"),
        Err(_) => error!(
            timeout = ?timeout,
            stats = ?pool.stats(),
            "Task pool did not drain before the shutdown deadline"
        ),
    }
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
