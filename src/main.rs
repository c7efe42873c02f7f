//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads configuration from the environment
//! - Opens the database and builds the shared state
//! - Starts the HTTP server with graceful shutdown support

use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use shortlink::config::Config;
use shortlink::database::{init_db, AppState};
use shortlink::route::create_app;

/// Application entry point
///
/// Startup fails with a non-zero exit if the configuration is invalid, the
/// database cannot be opened or the port cannot be bound.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shortlink=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = init_db(&config.database_url)?;
    tracing::info!(database = %config.database_url, "database opened");

    let state = AppState::new(db, &config);
    let app = create_app(state.clone()).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(listen_addr = %listener.local_addr()?, public_url = %config.public_url, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router's clones are gone once serve returns; this is the last handle
    drop(state);
    tracing::info!("database released, server stopped");

    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
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

    tracing::info!("shutdown signal received, stopping server");
}
