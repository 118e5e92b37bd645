// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Natty-Fit API Server
//!
//! Email/password accounts, member profiles and a shared image feed.

use natty_fit::{
    config::{Config, StoreBackend},
    db::Database,
    services::ObjectStore,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, production = config.production, "Starting Natty-Fit API");

    let db = match config.store_backend {
        StoreBackend::Firestore => Database::connect_firestore(&config.gcp_project_id).await?,
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Database::new_memory()
        }
    };
    tracing::info!(backend = db.backend_name(), "Credential store ready");

    let storage = match (&config.storage_url, &config.storage_service_key) {
        (Some(url), Some(key)) => ObjectStore::http(url, &config.storage_bucket, key),
        _ => {
            tracing::warn!("STORAGE_URL not set; keeping uploads in memory");
            ObjectStore::memory(
                &format!("http://localhost:{}/objects", config.port),
                &config.storage_bucket,
            )
        }
    };

    let port = config.port;
    let state = Arc::new(AppState::new(config, db, storage));

    // Build router
    let app = natty_fit::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,natty_fit=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
