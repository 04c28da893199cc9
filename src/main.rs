// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gift Wishlist API Server
//!
//! Users sign in with Google, keep a wishlist, follow friends and claim the
//! gifts on their friends' lists.

use anyhow::Context;
use gift_wishlist::{
    config::{Config, DirectoryBackend},
    db::{Directory, FirestoreDb, MemoryDb},
    services::GoogleProvider,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        credential_mode = ?config.credential_mode,
        "Starting Gift Wishlist API"
    );

    let db = match &config.directory {
        DirectoryBackend::Firestore { project_id } => {
            let firestore = FirestoreDb::new(project_id)
                .await
                .context("Failed to connect to Firestore")?;
            Directory::firestore(firestore)
        }
        DirectoryBackend::Memory => {
            tracing::warn!("Using in-memory directory; users are lost on restart");
            Directory::memory(Arc::new(MemoryDb::new()))
        }
    };

    let provider = Arc::new(
        GoogleProvider::new(&config).context("Failed to initialize Google provider")?,
    );

    // Build shared state
    let port = config.port;
    let state = Arc::new(AppState::new(config, db, provider).context("Invalid credential settings")?);

    // Build router
    let app = gift_wishlist::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gift_wishlist=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
