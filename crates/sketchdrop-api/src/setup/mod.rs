//! Application setup and initialization
//!
//! All startup logic lives here rather than in main.rs: telemetry, the
//! database pool and migrations, image storage, and route wiring.

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use sketchdrop_core::Config;
use sketchdrop_storage::LocalStorage;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Initialize telemetry first
    sketchdrop_infra::telemetry::init_telemetry()
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    // Setup database
    let pool = database::setup_database(&config).await?;

    // Setup image storage
    let storage = LocalStorage::new(&config.saved_images_path)
        .await
        .context("Failed to initialize image storage")?;

    let state = Arc::new(AppState::new(config, pool, storage)?);

    // Setup routes
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
