//! Likeness Server - REST API for multi-metric image comparison
//!
//! Exposes likeness-core functionality via HTTP endpoints:
//! - POST /compare/ - Score two uploaded images
//! - POST /generate_image - Generate an image from a prompt (when enabled)
//! - GET /health, GET /ready - Monitoring probes

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use likeness_core::{Comparator, GenerationConfig, HuggingFaceGenerator};
use likeness_server::{
    create_router_with_config, db, AppState, Config, DatabaseConfig, GeneratedImageRepository,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server failed to start");
        process::exit(1);
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn run() -> Result<(), BoxError> {
    let config = Config::from_env()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        comparator = %config.comparator,
        upload_dir = %config.upload_dir.display(),
        "Starting likeness-server"
    );

    std::fs::create_dir_all(&config.upload_dir).map_err(|e| {
        format!(
            "Cannot create upload directory {}: {}",
            config.upload_dir.display(),
            e
        )
    })?;

    // Building the extractor may download model weights; do it off the runtime.
    let comparator_config = config.comparator;
    let comparator = tokio::task::spawn_blocking(move || Comparator::from_config(comparator_config))
        .await??;

    let mut state = AppState::new(comparator, &config);

    if config.enable_generation {
        let generator = HuggingFaceGenerator::new(GenerationConfig::from_env()?)?;
        let pool = db::connect(&DatabaseConfig::from_env(config.database_min_connections)?).await?;
        state = state
            .with_generator(Arc::new(generator))
            .with_image_repo(GeneratedImageRepository::new(pool));
        tracing::info!(images_dir = %config.images_dir.display(), "Image generation enabled");
    }

    let app = create_router_with_config(state, &config);
    let addr = config.socket_addr();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Cannot bind {}: {}", addr, e))?;

    tracing::info!(%addr, "Listening");
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
