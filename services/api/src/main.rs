use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod error;
mod export;
mod ingest;
mod middleware;
mod models;
mod orchestrator;
mod routes;
mod state;
mod status;
mod store;
#[cfg(test)]
mod test_support;

use common::AppConfig;
use media::{Captioner, FrameExtractor, GeminiCaptioner, ThumbnailGenerator};
use tokio::net::TcpListener;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting captioning service");

    let config = AppConfig::load()?;
    info!("Using model {}", config.gemini.model);

    let frames: Arc<dyn FrameExtractor> = Arc::new(ThumbnailGenerator::new(&config.frames));
    let captioner: Arc<dyn Captioner> =
        Arc::new(GeminiCaptioner::new(config.gemini.clone(), frames.clone())?);

    let app_state = AppState::new(frames, captioner)?;
    info!(
        "Session uploads stored in {}",
        app_state.ingestor.upload_dir().display()
    );

    // Start the web server
    let app = routes::create_router(app_state, config.upload.max_bytes);

    let address = config.server.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Captioning service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Captioning service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
