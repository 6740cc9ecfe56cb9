use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rankboard::config::BoardConfig;
use rankboard::ingest::{Pipeline, StorageLayout};
use rankboard::producer::CommandProducer;
use rankboard::rules::PresentationRules;
use rankboard::server::{self, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "rankboard stopped");
        std::process::exit(1);
    }
}

async fn run() -> rankboard::Result<()> {
    let config_file = std::env::args().nth(1).map(PathBuf::from);
    let config = BoardConfig::load(config_file.as_deref())?;

    let producer = Arc::new(CommandProducer::from_env(&config.parser));
    info!(command = producer.command(), fallback = ?producer.fallback(), "parser configured");

    let pipeline = Pipeline::open(StorageLayout::new(&config.storage_dir), producer)
        .await?
        .with_adopt_dir(&config.adopt_dir)
        .with_max_upload_bytes(config.max_upload_bytes);
    let pipeline = Arc::new(pipeline);

    // best-effort: the server is up even if this fails
    let boot = Arc::clone(&pipeline);
    tokio::spawn(async move {
        boot.bootstrap().await;
    });

    let state = AppState::new(
        pipeline,
        config.roles.clone(),
        PresentationRules::from_config(&config.thresholds),
    );
    let app = server::router(state, Some(&config.client_dist));

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
