use std::sync::Arc;

use common::storage::ChunkedBlobStore;
use tracing::info;

use server::config::AppConfig;
use server::state::AppState;
use server::{build_router, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database.url).await?;
    info!("Database connected and schema synced");

    let blob_store = ChunkedBlobStore::open(
        config.storage.root.clone(),
        config.storage.chunk_size,
    )
    .await?;
    info!(root = %config.storage.root.display(), "Blob store ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        blob_store: Arc::new(blob_store),
        config: Arc::new(config),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    info!("Swagger UI at http://{addr}/swagger-ui");
    axum::serve(listener, app).await?;

    Ok(())
}
