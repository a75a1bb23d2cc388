use std::sync::Arc;

use common::storage::ChunkedBlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

/// Shared handles, constructed once in `main` and cloned per request.
/// The blob store is an explicit dependency rather than a global.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blob_store: Arc<ChunkedBlobStore>,
    pub config: Arc<AppConfig>,
}
