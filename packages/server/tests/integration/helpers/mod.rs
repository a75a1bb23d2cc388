use std::sync::Arc;

use common::storage::{ChunkedBlobStore, DEFAULT_CHUNK_SIZE};
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use server::config::{AppConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig};
use server::state::AppState;
use server::{build_router, database};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub db: DatabaseConnection,
    pub blob_store: Arc<ChunkedBlobStore>,
    // Keeps the sqlite file and blob root alive for the test's duration.
    _dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = TempDir::new().expect("create temp dir");

        let db_path = dir.path().join("test.sqlite");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = database::init_db(&db_url).await.expect("init test db");

        let blob_root = dir.path().join("blobs");
        let blob_store = Arc::new(
            ChunkedBlobStore::open(blob_root.clone(), DEFAULT_CHUNK_SIZE)
                .await
                .expect("open blob store"),
        );

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec!["*".into()],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            storage: StorageConfig {
                root: blob_root,
                chunk_size: DEFAULT_CHUNK_SIZE,
                max_blob_size: 64 * 1024 * 1024,
            },
        };

        let state = AppState {
            db: db.clone(),
            blob_store: blob_store.clone(),
            config: Arc::new(config),
        };
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let address = format!("http://{}", listener.local_addr().expect("local addr"));
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });

        TestApp {
            address,
            client: reqwest::Client::new(),
            db,
            blob_store,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Deterministic non-repeating payload for round-trip assertions.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn video_form(
    data: Vec<u8>,
    file_name: &str,
    session_id: &str,
    camera_type: &str,
) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(data)
        .file_name(file_name.to_string())
        .mime_str("video/mp4")
        .expect("valid mime");
    reqwest::multipart::Form::new()
        .part("file", part)
        .text("sessionId", session_id.to_string())
        .text("cameraType", camera_type.to_string())
        .text("userId", "user-1")
        .text("electionId", "election-1")
}
