pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod media;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Voter Verification Media API",
        description = "Chunked blob storage and media endpoints for proctoring videos, \
            identity documents and face images.",
        version = env!("CARGO_PKG_VERSION"),
    ),
    paths(
        handlers::health::health,
        handlers::video::upload_video,
        handlers::video::fetch_video,
        handlers::document::upload_document,
        handlers::document::get_document,
        handlers::document::list_user_documents,
        handlers::document::check_kyc,
        handlers::face_image::save_face_image,
        handlers::face_image::list_face_images,
        handlers::face_image::verify_face_image,
        handlers::face_image::delete_face_image,
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Proctoring Videos", description = "Chunked video upload and retrieval"),
        (name = "Documents", description = "Identity document storage and KYC checks"),
        (name = "Face Images", description = "Face image storage and verification"),
    ),
)]
struct ApiDoc;

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(config.server.cors.max_age));

    if config.server.cors.allow_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .server
            .cors
            .allow_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::health::health))
        .nest("/api", routes::api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
}
