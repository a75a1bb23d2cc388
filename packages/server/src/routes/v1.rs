use axum::Router;
use axum::routing::{delete, get, patch, post};

use crate::handlers::{document, face_image, video};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/documents", document_routes())
        .nest("/face-images", face_image_routes())
        .nest("/videos", video_routes())
}

fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(document::upload_document))
        .route("/user/{user_id}", get(document::list_user_documents))
        .route("/check-kyc/{user_id}", get(document::check_kyc))
        .route("/{id}", get(document::get_document))
        .layer(document::document_body_limit())
}

fn face_image_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(face_image::save_face_image))
        .route("/user/{user_id}", get(face_image::list_face_images))
        .route("/{id}/verify", patch(face_image::verify_face_image))
        .route("/{id}", delete(face_image::delete_face_image))
        .layer(face_image::face_image_body_limit())
}

fn video_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(video::upload_video))
        .route("/{session_id}/{camera_type}", get(video::fetch_video))
        .layer(video::video_upload_body_limit())
}
