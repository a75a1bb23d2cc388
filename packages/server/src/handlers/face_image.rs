use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::instrument;
use uuid::Uuid;

use crate::entity::face_image;
use crate::error::{AppError, ErrorBody};
use crate::models::face_image::{
    FaceImageListResponse, FaceImageResponse, VerifyFaceImageRequest,
};
use crate::models::shared::ExtractedFrom;
use crate::state::AppState;

pub fn face_image_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(16 * 1024 * 1024) // 16 MB
}

#[utoipa::path(
    post,
    path = "/api/v1/face-images",
    tag = "Face Images",
    operation_id = "saveFaceImage",
    summary = "Store a face image",
    description = "Accepts a multipart `faceImage` field plus `userId` and `extractedFrom` \
        sidecar fields. Images start unverified.",
    request_body(content_type = "multipart/form-data", description = "Face image with owner and source"),
    responses(
        (status = 201, description = "Face image stored", body = FaceImageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn save_face_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut image_bytes: Option<Vec<u8>> = None;
    let mut user_id: Option<String> = None;
    let mut extracted_from: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("faceImage") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
                image_bytes = Some(bytes.to_vec());
            }
            Some("userId") => {
                user_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read userId: {e}")))?,
                );
            }
            Some("extractedFrom") => {
                extracted_from = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read extractedFrom: {e}"))
                })?);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let bytes =
        image_bytes.ok_or_else(|| AppError::Validation("No face image uploaded".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded face image is empty".into()));
    }
    let user_id = user_id.ok_or_else(|| AppError::Validation("Missing 'userId' field".into()))?;
    let extracted_from = ExtractedFrom::parse(
        extracted_from
            .as_deref()
            .ok_or_else(|| AppError::Validation("Missing 'extractedFrom' field".into()))?,
    )?;

    let model = face_image::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        face_image: Set(general_purpose::STANDARD.encode(&bytes)),
        extracted_from: Set(extracted_from.as_str().to_string()),
        is_verified: Set(false),
        created_at: Set(Utc::now()),
    };
    let saved = model.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(FaceImageResponse::from(saved))))
}

#[utoipa::path(
    get,
    path = "/api/v1/face-images/user/{user_id}",
    tag = "Face Images",
    operation_id = "listFaceImages",
    summary = "List a user's face images",
    params(("user_id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Face image list", body = FaceImageListResponse)),
)]
#[instrument(skip(state))]
pub async fn list_face_images(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<FaceImageListResponse>, AppError> {
    let images = face_image::Entity::find()
        .filter(face_image::Column::UserId.eq(&user_id))
        .order_by_desc(face_image::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let total = images.len() as u64;
    let face_images = images.into_iter().map(FaceImageResponse::from).collect();

    Ok(Json(FaceImageListResponse { face_images, total }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/face-images/{id}/verify",
    tag = "Face Images",
    operation_id = "verifyFaceImage",
    summary = "Toggle a face image's verification flag",
    params(("id" = String, Path, description = "Face image ID (UUID)")),
    request_body = VerifyFaceImageRequest,
    responses(
        (status = 200, description = "Updated face image", body = FaceImageResponse),
        (status = 404, description = "Face image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, request))]
pub async fn verify_face_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<VerifyFaceImageRequest>,
) -> Result<Json<FaceImageResponse>, AppError> {
    let image_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::Validation("Invalid face image ID".into()))?;

    face_image::Entity::find_by_id(image_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Face image not found".into()))?;

    let update = face_image::ActiveModel {
        id: Set(image_id),
        is_verified: Set(request.is_verified),
        ..Default::default()
    };
    let updated = update.update(&state.db).await?;

    Ok(Json(FaceImageResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/face-images/{id}",
    tag = "Face Images",
    operation_id = "deleteFaceImage",
    summary = "Delete a face image",
    params(("id" = String, Path, description = "Face image ID (UUID)")),
    responses(
        (status = 204, description = "Face image deleted"),
        (status = 404, description = "Face image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_face_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let image_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::Validation("Invalid face image ID".into()))?;

    face_image::Entity::find_by_id(image_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Face image not found".into()))?;

    face_image::Entity::delete_by_id(image_id)
        .exec(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
