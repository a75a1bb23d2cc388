use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::face_image;

/// Response DTO for a stored face image.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FaceImageResponse {
    pub id: String,
    pub user_id: String,
    /// Base64-encoded image content.
    pub face_image: String,
    #[schema(example = "live")]
    pub extracted_from: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<face_image::Model> for FaceImageResponse {
    fn from(model: face_image::Model) -> Self {
        Self {
            id: model.id.to_string(),
            user_id: model.user_id,
            face_image: model.face_image,
            extracted_from: model.extracted_from,
            is_verified: model.is_verified,
            created_at: model.created_at,
        }
    }
}

/// Response DTO for listing a user's face images.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FaceImageListResponse {
    pub face_images: Vec<FaceImageResponse>,
    pub total: u64,
}

/// Request body for toggling verification status.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyFaceImageRequest {
    pub is_verified: bool,
}
