use serde::Serialize;

/// Response DTO for a successful proctoring-video upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VideoUploadResponse {
    pub success: bool,
    /// Video record ID (UUIDv7).
    pub video_id: String,
    /// Blob store file id backing the recording.
    pub file_id: String,
    /// Retrieval URL, keyed by session and camera.
    #[schema(example = "/api/v1/videos/s1/front")]
    pub video_url: String,
}
