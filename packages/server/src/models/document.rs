use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::document;

/// Response DTO for a successful document upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentUploadResponse {
    pub success: bool,
    /// Document ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub document_id: String,
    /// Retrieval URL for the stored document.
    #[schema(example = "/api/v1/documents/01936f0e-1234-7abc-8000-000000000001")]
    pub document_url: String,
}

/// Response DTO carrying a document's inline content.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentContentResponse {
    pub success: bool,
    /// Base64-encoded file content.
    pub file: String,
    pub file_name: String,
}

/// Metadata-only view of a stored document.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentSummary {
    pub id: String,
    pub user_id: String,
    #[schema(example = "aadhar_card")]
    pub document_type: String,
    pub file_name: String,
    /// Decoded size in bytes.
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<document::Model> for DocumentSummary {
    fn from(model: document::Model) -> Self {
        Self {
            id: model.id.to_string(),
            user_id: model.user_id,
            document_type: model.document_type,
            file_name: model.file_name,
            file_size: model.file_size,
            mime_type: model.mime_type,
            uploaded_at: model.uploaded_at,
        }
    }
}

/// Response DTO for listing a user's documents.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total: u64,
}

/// Presence flags for the required KYC document set.
#[derive(Serialize, utoipa::ToSchema)]
pub struct KycChecklist {
    pub aadhar: bool,
    pub pan: bool,
    pub voter_id: bool,
}

/// Response DTO for the KYC completeness check.
#[derive(Serialize, utoipa::ToSchema)]
pub struct KycStatusResponse {
    pub success: bool,
    pub has_all_documents: bool,
    pub documents: KycChecklist,
    #[schema(example = "All KYC documents are present")]
    pub message: String,
}
