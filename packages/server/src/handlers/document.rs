use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::instrument;
use uuid::Uuid;

use crate::entity::document;
use crate::error::{AppError, ErrorBody};
use crate::models::document::{
    DocumentContentResponse, DocumentListResponse, DocumentSummary, DocumentUploadResponse,
    KycChecklist, KycStatusResponse,
};
use crate::models::shared::DocumentType;
use crate::state::AppState;
use crate::utils::filename::validate_upload_filename;

pub fn document_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(16 * 1024 * 1024) // 16 MB
}

#[utoipa::path(
    post,
    path = "/api/v1/documents",
    tag = "Documents",
    operation_id = "uploadDocument",
    summary = "Upload an identity document",
    description = "Accepts a multipart `file` field plus `documentType` and `userId` sidecar \
        fields. Documents are small objects and stored inline, base64-encoded.",
    request_body(content_type = "multipart/form-data", description = "Document file with type and owner"),
    responses(
        (status = 201, description = "Document stored", body = DocumentUploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut declared_mime: Option<String> = None;
    let mut document_type: Option<String> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().map(|s| s.to_string());
                declared_mime = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
                file_bytes = Some(bytes.to_vec());
            }
            Some("documentType") => {
                document_type = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read documentType: {e}")))?,
                );
            }
            Some("userId") => {
                user_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read userId: {e}")))?,
                );
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let bytes = file_bytes.ok_or_else(|| AppError::Validation("No file uploaded".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".into()));
    }

    let document_type = DocumentType::parse(
        document_type
            .as_deref()
            .ok_or_else(|| AppError::Validation("Missing 'documentType' field".into()))?,
    )?;
    let user_id =
        user_id.ok_or_else(|| AppError::Validation("Missing 'userId' field".into()))?;
    let file_name = file_name
        .as_deref()
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
    let file_name = validate_upload_filename(file_name)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();

    let mime_type = declared_mime.or_else(|| {
        mime_guess::from_path(&file_name)
            .first()
            .map(|m| m.to_string())
    });

    let id = Uuid::now_v7();
    let model = document::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        document_type: Set(document_type.as_str().to_string()),
        file_name: Set(file_name),
        file: Set(general_purpose::STANDARD.encode(&bytes)),
        file_size: Set(bytes.len() as i64),
        mime_type: Set(mime_type),
        uploaded_at: Set(Utc::now()),
    };
    model.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(DocumentUploadResponse {
            success: true,
            document_id: id.to_string(),
            document_url: format!("/api/v1/documents/{id}"),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    tag = "Documents",
    operation_id = "getDocument",
    summary = "Fetch a document's inline content",
    params(("id" = String, Path, description = "Document ID (UUID)")),
    responses(
        (status = 200, description = "Document content", body = DocumentContentResponse),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentContentResponse>, AppError> {
    let doc_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::Validation("Invalid document ID".into()))?;

    let doc = document::Entity::find_by_id(doc_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))?;

    Ok(Json(DocumentContentResponse {
        success: true,
        file: doc.file,
        file_name: doc.file_name,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/user/{user_id}",
    tag = "Documents",
    operation_id = "listUserDocuments",
    summary = "List a user's documents",
    description = "Metadata only; fetch the inline content per document.",
    params(("user_id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Document list", body = DocumentListResponse)),
)]
#[instrument(skip(state))]
pub async fn list_user_documents(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let docs = document::Entity::find()
        .filter(document::Column::UserId.eq(&user_id))
        .order_by_desc(document::Column::UploadedAt)
        .all(&state.db)
        .await?;

    let total = docs.len() as u64;
    let documents = docs.into_iter().map(DocumentSummary::from).collect();

    Ok(Json(DocumentListResponse { documents, total }))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/check-kyc/{user_id}",
    tag = "Documents",
    operation_id = "checkKyc",
    summary = "Check KYC document completeness",
    description = "Reports whether the user has all required identity documents on file \
        (aadhar card, PAN card, voter ID).",
    params(("user_id" = String, Path, description = "User ID")),
    responses((status = 200, description = "KYC status", body = KycStatusResponse)),
)]
#[instrument(skip(state))]
pub async fn check_kyc(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<KycStatusResponse>, AppError> {
    let docs = document::Entity::find()
        .filter(document::Column::UserId.eq(&user_id))
        .all(&state.db)
        .await?;

    let has = |doc_type: DocumentType| {
        docs.iter()
            .any(|d| d.document_type == doc_type.as_str() && d.file_size > 0)
    };

    let checklist = KycChecklist {
        aadhar: has(DocumentType::AadharCard),
        pan: has(DocumentType::PanCard),
        voter_id: has(DocumentType::VoterId),
    };
    let has_all_documents = DocumentType::KYC_REQUIRED.iter().all(|t| has(*t));

    Ok(Json(KycStatusResponse {
        success: true,
        has_all_documents,
        documents: checklist,
        message: if has_all_documents {
            "All KYC documents are present".into()
        } else {
            "Missing some KYC documents".into()
        },
    }))
}
