use std::io::ErrorKind;
use std::path::PathBuf;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, body::Body};
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::media::{self, VideoMetadata};
use crate::models::shared::CameraType;
use crate::models::video::VideoUploadResponse;
use crate::state::AppState;
use crate::utils::filename::validate_upload_filename;

pub fn video_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(512 * 1024 * 1024) // 512 MB
}

/// An uploaded file parked on disk between multipart intake and blob
/// store ingestion.
struct StagedUpload {
    path: PathBuf,
    size: u64,
}

#[utoipa::path(
    post,
    path = "/api/v1/videos",
    tag = "Proctoring Videos",
    operation_id = "uploadVideo",
    summary = "Upload a proctoring video",
    description = "Accepts a multipart `file` field plus `sessionId`, `cameraType`, `userId` \
        and `electionId` sidecar fields. The video is staged to disk, then streamed into the \
        chunked blob store. A video record tracks the upload lifecycle; failed uploads leave \
        a `failed` record for audit.",
    request_body(content_type = "multipart/form-data", description = "Video file with session fields"),
    responses(
        (status = 201, description = "Video stored", body = VideoUploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, INCOMPLETE_UPLOAD)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut staged: Option<StagedUpload> = None;
    let mut original_name: Option<String> = None;
    let mut declared_mime: Option<String> = None;
    let mut session_id: Option<String> = None;
    let mut camera_type: Option<String> = None;
    let mut user_id: Option<String> = None;
    let mut election_id: Option<String> = None;

    let max_blob_size = state.config.storage.max_blob_size;
    let collected = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            match field.name() {
                Some("file") => {
                    // A second file field would orphan the first
                    // staging file if it were silently replaced.
                    if staged.is_some() {
                        return Err(AppError::Validation("Duplicate 'file' field".into()));
                    }
                    original_name = field.file_name().map(|s| s.to_string());
                    declared_mime = field.content_type().map(|s| s.to_string());
                    staged = Some(stage_upload_field(field, max_blob_size).await?);
                }
                Some("sessionId") => session_id = Some(read_text_field(field, "sessionId").await?),
                Some("cameraType") => {
                    camera_type = Some(read_text_field(field, "cameraType").await?)
                }
                Some("userId") => user_id = Some(read_text_field(field, "userId").await?),
                Some("electionId") => {
                    election_id = Some(read_text_field(field, "electionId").await?)
                }
                _ => {} // Ignore unknown fields.
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    if let Err(e) = collected {
        discard_staged(&staged).await;
        return Err(e);
    }

    let result = async {
        let staged_file = staged
            .as_ref()
            .ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
        let session_id = require_field(session_id.as_deref(), "sessionId")?.to_string();
        let camera =
            CameraType::parse(require_field(camera_type.as_deref(), "cameraType")?)?;
        let user_id = require_field(user_id.as_deref(), "userId")?.to_string();
        let election_id = require_field(election_id.as_deref(), "electionId")?.to_string();

        let original_name = match original_name.as_deref() {
            Some(name) => validate_upload_filename(name)
                .map_err(|e| AppError::Validation(e.message().into()))?
                .to_string(),
            None => "recording.mp4".to_string(),
        };
        let mime_type = declared_mime
            .clone()
            .or_else(|| {
                mime_guess::from_path(&original_name)
                    .first()
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| "video/mp4".into());

        let meta = VideoMetadata {
            session_id: session_id.clone(),
            camera_type: camera,
            user_id,
            election_id,
            original_name,
            mime_type,
        };

        let source = tokio::fs::File::open(&staged_file.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen staging file: {e}")))?;
        let uploaded = media::upload_video(
            &state.db,
            &state.blob_store,
            meta,
            source,
            Some(staged_file.size),
        )
        .await?;

        Ok::<_, AppError>((session_id, camera, uploaded))
    }
    .await;

    // Staging file is removed on success and failure alike.
    discard_staged(&staged).await;

    let (session_id, camera, uploaded) = result?;
    Ok((
        StatusCode::CREATED,
        Json(VideoUploadResponse {
            success: true,
            video_id: uploaded.record.id.to_string(),
            file_id: uploaded.file.id.to_string(),
            video_url: format!("/api/v1/videos/{}/{}", session_id, camera.as_str()),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{session_id}/{camera_type}",
    tag = "Proctoring Videos",
    operation_id = "fetchVideo",
    summary = "Fetch a proctoring video by session and camera",
    description = "Streams the newest completed recording for the pair. Records still in \
        `recording` state or marked `failed` are not retrievable. Supports ETag-based \
        caching via If-None-Match.",
    params(
        ("session_id" = String, Path, description = "Proctoring session ID"),
        ("camera_type" = String, Path, description = "Camera angle: front or rear"),
    ),
    responses(
        (status = 200, description = "Video content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 400, description = "Invalid camera type (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No completed recording (NOT_FOUND, INTEGRITY_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn fetch_video(
    State(state): State<AppState>,
    Path((session_id, camera_type)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let camera = CameraType::parse(&camera_type)?;
    let fetched = media::fetch_video(&state.db, &state.blob_store, &session_id, camera).await?;

    let etag_value = format!("\"{}\"", fetched.file.sha256);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && etag_matches(val, &etag_value)
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let body = Body::from_stream(fetched.stream.into_stream());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, fetched.content_type)
        .header(header::CONTENT_LENGTH, fetched.file.length.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&fetched.filename),
        )
        .header(header::ETAG, &etag_value)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

/// Match an `If-None-Match` header against an entity tag.
///
/// The header may carry a comma-separated list, weak validators
/// (`W/"..."`) or the `*` wildcard.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').any(|candidate| {
        let candidate = candidate.trim();
        let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
        candidate == "*" || candidate == etag
    })
}

fn require_field<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        _ => Err(AppError::Validation(format!("Missing '{name}' field"))),
    }
}

/// Build a safe `Content-Disposition` attachment header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

/// Stream a multipart file field to a staging file on disk.
///
/// The staging file is removed here on error; on success the caller
/// owns cleanup once ingestion finishes.
async fn stage_upload_field(
    mut field: axum::extract::multipart::Field<'_>,
    max_size: u64,
) -> Result<StagedUpload, AppError> {
    let path = std::env::temp_dir().join(format!("proctoring-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut staging_file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create staging file: {e}")))?;

        let mut total: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::IncompleteUpload(format!("Upload read error: {e}")))?
        {
            total += chunk.len() as u64;
            if total > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            staging_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Staging file write failed: {e}")))?;
        }

        staging_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Staging file flush failed: {e}")))?;

        Ok(StagedUpload {
            path: path.clone(),
            size: total,
        })
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&path).await;
    }
    result
}

async fn discard_staged(staged: &Option<StagedUpload>) {
    if let Some(s) = staged
        && let Err(e) = tokio::fs::remove_file(&s.path).await
        && e.kind() != ErrorKind::NotFound
    {
        // Cleanup failure must not mask the primary result.
        tracing::warn!(path = %s.path.display(), error = %e, "failed to remove staging file");
    }
}
