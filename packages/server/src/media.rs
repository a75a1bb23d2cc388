//! Media service: associates proctoring-video uploads with blob store
//! objects and drives the record state machine
//! (`recording -> completed | failed`).

use chrono::Utc;
use common::storage::{BlobDownloadStream, BlobFile, BlobId, ChunkedBlobStore, StorageError};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use uuid::Uuid;

use crate::entity::video_record;
use crate::error::AppError;
use crate::models::shared::{CameraType, VideoStatus};

/// Typed metadata attached to every proctoring-video blob.
///
/// Serialized into the blob descriptor's open metadata mapping; field
/// names follow the wire convention of the stored documents.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub session_id: String,
    pub camera_type: CameraType,
    pub user_id: String,
    pub election_id: String,
    pub original_name: String,
    pub mime_type: String,
}

/// Result of a finished upload: the completed record plus the blob
/// descriptor it references.
pub struct UploadedVideo {
    pub record: video_record::Model,
    pub file: BlobFile,
}

/// Everything needed to serve a video download.
pub struct FetchedVideo {
    pub file: BlobFile,
    pub stream: BlobDownloadStream,
    pub content_type: String,
    pub filename: String,
}

/// Drive one proctoring upload through the blob store.
///
/// The video record is inserted in `recording` before any byte moves
/// and ends in `completed` (with the blob id attached) or `failed`.
/// Failed rows are kept as an audit trail, never deleted. Concurrent
/// uploads for the same (session, camera) pair are not locked; the
/// newest completed record wins at fetch time.
pub async fn upload_video(
    db: &DatabaseConnection,
    store: &ChunkedBlobStore,
    meta: VideoMetadata,
    source: impl AsyncRead + Unpin,
    declared_length: Option<u64>,
) -> Result<UploadedVideo, AppError> {
    let stored_name = format!(
        "{}_{}_{}.mp4",
        meta.session_id,
        meta.camera_type.as_str(),
        Utc::now().timestamp_millis()
    );

    let record_id = Uuid::now_v7();
    let record = video_record::ActiveModel {
        id: Set(record_id),
        session_id: Set(meta.session_id.clone()),
        camera_type: Set(meta.camera_type.as_str().to_string()),
        user_id: Set(meta.user_id.clone()),
        election_id: Set(meta.election_id.clone()),
        file_name: Set(stored_name.clone()),
        file_id: Set(None),
        status: Set(VideoStatus::Recording.as_str().to_string()),
        created_at: Set(Utc::now()),
    };
    record.insert(db).await?;

    match stream_to_store(store, &stored_name, &meta, source, declared_length).await {
        Ok(file) => {
            let update = video_record::ActiveModel {
                id: Set(record_id),
                file_id: Set(Some(file.id.to_string())),
                status: Set(VideoStatus::Completed.as_str().to_string()),
                ..Default::default()
            };
            let record = update.update(db).await?;
            Ok(UploadedVideo { record, file })
        }
        Err(err) => {
            let update = video_record::ActiveModel {
                id: Set(record_id),
                status: Set(VideoStatus::Failed.as_str().to_string()),
                ..Default::default()
            };
            if let Err(db_err) = update.update(db).await {
                tracing::error!(
                    video_id = %record_id,
                    error = %db_err,
                    "failed to mark video record as failed"
                );
            }
            Err(err.into())
        }
    }
}

async fn stream_to_store(
    store: &ChunkedBlobStore,
    stored_name: &str,
    meta: &VideoMetadata,
    mut source: impl AsyncRead + Unpin,
    declared_length: Option<u64>,
) -> Result<BlobFile, StorageError> {
    let metadata = serde_json::to_value(meta)
        .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let mut upload = store
        .open_upload_stream(stored_name, metadata, declared_length)
        .await?;

    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                upload.abort().await;
                return Err(e.into());
            }
        };
        upload.write(&buf[..n]).await?;
    }

    upload.close().await
}

/// Resolve the newest completed recording for a (session, camera) pair
/// and open a download stream on its blob.
///
/// `recording` and `failed` records are not retrievable. A completed
/// record whose blob is gone is a referential-integrity violation:
/// logged as an anomaly and surfaced, never silently substituted.
pub async fn fetch_video(
    db: &DatabaseConnection,
    store: &ChunkedBlobStore,
    session_id: &str,
    camera_type: CameraType,
) -> Result<FetchedVideo, AppError> {
    let record = video_record::Entity::find()
        .filter(video_record::Column::SessionId.eq(session_id))
        .filter(video_record::Column::CameraType.eq(camera_type.as_str()))
        .filter(video_record::Column::Status.eq(VideoStatus::Completed.as_str()))
        // Duplicate completed records: last write wins. `created_at`
        // has millisecond precision, so ties break on the
        // time-ordered UUIDv7 id.
        .order_by_desc(video_record::Column::CreatedAt)
        .order_by_desc(video_record::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))?;

    let file_id = record
        .file_id
        .as_deref()
        .and_then(|s| BlobId::parse(s).ok())
        .ok_or_else(|| {
            tracing::warn!(
                video_id = %record.id,
                session_id,
                camera_type = camera_type.as_str(),
                "completed video record has no usable blob id"
            );
            AppError::Integrity("Video record has no stored file".into())
        })?;

    let stream = match store.open_download_stream(file_id).await {
        Ok(stream) => stream,
        Err(StorageError::NotFound(_)) => {
            tracing::warn!(
                video_id = %record.id,
                blob_id = %file_id,
                session_id,
                camera_type = camera_type.as_str(),
                "completed video record references a missing blob"
            );
            return Err(AppError::Integrity(
                "Video file missing from blob store".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let file = stream.file().clone();
    let metadata: Option<VideoMetadata> = serde_json::from_value(file.metadata.clone()).ok();
    let content_type = metadata
        .as_ref()
        .map(|m| m.mime_type.clone())
        .or_else(|| {
            mime_guess::from_path(&file.filename)
                .first()
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".into());
    let filename = metadata
        .map(|m| m.original_name)
        .unwrap_or_else(|| file.filename.clone());

    Ok(FetchedVideo {
        file,
        stream,
        content_type,
        filename,
    })
}
