use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video_record")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Proctoring session this recording belongs to.
    pub session_id: String,

    /// Camera angle: "front" or "rear".
    pub camera_type: String,

    pub user_id: String,
    pub election_id: String,

    /// Filename the blob was stored under.
    pub file_name: String,

    /// Blob store file id. Set once the upload finalizes; a weak
    /// reference, the blob store owns the content.
    pub file_id: Option<String>,

    /// Upload lifecycle: "recording", "completed" or "failed".
    /// Terminal states are never left; failed rows stay for audit.
    pub status: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
