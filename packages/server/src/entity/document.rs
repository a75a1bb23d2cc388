use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: String,

    /// One of the `DocumentType` values.
    pub document_type: String,

    pub file_name: String,

    /// Base64-encoded file content. Documents are small objects and
    /// stored inline, bypassing the chunked blob store.
    #[sea_orm(column_type = "Text")]
    pub file: String,

    /// Decoded size in bytes.
    pub file_size: i64,

    pub mime_type: Option<String>,

    pub uploaded_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
