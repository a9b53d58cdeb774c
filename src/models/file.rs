use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileVisibility {
    Private,
    Shared,
    Public,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub folder_id: Option<Uuid>,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub visibility: FileVisibility,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user grant on a shared file.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FileAccessEntry {
    pub id: Uuid,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub can_edit: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    pub name: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub url: String,
    pub folder_id: Option<Uuid>,
    pub visibility: Option<FileVisibility>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateFileRequest {
    pub name: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub folder_id: Option<Uuid>,
    pub visibility: Option<FileVisibility>,
}

impl UpdateFileRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.mime_type.is_none()
            && self.size_bytes.is_none()
            && self.folder_id.is_none()
            && self.visibility.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct GrantAccessRequest {
    pub user_id: Uuid,
    pub can_edit: Option<bool>,
}
