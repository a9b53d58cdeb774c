use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{FileAccessEntry, FileRecord, FileVisibility, UpdateFileRequest};

/// Everything needed to persist an uploaded or registered file.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub folder_id: Option<Uuid>,
    pub visibility: Option<FileVisibility>,
    pub owner_id: Uuid,
}

#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn insert(&self, file: &NewFile) -> Result<FileRecord>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>>;

    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<FileRecord>>;

    async fn list(&self) -> Result<Vec<FileRecord>>;

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<FileRecord>>;

    async fn apply_patch(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &UpdateFileRequest,
    ) -> Result<Option<FileRecord>>;

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool>;

    async fn grant_access(
        &self,
        file_id: Uuid,
        user_id: Uuid,
        can_edit: bool,
    ) -> Result<FileAccessEntry>;

    async fn list_access(&self, file_id: Uuid) -> Result<Vec<FileAccessEntry>>;
}

const FILE_COLUMNS: &str =
    "id, folder_id, name, mime_type, size_bytes, url, visibility, owner_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn insert(&self, file: &NewFile) -> Result<FileRecord> {
        let sql = format!(
            "INSERT INTO files (name, mime_type, size_bytes, url, folder_id, visibility, owner_id) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'private'::file_visibility), $7) \
             RETURNING {FILE_COLUMNS}"
        );
        let created = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(&file.name)
            .bind(&file.mime_type)
            .bind(file.size_bytes)
            .bind(&file.url)
            .bind(file.folder_id)
            .bind(file.visibility)
            .bind(file.owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = $1");
        let file = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(file)
    }

    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = $1 AND owner_id = $2");
        let file = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(file)
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files ORDER BY created_at DESC");
        let files = sqlx::query_as::<_, FileRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(files)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        let files = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(files)
    }

    async fn apply_patch(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &UpdateFileRequest,
    ) -> Result<Option<FileRecord>> {
        if patch.is_empty() {
            return self.find_owned(id, owner_id).await;
        }

        let mut qb: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("UPDATE files SET updated_at = NOW()");
        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(mime_type) = &patch.mime_type {
            qb.push(", mime_type = ").push_bind(mime_type);
        }
        if let Some(size_bytes) = patch.size_bytes {
            qb.push(", size_bytes = ").push_bind(size_bytes);
        }
        if let Some(folder_id) = patch.folder_id {
            qb.push(", folder_id = ").push_bind(folder_id);
        }
        if let Some(visibility) = patch.visibility {
            qb.push(", visibility = ").push_bind(visibility);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" AND owner_id = ").push_bind(owner_id);
        qb.push(format!(" RETURNING {FILE_COLUMNS}"));

        let file = qb
            .build_query_as::<FileRecord>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(file)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn grant_access(
        &self,
        file_id: Uuid,
        user_id: Uuid,
        can_edit: bool,
    ) -> Result<FileAccessEntry> {
        let entry = sqlx::query_as::<_, FileAccessEntry>(
            "INSERT INTO file_access (file_id, user_id, can_edit) VALUES ($1, $2, $3) \
             ON CONFLICT (file_id, user_id) DO UPDATE SET can_edit = EXCLUDED.can_edit \
             RETURNING id, file_id, user_id, can_edit, created_at",
        )
        .bind(file_id)
        .bind(user_id)
        .bind(can_edit)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn list_access(&self, file_id: Uuid) -> Result<Vec<FileAccessEntry>> {
        let entries = sqlx::query_as::<_, FileAccessEntry>(
            "SELECT id, file_id, user_id, can_edit, created_at FROM file_access \
             WHERE file_id = $1 ORDER BY created_at",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
