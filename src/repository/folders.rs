use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{CreateFolderRequest, Folder, UpdateFolderRequest};

#[async_trait]
pub trait FolderRepository: Send + Sync {
    async fn insert(&self, owner_id: Uuid, folder: &CreateFolderRequest) -> Result<Folder>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Folder>>;

    async fn list(&self) -> Result<Vec<Folder>>;

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Folder>>;

    /// Patch scoped to `id AND owner_id`; `None` when the row is missing or
    /// owned by someone else.
    async fn apply_patch(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &UpdateFolderRequest,
    ) -> Result<Option<Folder>>;

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool>;
}

const FOLDER_COLUMNS: &str = "id, name, description, tags, owner_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgFolderRepository {
    pool: PgPool,
}

impl PgFolderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn insert(&self, owner_id: Uuid, folder: &CreateFolderRequest) -> Result<Folder> {
        let sql = format!(
            "INSERT INTO folders (name, description, tags, owner_id) \
             VALUES ($1, COALESCE($2, ''), COALESCE($3, ARRAY[]::TEXT[]), $4) \
             RETURNING {FOLDER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Folder>(&sql)
            .bind(&folder.name)
            .bind(&folder.description)
            .bind(&folder.tags)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1");
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(folder)
    }

    async fn list(&self) -> Result<Vec<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders ORDER BY created_at DESC");
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(folders)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(folders)
    }

    async fn apply_patch(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &UpdateFolderRequest,
    ) -> Result<Option<Folder>> {
        if patch.is_empty() {
            let sql =
                format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1 AND owner_id = $2");
            let folder = sqlx::query_as::<_, Folder>(&sql)
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?;
            return Ok(folder);
        }

        let mut qb: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("UPDATE folders SET updated_at = NOW()");
        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(tags) = &patch.tags {
            qb.push(", tags = ").push_bind(tags);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" AND owner_id = ").push_bind(owner_id);
        qb.push(format!(" RETURNING {FOLDER_COLUMNS}"));

        let folder = qb
            .build_query_as::<Folder>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(folder)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
