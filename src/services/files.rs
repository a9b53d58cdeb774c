use std::sync::Arc;

use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{
    CreateFileRequest, FileAccessEntry, FileRecord, FileVisibility, UpdateFileRequest,
};
use crate::repository::{FileRepository, NewFile};
use crate::services::storage::{FileStorageService, StorageBucket};

#[derive(Clone)]
pub struct FileService {
    repo: Arc<dyn FileRepository>,
    storage: FileStorageService,
}

impl FileService {
    pub fn new(repo: Arc<dyn FileRepository>, storage: FileStorageService) -> Self {
        Self { repo, storage }
    }

    /// Registers metadata for a file whose bytes already live somewhere.
    pub async fn create_file(&self, owner_id: Uuid, request: CreateFileRequest) -> Result<FileRecord> {
        if request.name.trim().is_empty() {
            return Err(AppError::InvalidInput("file name is required".to_string()));
        }

        let new_file = NewFile {
            name: request.name,
            mime_type: request
                .mime_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size_bytes: request.size_bytes.unwrap_or(0),
            url: request.url,
            folder_id: request.folder_id,
            visibility: request.visibility,
            owner_id,
        };

        self.insert(&new_file).await
    }

    /// Pushes the bytes to the MIME-selected bucket, then records the file
    /// with the returned public URL.
    pub async fn upload_file(
        &self,
        owner_id: Uuid,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
        folder_id: Option<Uuid>,
        visibility: Option<FileVisibility>,
    ) -> Result<(FileRecord, StorageBucket)> {
        let size_bytes = bytes.len() as i64;
        let stored = self.storage.upload(owner_id, file_name, mime_type, bytes).await?;

        let new_file = NewFile {
            name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes,
            url: stored.url,
            folder_id,
            visibility,
            owner_id,
        };

        let record = self.insert(&new_file).await?;
        Ok((record, stored.bucket))
    }

    async fn insert(&self, new_file: &NewFile) -> Result<FileRecord> {
        match self.repo.insert(new_file).await {
            Ok(file) => Ok(file),
            Err(AppError::Database(e)) => Err(AppError::already_exists_on_conflict(e, "file")),
            Err(e) => Err(e),
        }
    }

    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        self.repo.list().await
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<FileRecord>> {
        self.repo.list_for_owner(owner_id).await
    }

    pub async fn get_file(&self, id: Uuid) -> Result<(FileRecord, Vec<FileAccessEntry>)> {
        let file = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("file"))?;
        let access = self.repo.list_access(id).await?;

        Ok((file, access))
    }

    pub async fn update_file(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: UpdateFileRequest,
    ) -> Result<FileRecord> {
        match self.repo.apply_patch(id, owner_id, &patch).await {
            Ok(Some(file)) => Ok(file),
            Ok(None) => Err(AppError::NotFound("file")),
            Err(AppError::Database(e)) => Err(AppError::already_exists_on_conflict(e, "file")),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_file(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        if self.repo.delete(id, owner_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("file"))
        }
    }

    /// Only the owner can grant access to their file.
    pub async fn grant_access(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
        user_id: Uuid,
        can_edit: bool,
    ) -> Result<FileAccessEntry> {
        self.repo
            .find_owned(file_id, owner_id)
            .await?
            .ok_or(AppError::NotFound("file"))?;

        self.repo.grant_access(file_id, user_id, can_edit).await
    }
}
