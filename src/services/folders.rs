use std::sync::Arc;

use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{CreateFolderRequest, Folder, UpdateFolderRequest};
use crate::repository::FolderRepository;

#[derive(Clone)]
pub struct FolderService {
    repo: Arc<dyn FolderRepository>,
}

impl FolderService {
    pub fn new(repo: Arc<dyn FolderRepository>) -> Self {
        Self { repo }
    }

    /// Creation leans on the (owner, name) unique index: a violation is the
    /// only signal for a duplicate.
    pub async fn create_folder(
        &self,
        owner_id: Uuid,
        request: CreateFolderRequest,
    ) -> Result<Folder> {
        if request.name.trim().is_empty() {
            return Err(AppError::InvalidInput("folder name is required".to_string()));
        }

        match self.repo.insert(owner_id, &request).await {
            Ok(folder) => Ok(folder),
            Err(AppError::Database(e)) => Err(AppError::already_exists_on_conflict(e, "folder")),
            Err(e) => Err(e),
        }
    }

    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        self.repo.list().await
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Folder>> {
        self.repo.list_for_owner(owner_id).await
    }

    pub async fn get_folder(&self, id: Uuid) -> Result<Folder> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("folder"))
    }

    /// Ownership is checked by scoping the update to `id AND owner_id`;
    /// someone else's folder looks exactly like a missing one.
    pub async fn update_folder(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: UpdateFolderRequest,
    ) -> Result<Folder> {
        match self.repo.apply_patch(id, owner_id, &patch).await {
            Ok(Some(folder)) => Ok(folder),
            Ok(None) => Err(AppError::NotFound("folder")),
            Err(AppError::Database(e)) => Err(AppError::already_exists_on_conflict(e, "folder")),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_folder(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        if self.repo.delete(id, owner_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("folder"))
        }
    }
}
