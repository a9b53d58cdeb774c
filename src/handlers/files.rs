use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    middleware::AuthenticatedUser,
    models::{CreateFileRequest, FileVisibility, GrantAccessRequest, UpdateFileRequest},
};

pub async fn create_file(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(request): Json<CreateFileRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let file = state.files.create_file(caller.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "file": file,
        })),
    ))
}

/// Multipart upload: a required `file` part plus optional `folder_id` and
/// `visibility` text parts.
pub async fn upload_file(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut mime_type: Option<String> = None;
    let mut folder_id: Option<Uuid> = None;
    let mut visibility: Option<FileVisibility> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().map(|s| s.to_string());
                mime_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("failed to read file: {}", e)))?;
                file_data = Some(bytes.to_vec());
            }
            Some("folder_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("invalid folder_id: {}", e)))?;
                folder_id = Some(
                    Uuid::parse_str(&text)
                        .map_err(|_| AppError::InvalidInput("invalid folder_id".to_string()))?,
                );
            }
            Some("visibility") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("invalid visibility: {}", e)))?;
                visibility = Some(match text.as_str() {
                    "private" => FileVisibility::Private,
                    "shared" => FileVisibility::Shared,
                    "public" => FileVisibility::Public,
                    other => {
                        return Err(AppError::InvalidInput(format!(
                            "unknown visibility: {}",
                            other
                        )))
                    }
                });
            }
            _ => {}
        }
    }

    let file_data = file_data
        .ok_or_else(|| AppError::InvalidInput("form field 'file' is missing".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::InvalidInput("file name is required".to_string()))?;
    let mime_type = mime_type.unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

    let (file, bucket) = state
        .files
        .upload_file(caller.id, &file_name, &mime_type, file_data, folder_id, visibility)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "file": file,
            "bucket": bucket.name(),
        })),
    ))
}

pub async fn list_files(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let files = state.files.list_files().await?;

    Ok(Json(json!({
        "success": true,
        "files": files,
    })))
}

pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let (file, access_list) = state.files.get_file(id).await?;

    Ok(Json(json!({
        "success": true,
        "file": file,
        "access_list": access_list,
    })))
}

pub async fn update_file(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateFileRequest>,
) -> Result<Json<serde_json::Value>> {
    let file = state.files.update_file(caller.id, id, patch).await?;

    Ok(Json(json!({
        "success": true,
        "file": file,
    })))
}

pub async fn delete_file(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.files.delete_file(caller.id, id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "File deleted successfully",
    })))
}

pub async fn grant_access(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<GrantAccessRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let entry = state
        .files
        .grant_access(caller.id, id, request.user_id, request.can_edit.unwrap_or(false))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "access": entry,
        })),
    ))
}
