use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    errors::Result,
    handlers::AppState,
    middleware::AuthenticatedUser,
    models::{CreateFolderRequest, UpdateFolderRequest},
};

pub async fn create_folder(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(request): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let folder = state.folders.create_folder(caller.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "folder": folder,
        })),
    ))
}

pub async fn list_folders(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let folders = state.folders.list_folders().await?;

    Ok(Json(json!({
        "success": true,
        "folders": folders,
    })))
}

pub async fn get_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let folder = state.folders.get_folder(id).await?;

    Ok(Json(json!({
        "success": true,
        "folder": folder,
    })))
}

pub async fn update_folder(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateFolderRequest>,
) -> Result<Json<serde_json::Value>> {
    let folder = state.folders.update_folder(caller.id, id, patch).await?;

    Ok(Json(json!({
        "success": true,
        "folder": folder,
    })))
}

pub async fn delete_folder(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.folders.delete_folder(caller.id, id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Folder deleted successfully",
    })))
}
