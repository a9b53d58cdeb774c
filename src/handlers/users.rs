use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::JwtService,
    errors::{AppError, Result},
    handlers::AppState,
    middleware::{AdminUser, AuthenticatedUser},
    models::{
        AuthResponse, CreateUserRequest, LoginRequest, ResendVerificationRequest,
        UpdateUserRequest, UserResponse, VerifyRequest,
    },
};

pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let user = state.users.create_user(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": UserResponse::from(user),
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = state.users.login(&request.email, &request.password).await?;

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let access_token = jwt_service.generate_token(user.id, &user.email)?;

    let response = AuthResponse {
        access_token,
        user: UserResponse::from(user),
    };

    Ok(Json(json!({
        "success": true,
        "data": response,
    })))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let users: Vec<UserResponse> = state
        .users
        .list_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "users": users,
    })))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let user = state.users.get_user(id).await?;

    Ok(Json(json!({
        "success": true,
        "user": UserResponse::from(user),
    })))
}

pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateUserRequest>,
) -> Result<Json<serde_json::Value>> {
    if !caller.can_act_on(id) {
        return Err(AppError::Forbidden);
    }

    let user = state.users.update_user(id, patch).await?;

    Ok(Json(json!({
        "success": true,
        "user": UserResponse::from(user),
    })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    if !caller.can_act_on(id) {
        return Err(AppError::Forbidden);
    }

    state.users.delete_user(id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    })))
}

pub async fn list_deleted_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<serde_json::Value>> {
    let users: Vec<UserResponse> = state
        .users
        .list_deleted()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "users": users,
    })))
}

pub async fn restore_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let user = state.users.restore_user(id).await?;

    Ok(Json(json!({
        "success": true,
        "user": UserResponse::from(user),
    })))
}

pub async fn purge_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.users.purge_user(id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User permanently deleted",
    })))
}

pub async fn verify_user(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = state.users.verify_user(&request.email, &request.code).await?;

    Ok(Json(json!({
        "success": true,
        "user": UserResponse::from(user),
    })))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    Json(request): Json<ResendVerificationRequest>,
) -> Result<Json<serde_json::Value>> {
    state.users.resend_verification(&request.email).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Verification email queued",
    })))
}
