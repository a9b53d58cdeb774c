use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{auth::JwtService, handlers::AppState, models::UserRole};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Owners may act on their own account; admins on anyone's.
    pub fn can_act_on(&self, user_id: Uuid) -> bool {
        self.id == user_id || self.is_admin()
    }
}

/// Admin-gated variant; rejects with 403 for ordinary users.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "error": message})),
    )
        .into_response()
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        // Bearer token in the Authorization header, with the legacy bare
        // `token` header as a fallback.
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .or_else(|| {
                parts
                    .headers
                    .get("token")
                    .and_then(|header| header.to_str().ok())
            })
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let jwt_service = JwtService::new(&state.config.jwt_secret);
        let claims = jwt_service
            .verify_token(token)
            .map_err(|_| unauthorized("Invalid token"))?;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| unauthorized("Invalid token"))?;

        let admin_email = &state.config.admin_email;
        let role = if !admin_email.is_empty() && claims.email.eq_ignore_ascii_case(admin_email) {
            UserRole::Admin
        } else {
            UserRole::User
        };

        Ok(AuthenticatedUser {
            id,
            email: claims.email,
            role,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err((
                StatusCode::FORBIDDEN,
                Json(json!({"success": false, "error": "Admin access required"})),
            )
                .into_response());
        }

        Ok(AdminUser(user))
    }
}
