use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "pronouns")]
pub enum Pronouns {
    #[sqlx(rename = "he/him")]
    #[serde(rename = "he/him")]
    HeHim,
    #[sqlx(rename = "she/her")]
    #[serde(rename = "she/her")]
    SheHer,
    #[sqlx(rename = "they/them")]
    #[serde(rename = "they/them")]
    TheyThem,
    #[sqlx(rename = "other")]
    #[serde(rename = "other")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "date_format")]
pub enum DateFormat {
    #[sqlx(rename = "DD/MM/YYYY")]
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
    #[sqlx(rename = "MM/DD/YYYY")]
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYear,
    #[sqlx(rename = "YYYY-MM-DD")]
    #[serde(rename = "YYYY-MM-DD")]
    YearMonthDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "time_format")]
pub enum TimeFormat {
    #[sqlx(rename = "12h")]
    #[serde(rename = "12h")]
    TwelveHour,
    #[sqlx(rename = "24h")]
    #[serde(rename = "24h")]
    TwentyFourHour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Soft deletion is an explicit tagged state, not a nullable timestamp;
/// repository lookups take an `include_deleted` flag instead of rewriting
/// queries behind the caller's back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Deleted,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_url: Option<String>,
    pub country: String,
    pub welcome_message: String,
    pub timezone: String,
    pub pronouns: Pronouns,
    pub date_format: DateFormat,
    pub time_format: TimeFormat,
    pub custom_link: Option<String>,
    pub quota_bytes: i64,
    pub used_bytes: i64,
    pub role: UserRole,
    pub is_verified: bool,
    pub verify_code: Option<String>,
    pub code_expiry: Option<DateTime<Utc>>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.status == AccountStatus::Deleted
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub country: String,
    pub profile_url: Option<String>,
    pub pronouns: Option<Pronouns>,
    pub custom_link: Option<String>,
}

/// Sparse profile patch: only present fields are applied. Password, role and
/// verification state are never reachable through this request.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub profile_url: Option<String>,
    pub custom_link: Option<String>,
    pub country: Option<String>,
    pub welcome_message: Option<String>,
    pub timezone: Option<String>,
    pub pronouns: Option<Pronouns>,
    pub date_format: Option<DateFormat>,
    pub time_format: Option<TimeFormat>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.profile_url.is_none()
            && self.custom_link.is_none()
            && self.country.is_none()
            && self.welcome_message.is_none()
            && self.timezone.is_none()
            && self.pronouns.is_none()
            && self.date_format.is_none()
            && self.time_format.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile_url: Option<String>,
    pub country: String,
    pub welcome_message: String,
    pub timezone: String,
    pub pronouns: Pronouns,
    pub date_format: DateFormat,
    pub time_format: TimeFormat,
    pub custom_link: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            profile_url: user.profile_url,
            country: user.country,
            welcome_message: user.welcome_message,
            timezone: user.timezone,
            pronouns: user.pronouns,
            date_format: user.date_format,
            time_format: user.time_format,
            custom_link: user.custom_link,
            role: user.role,
            is_verified: user.is_verified,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserResponse,
}
