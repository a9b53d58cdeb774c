use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{AccountStatus, Pronouns, UpdateUserRequest, User, UserRole};

/// Fields supplied at signup. Everything else is defaulted by the schema.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_url: Option<String>,
    pub country: String,
    pub pronouns: Option<Pronouns>,
    pub custom_link: Option<String>,
    pub role: UserRole,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new row. A unique-index violation surfaces as a database
    /// error for the caller to map.
    async fn insert(&self, user: &NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str, include_deleted: bool) -> Result<Option<User>>;

    async fn list_active(&self) -> Result<Vec<User>>;

    async fn list_deleted(&self) -> Result<Vec<User>>;

    /// Flips a soft-deleted row back to active, overwriting the mutable
    /// signup fields in place. Returns `None` if no deleted row matches.
    async fn reactivate(&self, id: Uuid, user: &NewUser) -> Result<Option<User>>;

    /// Applies the non-null fields of the patch to an active row.
    async fn apply_patch(&self, id: Uuid, patch: &UpdateUserRequest) -> Result<Option<User>>;

    async fn set_verification_code(
        &self,
        id: Uuid,
        code: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()>;

    /// Clears the code and sets the verified flag.
    async fn mark_verified(&self, id: Uuid) -> Result<()>;

    async fn soft_delete(&self, id: Uuid) -> Result<bool>;

    /// Clears the delete marker; only applies to soft-deleted rows.
    async fn restore(&self, id: Uuid) -> Result<Option<User>>;

    /// Hard row removal regardless of delete-marker state.
    async fn hard_delete(&self, id: Uuid) -> Result<bool>;
}

const USER_COLUMNS: &str = "id, username, email, password_hash, profile_url, country, \
     welcome_message, timezone, pronouns, date_format, time_format, custom_link, \
     quota_bytes, used_bytes, role, is_verified, verify_code, code_expiry, status, \
     created_at, updated_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, profile_url, country, pronouns, custom_link, role) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'other'::pronouns), $7, $8) \
             RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.profile_url)
            .bind(&user.country)
            .bind(user.pronouns)
            .bind(&user.custom_link)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<User>> {
        let sql = if include_deleted {
            format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1")
        } else {
            format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND status = 'active'")
        };
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str, include_deleted: bool) -> Result<Option<User>> {
        let sql = if include_deleted {
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 ORDER BY created_at DESC LIMIT 1")
        } else {
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND status = 'active'")
        };
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_active(&self) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE status = 'active' ORDER BY created_at DESC"
        );
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;

        Ok(users)
    }

    async fn list_deleted(&self) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE status = 'deleted' ORDER BY updated_at DESC"
        );
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;

        Ok(users)
    }

    async fn reactivate(&self, id: Uuid, user: &NewUser) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET status = 'active', username = $2, password_hash = $3, \
             profile_url = $4, country = $5, custom_link = $6, is_verified = FALSE, \
             updated_at = NOW() \
             WHERE id = $1 AND status = 'deleted' \
             RETURNING {USER_COLUMNS}"
        );
        let restored = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.profile_url)
            .bind(&user.country)
            .bind(&user.custom_link)
            .fetch_optional(&self.pool)
            .await?;

        Ok(restored)
    }

    async fn apply_patch(&self, id: Uuid, patch: &UpdateUserRequest) -> Result<Option<User>> {
        if patch.is_empty() {
            return self.find_by_id(id, false).await;
        }

        let mut qb: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("UPDATE users SET updated_at = NOW()");
        if let Some(username) = &patch.username {
            qb.push(", username = ").push_bind(username);
        }
        if let Some(profile_url) = &patch.profile_url {
            qb.push(", profile_url = ").push_bind(profile_url);
        }
        if let Some(custom_link) = &patch.custom_link {
            qb.push(", custom_link = ").push_bind(custom_link);
        }
        if let Some(country) = &patch.country {
            qb.push(", country = ").push_bind(country);
        }
        if let Some(welcome_message) = &patch.welcome_message {
            qb.push(", welcome_message = ").push_bind(welcome_message);
        }
        if let Some(timezone) = &patch.timezone {
            qb.push(", timezone = ").push_bind(timezone);
        }
        if let Some(pronouns) = patch.pronouns {
            qb.push(", pronouns = ").push_bind(pronouns);
        }
        if let Some(date_format) = patch.date_format {
            qb.push(", date_format = ").push_bind(date_format);
        }
        if let Some(time_format) = patch.time_format {
            qb.push(", time_format = ").push_bind(time_format);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" AND status = ").push_bind(AccountStatus::Active);
        qb.push(format!(" RETURNING {USER_COLUMNS}"));

        let user = qb
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn set_verification_code(
        &self,
        id: Uuid,
        code: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET verify_code = $2, code_expiry = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(code)
        .bind(expiry)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE users SET is_verified = TRUE, verify_code = NULL, code_expiry = NULL, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET status = 'deleted', updated_at = NOW() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn restore(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET status = 'active', updated_at = NOW() \
             WHERE id = $1 AND status = 'deleted' \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn hard_delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
