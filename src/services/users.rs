use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::PasswordService;
use crate::errors::{AppError, Result};
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserRole};
use crate::repository::{NewUser, UserRepository};
use crate::services::email::EmailJob;

const CODE_TTL_MINUTES: i64 = 15;

/// User lifecycle: signup (with soft-delete reactivation), verification,
/// soft delete / restore / purge, sparse profile updates.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    email_queue: Option<mpsc::Sender<EmailJob>>,
    admin_email: String,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        email_queue: Option<mpsc::Sender<EmailJob>>,
        admin_email: String,
    ) -> Self {
        Self {
            repo,
            email_queue,
            admin_email,
        }
    }

    /// Creates an account, or reactivates a soft-deleted one with the same
    /// email in place. An active duplicate is `AlreadyExists`; for fresh
    /// inserts the partial unique index has the final say.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        if request.username.trim().is_empty() || request.country.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "username and country are required".to_string(),
            ));
        }
        if !request.email.contains('@') {
            return Err(AppError::InvalidInput("Invalid email format".to_string()));
        }
        PasswordService::validate_password_strength(&request.password)?;

        let custom_link = request.custom_link.clone().or_else(|| {
            Some(format!(
                "{}-{}",
                request.username.split_whitespace().next().unwrap_or(""),
                request.email.split('@').next().unwrap_or("")
            ))
        });

        // Role is decided once, at creation, from the configured admin address.
        let role = if !self.admin_email.is_empty()
            && request.email.eq_ignore_ascii_case(&self.admin_email)
        {
            UserRole::Admin
        } else {
            UserRole::User
        };

        let new_user = NewUser {
            username: request.username,
            email: request.email,
            password_hash: PasswordService::hash_password(&request.password)?,
            profile_url: request.profile_url,
            country: request.country,
            pronouns: request.pronouns,
            custom_link,
            role,
        };

        let user = match self.repo.find_by_email(&new_user.email, true).await? {
            Some(existing) if existing.is_deleted() => {
                match self.repo.reactivate(existing.id, &new_user).await {
                    Ok(Some(user)) => user,
                    Ok(None) => return Err(AppError::AlreadyExists("user")),
                    Err(AppError::Database(e)) => {
                        return Err(AppError::already_exists_on_conflict(e, "user"))
                    }
                    Err(e) => return Err(e),
                }
            }
            Some(_) => return Err(AppError::AlreadyExists("user")),
            None => match self.repo.insert(&new_user).await {
                Ok(user) => user,
                Err(AppError::Database(e)) => {
                    return Err(AppError::already_exists_on_conflict(e, "user"))
                }
                Err(e) => return Err(e),
            },
        };

        self.issue_verification(user).await
    }

    /// Persists a fresh code+expiry and queues the notification. Delivery
    /// problems are logged, never surfaced: signup succeeds without email.
    async fn issue_verification(&self, mut user: User) -> Result<User> {
        let code = generate_verify_code();
        let expiry = Utc::now() + Duration::minutes(CODE_TTL_MINUTES);
        self.repo.set_verification_code(user.id, &code, expiry).await?;

        user.verify_code = Some(code.clone());
        user.code_expiry = Some(expiry);
        user.is_verified = false;

        match &self.email_queue {
            Some(queue) => {
                let job = EmailJob {
                    user_id: user.id,
                    username: user.username.clone(),
                    email: user.email.clone(),
                    code,
                    expires_at: expiry,
                };
                if let Err(e) = queue.try_send(job) {
                    tracing::warn!(email = %user.email, error = %e, "could not queue verification email");
                }
            }
            None => {
                tracing::warn!(email = %user.email, "email service not configured, verification email skipped");
            }
        }

        Ok(user)
    }

    /// One-way transition to verified. Succeeds as a no-op when already
    /// verified; otherwise the code must match and still be live.
    pub async fn verify_user(&self, email: &str, code: &str) -> Result<User> {
        let mut user = self
            .repo
            .find_by_email(email, false)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        if user.is_verified {
            return Ok(user);
        }

        if user.verify_code.as_deref() != Some(code) {
            return Err(AppError::InvalidCode);
        }

        match user.code_expiry {
            Some(expiry) if Utc::now() <= expiry => {}
            _ => return Err(AppError::CodeExpired),
        }

        self.repo.mark_verified(user.id).await?;
        user.is_verified = true;
        user.verify_code = None;
        user.code_expiry = None;

        tracing::info!(email = %user.email, "user verified");
        Ok(user)
    }

    pub async fn resend_verification(&self, email: &str) -> Result<()> {
        let user = self
            .repo
            .find_by_email(email, false)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        if user.is_verified {
            return Err(AppError::AlreadyVerified);
        }

        let queue = self
            .email_queue
            .as_ref()
            .ok_or(AppError::ServiceUnavailable("email service"))?;

        let code = generate_verify_code();
        let expiry = Utc::now() + Duration::minutes(CODE_TTL_MINUTES);
        self.repo.set_verification_code(user.id, &code, expiry).await?;

        let job = EmailJob {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            code,
            expires_at: expiry,
        };
        queue
            .try_send(job)
            .map_err(|_| AppError::ServiceUnavailable("email service"))?;

        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let user = self
            .repo
            .find_by_email(email, false)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !PasswordService::verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.repo.list_active().await
    }

    pub async fn list_deleted(&self) -> Result<Vec<User>> {
        self.repo.list_deleted().await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        self.repo
            .find_by_id(id, false)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    /// Sparse update: only the non-null fields of the patch are applied.
    /// Renaming onto another active user's username or custom link trips the
    /// partial unique index and surfaces as `AlreadyExists`.
    pub async fn update_user(&self, id: Uuid, patch: UpdateUserRequest) -> Result<User> {
        match self.repo.apply_patch(id, &patch).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AppError::NotFound("user")),
            Err(AppError::Database(e)) => Err(AppError::already_exists_on_conflict(e, "user")),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        if self.repo.soft_delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("user"))
        }
    }

    pub async fn restore_user(&self, id: Uuid) -> Result<User> {
        self.repo
            .restore(id)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn purge_user(&self, id: Uuid) -> Result<()> {
        if self.repo.hard_delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("user"))
        }
    }
}

fn generate_verify_code() -> String {
    format!("{:04}", rand::thread_rng().gen_range(0..10_000))
}
