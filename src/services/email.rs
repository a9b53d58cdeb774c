use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::MailConfig;
use crate::errors::{AppError, Result};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE: Duration = Duration::from_secs(2);
const QUEUE_DEPTH: usize = 64;

/// A queued verification email. Carries everything the worker needs so it
/// never has to read the database.
#[derive(Debug, Clone)]
pub struct EmailJob {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        // Fail fast at construction when the mailbox is unusable.
        config
            .admin_mailbox
            .parse::<Address>()
            .map_err(|_| AppError::Mail(format!("invalid admin mailbox: {}", config.admin_mailbox)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Mail(format!("SMTP relay setup failed: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.admin_mailbox.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: format!("{} <{}>", config.from_name, config.admin_mailbox),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| AppError::Mail(format!("bad sender: {}", e)))?)
            .to(to.parse().map_err(|e| AppError::Mail(format!("bad recipient: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| AppError::Mail(format!("failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(format!("send failed: {}", e)))?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub fn from_config(config: &MailConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(SmtpMailer::new(config)?)))
    }

    fn validate_job(job: &EmailJob) -> Result<()> {
        if job.email.parse::<Address>().is_err() {
            return Err(AppError::InvalidInput(format!(
                "invalid email address: {}",
                job.email
            )));
        }
        if job.code.len() != 4 || !job.code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::InvalidInput(
                "verification code must be 4 digits".to_string(),
            ));
        }
        Ok(())
    }

    /// Delivers a verification email with up to three attempts and linear
    /// backoff (2 s, 4 s). Returns the last error when every attempt fails.
    pub async fn send_verification_email(&self, job: &EmailJob) -> Result<()> {
        Self::validate_job(job)?;

        if Utc::now() > job.expires_at {
            tracing::warn!(email = %job.email, "verification code expired before send");
            return Err(AppError::CodeExpired);
        }

        let subject = "CalShare - Email Verification Code";
        let body = verification_body(&job.username, &job.code);

        let mut last_err = AppError::Mail("no attempt made".to_string());
        for attempt in 1..=MAX_ATTEMPTS {
            match self.mailer.send(&job.email, subject, body.clone()).await {
                Ok(()) => {
                    tracing::info!(email = %job.email, attempt, "verification email sent");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(email = %job.email, attempt, error = %e, "email send attempt failed");
                    last_err = e;
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_BASE * attempt).await;
                    }
                }
            }
        }

        tracing::error!(email = %job.email, "failed to send verification email after {} attempts", MAX_ATTEMPTS);
        Err(last_err)
    }
}

/// Starts the delivery worker and hands back the bounded submission queue.
/// Jobs run to completion regardless of what happens to the request that
/// queued them.
pub fn spawn_email_worker(service: EmailService) -> (mpsc::Sender<EmailJob>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<EmailJob>(QUEUE_DEPTH);

    let handle = tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let user_id = job.user_id;
            if let Err(e) = service.send_verification_email(&job).await {
                tracing::error!(%user_id, error = %e, "verification email delivery failed");
            }
        }
        tracing::debug!("email worker shutting down");
    });

    (tx, handle)
}

fn verification_body(username: &str, code: &str) -> String {
    format!(
        "<html><body>\
         <h2>Hello {username}!</h2>\
         <p>Thank you for signing up with CalShare. To complete your registration, \
         please use the verification code below:</p>\
         <p style=\"font-size:24px;font-weight:bold;letter-spacing:3px\">{code}</p>\
         <p>This code will expire in 15 minutes.</p>\
         <p>If you didn't request this verification, please ignore this email.</p>\
         </body></html>"
    )
}
