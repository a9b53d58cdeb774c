use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub admin_email: String,
    pub mail: Option<MailConfig>,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub admin_mailbox: String,
    pub password: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a number")?,
            jwt_secret: env::var("JWT_KEY").unwrap_or_else(|_| "insecure-dev-key".to_string()),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_default(),
            mail: MailConfig::from_env(),
            storage: StorageConfig {
                base_url: env::var("STORAGE_URL")
                    .unwrap_or_else(|_| "http://localhost:54321".to_string()),
                api_key: env::var("STORAGE_KEY").unwrap_or_default(),
            },
        })
    }
}

impl MailConfig {
    /// Mail is optional at startup: without a mailbox and password the
    /// notification subsystem stays disabled and signups still succeed.
    fn from_env() -> Option<Self> {
        let admin_mailbox = env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty())?;
        let password = env::var("ACCOUNT_PASSWORD").ok().filter(|v| !v.is_empty())?;

        Some(MailConfig {
            admin_mailbox,
            password,
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            from_name: env::var("FROM_NAME").unwrap_or_else(|_| "CalShare Admin".to_string()),
        })
    }
}
