use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use calshare_server::{
    config::Config,
    create_app,
    db::Database,
    handlers::AppState,
    repository::{PgFileRepository, PgFolderRepository, PgUserRepository},
    services::{
        spawn_email_worker, EmailService, FileService, FileStorageService, FolderService,
        HttpObjectStore, UserService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let database = Database::new(&config.database_url)
        .await
        .context("failed to connect to database")?;
    database.migrate().await.context("failed to run migrations")?;
    tracing::info!("connected to database");

    // Mail is optional: without it signups still succeed, delivery is skipped.
    let email_queue = match &config.mail {
        Some(mail_config) => match EmailService::from_config(mail_config) {
            Ok(service) => {
                let (tx, _handle) = spawn_email_worker(service);
                tracing::info!("email worker started");
                Some(tx)
            }
            Err(e) => {
                tracing::warn!(error = %e, "email service unavailable, continuing without it");
                None
            }
        },
        None => {
            tracing::warn!("mail credentials not configured, verification emails disabled");
            None
        }
    };

    let pool = database.pool().clone();
    let storage = FileStorageService::new(Arc::new(HttpObjectStore::new(&config.storage)));

    let state = AppState {
        users: UserService::new(
            Arc::new(PgUserRepository::new(pool.clone())),
            email_queue,
            config.admin_email.clone(),
        ),
        folders: FolderService::new(Arc::new(PgFolderRepository::new(pool.clone()))),
        files: FileService::new(Arc::new(PgFileRepository::new(pool)), storage),
        config: config.clone(),
    };

    let app = create_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
