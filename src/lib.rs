use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;

use handlers::{files, folders, health, users, AppState};

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/user", post(users::create_user).get(users::list_users))
        .route("/user/login", post(users::login))
        .route("/user/deleted", get(users::list_deleted_users))
        .route("/user/verify", post(users::verify_user))
        .route("/user/resend-verification", post(users::resend_verification))
        .route(
            "/user/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/user/:id/restore", post(users::restore_user))
        .route("/user/:id/permanent", delete(users::purge_user))
        .route(
            "/folder",
            post(folders::create_folder).get(folders::list_folders),
        )
        .route(
            "/folder/:id",
            get(folders::get_folder)
                .patch(folders::update_folder)
                .delete(folders::delete_folder),
        )
        .route("/file", post(files::create_file).get(files::list_files))
        .route("/file/upload", post(files::upload_file))
        .route(
            "/file/:id",
            get(files::get_file)
                .patch(files::update_file)
                .delete(files::delete_file),
        )
        .route("/file/:id/access", post(files::grant_access))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
