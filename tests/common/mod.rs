#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use calshare_server::auth::JwtService;
use calshare_server::config::{Config, StorageConfig};
use calshare_server::create_app;
use calshare_server::errors::{AppError, Result};
use calshare_server::handlers::AppState;
use calshare_server::models::{
    AccountStatus, CreateFolderRequest, DateFormat, FileAccessEntry, FileRecord, FileVisibility,
    Folder, Pronouns, TimeFormat, UpdateFileRequest, UpdateFolderRequest, UpdateUserRequest, User,
};
use calshare_server::repository::{
    FileRepository, FolderRepository, NewFile, NewUser, UserRepository,
};
use calshare_server::services::{
    EmailJob, FileService, FileStorageService, FolderService, ObjectStore, UserService,
};

pub const ADMIN_EMAIL: &str = "admin@calshare.test";
pub const JWT_SECRET: &str = "test-secret";

// ---------------------------------------------------------------------------
// In-memory repositories

#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUsers {
    pub fn get(&self, id: Uuid) -> Option<User> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn get_by_email(&self, email: &str) -> Option<User> {
        self.rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    pub fn force_expire_code(&self, email: &str) {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.values_mut().find(|u| u.email == email).unwrap();
        user.code_expiry = Some(Utc::now() - chrono::Duration::minutes(1));
    }

    fn materialize(new: &NewUser) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: new.username.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            profile_url: new.profile_url.clone(),
            country: new.country.clone(),
            welcome_message: "Welcome to my scheduling page. Please follow the instructions to add an event to my calendar.".to_string(),
            timezone: "UTC".to_string(),
            pronouns: new.pronouns.unwrap_or(Pronouns::Other),
            date_format: DateFormat::DayMonthYear,
            time_format: TimeFormat::TwentyFourHour,
            custom_link: new.custom_link.clone(),
            quota_bytes: 1 << 30,
            used_bytes: 0,
            role: new.role,
            is_verified: false,
            verify_code: None,
            code_expiry: None,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn insert(&self, user: &NewUser) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        let duplicate = rows.values().any(|u| {
            u.status == AccountStatus::Active
                && (u.email == user.email
                    || u.username == user.username
                    || (u.custom_link.is_some() && u.custom_link == user.custom_link))
        });
        if duplicate {
            return Err(AppError::AlreadyExists("user"));
        }

        let created = Self::materialize(user);
        rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(&id)
            .filter(|u| include_deleted || u.status == AccountStatus::Active)
            .cloned())
    }

    async fn find_by_email(&self, email: &str, include_deleted: bool) -> Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .find(|u| u.email == email && (include_deleted || u.status == AccountStatus::Active))
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|u| u.status == AccountStatus::Active)
            .cloned()
            .collect())
    }

    async fn list_deleted(&self) -> Result<Vec<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|u| u.status == AccountStatus::Deleted)
            .cloned()
            .collect())
    }

    async fn reactivate(&self, id: Uuid, user: &NewUser) -> Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        let collision = rows.values().any(|u| {
            u.id != id
                && u.status == AccountStatus::Active
                && (u.username == user.username
                    || (u.custom_link.is_some() && u.custom_link == user.custom_link))
        });
        if collision {
            return Err(AppError::AlreadyExists("user"));
        }
        let Some(existing) = rows.get_mut(&id) else {
            return Ok(None);
        };
        if existing.status != AccountStatus::Deleted {
            return Ok(None);
        }

        existing.status = AccountStatus::Active;
        existing.username = user.username.clone();
        existing.password_hash = user.password_hash.clone();
        existing.profile_url = user.profile_url.clone();
        existing.country = user.country.clone();
        existing.custom_link = user.custom_link.clone();
        existing.is_verified = false;
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn apply_patch(&self, id: Uuid, patch: &UpdateUserRequest) -> Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        let taken = rows.values().any(|u| {
            u.id != id
                && u.status == AccountStatus::Active
                && (patch.username.as_deref() == Some(u.username.as_str())
                    || (u.custom_link.is_some() && patch.custom_link == u.custom_link))
        });
        if taken {
            return Err(AppError::AlreadyExists("user"));
        }
        let Some(user) = rows.get_mut(&id) else {
            return Ok(None);
        };
        if user.status != AccountStatus::Active {
            return Ok(None);
        }

        if let Some(username) = &patch.username {
            user.username = username.clone();
        }
        if let Some(profile_url) = &patch.profile_url {
            user.profile_url = Some(profile_url.clone());
        }
        if let Some(custom_link) = &patch.custom_link {
            user.custom_link = Some(custom_link.clone());
        }
        if let Some(country) = &patch.country {
            user.country = country.clone();
        }
        if let Some(welcome_message) = &patch.welcome_message {
            user.welcome_message = welcome_message.clone();
        }
        if let Some(timezone) = &patch.timezone {
            user.timezone = timezone.clone();
        }
        if let Some(pronouns) = patch.pronouns {
            user.pronouns = pronouns;
        }
        if let Some(date_format) = patch.date_format {
            user.date_format = date_format;
        }
        if let Some(time_format) = patch.time_format {
            user.time_format = time_format;
        }
        if !patch.is_empty() {
            user.updated_at = Utc::now();
        }
        Ok(Some(user.clone()))
    }

    async fn set_verification_code(
        &self,
        id: Uuid,
        code: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.get_mut(&id) {
            user.verify_code = Some(code.to_string());
            user.code_expiry = Some(expiry);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.get_mut(&id) {
            user.is_verified = true;
            user.verify_code = None;
            user.code_expiry = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(user) if user.status == AccountStatus::Active => {
                user.status = AccountStatus::Deleted;
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restore(&self, id: Uuid) -> Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(user) if user.status == AccountStatus::Deleted => {
                user.status = AccountStatus::Active;
                user.updated_at = Utc::now();
                Ok(Some(user.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn hard_delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.rows.lock().unwrap().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryFolders {
    rows: Mutex<HashMap<Uuid, Folder>>,
}

#[async_trait]
impl FolderRepository for InMemoryFolders {
    async fn insert(&self, owner_id: Uuid, folder: &CreateFolderRequest) -> Result<Folder> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|f| f.owner_id == owner_id && f.name == folder.name)
        {
            return Err(AppError::AlreadyExists("folder"));
        }

        let now = Utc::now();
        let created = Folder {
            id: Uuid::new_v4(),
            name: folder.name.clone(),
            description: folder.description.clone().unwrap_or_default(),
            tags: folder.tags.clone().unwrap_or_default(),
            owner_id,
            created_at: now,
            updated_at: now,
        };
        rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Folder>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Folder>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Folder>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn apply_patch(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &UpdateFolderRequest,
    ) -> Result<Option<Folder>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(folder) = rows.get_mut(&id).filter(|f| f.owner_id == owner_id) else {
            return Ok(None);
        };

        if let Some(name) = &patch.name {
            folder.name = name.clone();
        }
        if let Some(description) = &patch.description {
            folder.description = description.clone();
        }
        if let Some(tags) = &patch.tags {
            folder.tags = tags.clone();
        }
        if !patch.is_empty() {
            folder.updated_at = Utc::now();
        }
        Ok(Some(folder.clone()))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get(&id) {
            Some(folder) if folder.owner_id == owner_id => {
                rows.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryFiles {
    rows: Mutex<HashMap<Uuid, FileRecord>>,
    access: Mutex<HashMap<(Uuid, Uuid), FileAccessEntry>>,
}

#[async_trait]
impl FileRepository for InMemoryFiles {
    async fn insert(&self, file: &NewFile) -> Result<FileRecord> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|f| f.owner_id == file.owner_id && f.name == file.name)
        {
            return Err(AppError::AlreadyExists("file"));
        }

        let now = Utc::now();
        let created = FileRecord {
            id: Uuid::new_v4(),
            folder_id: file.folder_id,
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size_bytes: file.size_bytes,
            url: file.url.clone(),
            visibility: file.visibility.unwrap_or(FileVisibility::Private),
            owner_id: file.owner_id,
            created_at: now,
            updated_at: now,
        };
        rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<FileRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&id)
            .filter(|f| f.owner_id == owner_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<FileRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn apply_patch(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &UpdateFileRequest,
    ) -> Result<Option<FileRecord>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(file) = rows.get_mut(&id).filter(|f| f.owner_id == owner_id) else {
            return Ok(None);
        };

        if let Some(name) = &patch.name {
            file.name = name.clone();
        }
        if let Some(mime_type) = &patch.mime_type {
            file.mime_type = mime_type.clone();
        }
        if let Some(size_bytes) = patch.size_bytes {
            file.size_bytes = size_bytes;
        }
        if let Some(folder_id) = patch.folder_id {
            file.folder_id = Some(folder_id);
        }
        if let Some(visibility) = patch.visibility {
            file.visibility = visibility;
        }
        if !patch.is_empty() {
            file.updated_at = Utc::now();
        }
        Ok(Some(file.clone()))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get(&id) {
            Some(file) if file.owner_id == owner_id => {
                rows.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn grant_access(
        &self,
        file_id: Uuid,
        user_id: Uuid,
        can_edit: bool,
    ) -> Result<FileAccessEntry> {
        let mut access = self.access.lock().unwrap();
        let entry = access
            .entry((file_id, user_id))
            .and_modify(|e| e.can_edit = can_edit)
            .or_insert_with(|| FileAccessEntry {
                id: Uuid::new_v4(),
                file_id,
                user_id,
                can_edit,
                created_at: Utc::now(),
            });
        Ok(entry.clone())
    }

    async fn list_access(&self, file_id: Uuid) -> Result<Vec<FileAccessEntry>> {
        Ok(self
            .access
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.file_id == file_id)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Recording object store

#[derive(Default)]
pub struct RecordingStore {
    pub puts: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<()> {
        self.puts
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), bytes.len()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://storage.test/{bucket}/{key}")
    }
}

// ---------------------------------------------------------------------------
// Test application

pub struct TestApp {
    pub app: Router,
    pub users: Arc<InMemoryUsers>,
    pub folders: Arc<InMemoryFolders>,
    pub files: Arc<InMemoryFiles>,
    pub store: Arc<RecordingStore>,
    pub email_rx: mpsc::Receiver<EmailJob>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::build(true)
    }

    pub fn without_mail() -> Self {
        Self::build(false)
    }

    fn build(with_mail: bool) -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let folders = Arc::new(InMemoryFolders::default());
        let files = Arc::new(InMemoryFiles::default());
        let store = Arc::new(RecordingStore::default());

        let (tx, rx) = mpsc::channel::<EmailJob>(16);
        let email_queue = with_mail.then_some(tx);

        let config = Config {
            database_url: String::new(),
            port: 0,
            jwt_secret: JWT_SECRET.to_string(),
            admin_email: ADMIN_EMAIL.to_string(),
            mail: None,
            storage: StorageConfig {
                base_url: "https://storage.test".to_string(),
                api_key: String::new(),
            },
        };

        let storage = FileStorageService::new(store.clone());
        let state = AppState {
            users: UserService::new(users.clone(), email_queue, ADMIN_EMAIL.to_string()),
            folders: FolderService::new(folders.clone()),
            files: FileService::new(files.clone(), storage),
            config: config.clone(),
        };

        TestApp {
            app: create_app(state),
            users,
            folders,
            files,
            store,
            email_rx: rx,
        }
    }

    pub fn token_for(&self, user_id: Uuid, email: &str) -> String {
        JwtService::new(JWT_SECRET).generate_token(user_id, email).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Request helpers

pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

pub async fn upload(
    app: &Router,
    token: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
    extra_fields: &[(&str, &str)],
) -> (StatusCode, Value) {
    const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

    let mut body = Vec::new();
    for (name, value) in extra_fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/file/upload")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

/// Signs up a user through the API and returns (id, bearer token).
pub async fn signup(app: &TestApp, username: &str, email: &str) -> (Uuid, String) {
    let (status, body) = request(
        &app.app,
        "POST",
        "/user",
        Some(serde_json::json!({
            "username": username,
            "email": email,
            "password": "password-123",
            "country": "DE",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

    let id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();
    let token = app.token_for(id, email);
    (id, token)
}
