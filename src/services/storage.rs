use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};

/// Logical partitions in the object store, selected purely by declared
/// MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBucket {
    Images,
    Videos,
    Audio,
    Documents,
    Other,
}

impl StorageBucket {
    pub fn for_mime(mime_type: &str) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or(mime_type)
            .trim()
            .to_ascii_lowercase();

        match essence.split('/').next().unwrap_or("") {
            "image" => return StorageBucket::Images,
            "video" => return StorageBucket::Videos,
            "audio" => return StorageBucket::Audio,
            _ => {}
        }

        match essence.as_str() {
            "application/pdf"
            | "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            | "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "text/plain" => StorageBucket::Documents,
            _ => StorageBucket::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageBucket::Images => "calshare-images",
            StorageBucket::Videos => "calshare-videos",
            StorageBucket::Audio => "calshare-audio",
            StorageBucket::Documents => "calshare-docs",
            StorageBucket::Other => "calshare-other",
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<()>;

    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Supabase-storage-style REST client: objects are written with a bearer key
/// and served from a public URL namespace.
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, key);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "upload rejected with status {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, key)
    }
}

#[derive(Clone)]
pub struct FileStorageService {
    store: Arc<dyn ObjectStore>,
}

pub struct StoredObject {
    pub bucket: StorageBucket,
    pub key: String,
    pub url: String,
}

impl FileStorageService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Routes the bytes to a bucket by MIME type and returns the durable
    /// public URL.
    pub async fn upload(
        &self,
        owner_id: Uuid,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject> {
        if file_name.is_empty() {
            return Err(AppError::InvalidInput("file name is required".to_string()));
        }

        let bucket = StorageBucket::for_mime(mime_type);
        let key = object_key(owner_id, file_name);
        tracing::info!(bucket = bucket.name(), %key, "uploading object");

        self.store.put(bucket.name(), &key, bytes, mime_type).await?;

        let url = self.store.public_url(bucket.name(), &key);
        Ok(StoredObject { bucket, key, url })
    }
}

/// Collision-resistant object key: owner id, upload timestamp, then the
/// original base name and extension.
fn object_key(owner_id: Uuid, file_name: &str) -> String {
    let (base, ext) = match file_name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base, format!(".{ext}")),
        _ => (file_name, String::new()),
    };
    let sanitized: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    format!("{}/{}_{}{}", owner_id, chrono::Utc::now().timestamp(), sanitized, ext)
}
