use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResumeStorage: Send + Sync {
    /// Stores `data` at `path` and returns the reference to persist. Never
    /// overwrites an existing object.
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<String>;

    /// `Ok(None)` when nothing is stored at `path`.
    async fn download(&self, path: &str) -> Result<Option<Bytes>>;
}

/// Accepts relative, forward-slash paths without `.`/`..` segments.
pub fn sanitize_storage_path(path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() || path.contains('\\') || path.contains('\0') {
        return None;
    }
    let all_normal = Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !all_normal || path.starts_with('/') || path.split('/').any(|s| s.is_empty() || s == ".") {
        return None;
    }
    Some(path.to_string())
}

fn checked_path(path: &str) -> Result<String> {
    sanitize_storage_path(path).ok_or_else(|| Error::BadRequest("Invalid file path".into()))
}

#[derive(Clone, Debug)]
pub struct LocalResumeStorage {
    root: PathBuf,
}

impl LocalResumeStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ResumeStorage for LocalResumeStorage {
    async fn upload(&self, path: &str, data: Bytes, _content_type: &str) -> Result<String> {
        let path = checked_path(path)?;
        let full = self.root.join(&path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::UploadFailed(e.to_string()))?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
            .map_err(|e| Error::UploadFailed(format!("{}: {}", full.display(), e)))?;
        file.write_all(&data)
            .await
            .map_err(|e| Error::UploadFailed(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| Error::UploadFailed(e.to_string()))?;

        Ok(path)
    }

    async fn download(&self, path: &str) -> Result<Option<Bytes>> {
        let path = checked_path(path)?;
        match fs::read(self.root.join(path)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Supabase Storage REST API, authenticated with the service-role key.
#[derive(Clone)]
pub struct SupabaseResumeStorage {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseResumeStorage {
    pub fn new(client: Client, base_url: String, service_key: String, bucket: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }
}

#[async_trait]
impl ResumeStorage for SupabaseResumeStorage {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<String> {
        let path = checked_path(path)?;
        let resp = self
            .client
            .post(self.object_url(&path))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", "false")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| Error::UploadFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UploadFailed(format!("storage status {}: {}", status.as_u16(), body)));
        }
        Ok(path)
    }

    async fn download(&self, path: &str) -> Result<Option<Bytes>> {
        let path = checked_path(path)?;
        let resp = self
            .client
            .get(self.object_url(&path))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await?;

        match resp.status() {
            status if status.is_success() => Ok(Some(resp.bytes().await?)),
            // Storage answers 400 with a "not_found" body for missing objects.
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(None),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(Error::Internal(format!("storage status {}: {}", status.as_u16(), body)))
            }
        }
    }
}
