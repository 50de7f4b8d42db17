use std::sync::Arc;

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::services::resume_storage::ResumeStorage;
use crate::utils::resume::{content_type_for, file_extension, signature_matches};
use crate::utils::validation::{ResumeRules, ResumeUpload};

#[derive(Debug, Clone)]
pub struct StoredResume {
    pub data: Bytes,
    pub content_type: &'static str,
    pub file_name: String,
}

#[derive(Clone)]
pub struct ResumeService {
    storage: Arc<dyn ResumeStorage>,
    rules: ResumeRules,
}

impl ResumeService {
    pub fn new(storage: Arc<dyn ResumeStorage>, rules: ResumeRules) -> Self {
        Self { storage, rules }
    }

    pub fn rules(&self) -> &ResumeRules {
        &self.rules
    }

    /// Decodes and sniffs an already type/size-checked upload, then writes it
    /// under a fresh random name. Returns the storage path.
    pub async fn store(&self, upload: &ResumeUpload) -> Result<String> {
        let data = upload
            .payload
            .decode()
            .map_err(|_| Error::FileRejected("Invalid file encoding".into()))?;

        if data.is_empty() {
            return Err(Error::FileRejected("Resume file is empty".into()));
        }
        if data.len() > self.rules.max_bytes {
            return Err(Error::FileRejected(self.rules.size_error()));
        }
        if !signature_matches(&upload.extension, &data) {
            return Err(Error::FileRejected(format!(
                "File content does not match the .{} format",
                upload.extension
            )));
        }

        let path = format!("resumes/{}.{}", Uuid::new_v4(), upload.extension);
        let size = data.len();
        let stored = self
            .storage
            .upload(&path, Bytes::from(data), content_type_for(&upload.extension))
            .await
            .map_err(|e| match e {
                Error::UploadFailed(_) => e,
                other => Error::UploadFailed(other.to_string()),
            })?;

        info!(path = %stored, bytes = size, "resume stored");
        Ok(stored)
    }

    pub async fn open(&self, path: &str) -> Result<StoredResume> {
        let data = self
            .storage
            .download(path)
            .await?
            .ok_or_else(|| Error::NotFound("File not found".into()))?;

        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let content_type = file_extension(&file_name)
            .map(|ext| content_type_for(&ext))
            .unwrap_or("application/pdf");

        Ok(StoredResume {
            data,
            content_type,
            file_name,
        })
    }
}
