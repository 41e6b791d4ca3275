use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::info;

use crate::errors::ServiceError;
use crate::storage::blob::{BlobStore, StoredBlob};

/// Filesystem-backed blob store. Files land in a flat directory and are
/// served back under `public_base`/`filename`.
pub struct LocalBlobStore {
    dir: PathBuf,
    public_base: String,
    max_bytes: usize,
}

/// Keep only `[A-Za-z0-9._-]`; everything else becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    if safe.is_empty() { "file".to_string() } else { safe }
}

impl LocalBlobStore {
    /// Initialize the store, creating the upload directory if missing.
    pub async fn new(
        dir: impl Into<PathBuf>,
        public_base: impl Into<String>,
        max_bytes: usize,
    ) -> Result<Arc<Self>, ServiceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ServiceError::Upload(format!("cannot create upload dir: {}", e)))?;
        let public_base = public_base.into().trim_end_matches('/').to_string();
        Ok(Arc::new(Self { dir, public_base, max_bytes }))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, original_filename: &str, bytes: &[u8]) -> Result<StoredBlob, ServiceError> {
        if bytes.len() > self.max_bytes {
            return Err(ServiceError::Upload(format!(
                "file exceeds {} byte limit",
                self.max_bytes
            )));
        }

        // Timestamp prefix keeps repeated uploads of one filename distinct.
        let filename = format!("{}-{}", Utc::now().timestamp_millis(), sanitize_filename(original_filename));
        let path = self.dir.join(&filename);
        fs::write(&path, bytes)
            .await
            .map_err(|e| ServiceError::Upload(e.to_string()))?;

        info!(filename = %filename, size = bytes.len(), "blob_stored");
        Ok(StoredBlob {
            url: format!("{}/{}", self.public_base, filename),
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("careerboard_blobs_{}", Uuid::new_v4()))
    }

    #[test]
    fn sanitize_replaces_hostile_characters() {
        assert_eq!(sanitize_filename("my resume (final).pdf"), "my_resume__final_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[tokio::test]
    async fn store_writes_file_and_builds_url() -> Result<(), anyhow::Error> {
        let dir = temp_dir();
        let store = LocalBlobStore::new(&dir, "/uploads/", 1024).await?;
        let blob = store.store("resume.pdf", b"hello").await?;

        assert!(blob.filename.ends_with("-resume.pdf"));
        assert_eq!(blob.url, format!("/uploads/{}", blob.filename));
        let on_disk = tokio::fs::read(dir.join(&blob.filename)).await?;
        assert_eq!(on_disk, b"hello");
        Ok(())
    }

    #[tokio::test]
    async fn store_rejects_oversized_payload() -> Result<(), anyhow::Error> {
        let dir = temp_dir();
        let store = LocalBlobStore::new(&dir, "/uploads", 8).await?;
        let err = store.store("big.bin", &[0u8; 9]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Upload(_)));
        Ok(())
    }
}
