use async_trait::async_trait;

use crate::errors::ServiceError;

/// Handle returned for a stored file: the name it was stored under and the
/// URL it can be fetched back from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub filename: String,
    pub url: String,
}

/// Storage abstraction for uploaded files. Implementations own filename
/// sanitization and size limits; callers hand over raw bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, original_filename: &str, bytes: &[u8]) -> Result<StoredBlob, ServiceError>;
}

/// In-memory mock store for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockBlobStore {
        pub stored: Mutex<Vec<(String, usize)>>, // (filename, byte length)
    }

    #[async_trait]
    impl BlobStore for MockBlobStore {
        async fn store(&self, original_filename: &str, bytes: &[u8]) -> Result<StoredBlob, ServiceError> {
            let mut stored = self.stored.lock().unwrap();
            stored.push((original_filename.to_string(), bytes.len()));
            Ok(StoredBlob {
                filename: original_filename.to_string(),
                url: format!("/uploads/{}", original_filename),
            })
        }
    }
}
