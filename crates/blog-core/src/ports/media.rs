//! Media store port - abstraction over object/image storage.

use async_trait::async_trait;

use crate::domain::MediaRef;

/// Object storage for uploaded files.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `bytes` under `key` and return the public reference.
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>)
    -> Result<MediaRef, MediaError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}
