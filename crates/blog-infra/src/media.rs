//! Local filesystem media store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use blog_core::domain::MediaRef;
use blog_core::ports::{MediaError, MediaStore};

/// Writes uploads under a root directory that is served at `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys are relative paths made of plain segments only.
    fn resolve(&self, key: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(MediaError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaRef, MediaError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MediaError::Backend(e.to_string()))?;
        }

        let size = bytes.len();
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| MediaError::Backend(e.to_string()))?;
        tracing::debug!(key, content_type, size, "Stored media object");

        Ok(MediaRef {
            url: format!("{}/{}", self.public_base_url.trim_end_matches('/'), key),
            key: key.to_string(),
        })
    }
}
