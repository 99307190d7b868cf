use std::sync::Arc;

use crate::domain::{MediaKind, MediaRef, MediaUpload, Session};
use crate::error::DomainError;
use crate::ports::MediaStore;

/// Validates uploads and hands them to the media store.
pub struct MediaService {
    store: Arc<dyn MediaStore>,
    max_bytes: usize,
}

impl MediaService {
    pub fn new(store: Arc<dyn MediaStore>, max_bytes: usize) -> Self {
        Self { store, max_bytes }
    }

    pub async fn upload(
        &self,
        session: &Session,
        upload: MediaUpload,
        kind: MediaKind,
    ) -> Result<MediaRef, DomainError> {
        session.require()?;
        upload.validate(kind, self.max_bytes)?;

        let key = upload.storage_key(kind);
        self.store
            .put(&key, &upload.content_type, upload.bytes)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))
    }
}
