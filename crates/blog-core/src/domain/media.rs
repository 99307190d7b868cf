use uuid::Uuid;

use crate::error::DomainError;

/// What an upload is for. Decides the storage folder and accepted types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Attachment,
    Avatar,
}

impl MediaKind {
    pub fn folder(self) -> &'static str {
        match self {
            MediaKind::Attachment => "attachments",
            MediaKind::Avatar => "avatars",
        }
    }
}

/// Raw upload received from a client.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    pub fn validate(&self, kind: MediaKind, max_bytes: usize) -> Result<(), DomainError> {
        if self.bytes.is_empty() {
            return Err(DomainError::Validation("No file provided".to_string()));
        }
        if self.bytes.len() > max_bytes {
            return Err(DomainError::Validation(format!(
                "File exceeds the {} byte limit",
                max_bytes
            )));
        }
        if kind == MediaKind::Avatar && !self.content_type.starts_with("image/") {
            return Err(DomainError::Validation(
                "Profile photos must be images".to_string(),
            ));
        }
        Ok(())
    }

    /// Storage key: `<folder>/<uuid>-<sanitized file name>`.
    pub fn storage_key(&self, kind: MediaKind) -> String {
        let sanitized: String = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let sanitized = sanitized.trim_start_matches('.');
        let name = if sanitized.is_empty() { "upload" } else { sanitized };

        format!("{}/{}-{}", kind.folder(), Uuid::new_v4().simple(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, bytes: Vec<u8>) -> MediaUpload {
        MediaUpload {
            file_name: "../../etc/my photo.png".to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }

    #[test]
    fn test_storage_key_strips_path_and_unsafe_chars() {
        let key = upload("image/png", vec![1]).storage_key(MediaKind::Avatar);

        assert!(key.starts_with("avatars/"));
        assert!(key.ends_with("-my_photo.png"));
        assert!(!key.contains(".."));
    }

    #[test]
    fn test_avatar_requires_image_type() {
        let result = upload("application/pdf", vec![1]).validate(MediaKind::Avatar, 10);
        assert!(matches!(result, Err(DomainError::Validation(_))));

        let result = upload("application/pdf", vec![1]).validate(MediaKind::Attachment, 10);
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert!(upload("image/png", vec![]).validate(MediaKind::Avatar, 10).is_err());
        assert!(upload("image/png", vec![0; 11]).validate(MediaKind::Avatar, 10).is_err());
    }
}
