/// Attachment file store
///
/// Local-disk storage for uploaded attachment files, organized under one
/// logical folder per parent kind (`projects`, `tasks`, `comments`). The
/// store validates MIME type and size before any byte reaches disk; the
/// attachment row in the database stays the authoritative resource, so a
/// failed file delete is logged and otherwise ignored.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Maximum accepted upload size: 10 MiB
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// MIME types accepted for upload
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "text/plain",
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Logical folder an upload lands in, one per attachment parent kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFolder {
    /// Files attached to projects
    Projects,

    /// Files attached to tasks
    Tasks,

    /// Files attached to task comments
    Comments,
}

impl UploadFolder {
    /// Folder name on disk and in URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFolder::Projects => "projects",
            UploadFolder::Tasks => "tasks",
            UploadFolder::Comments => "comments",
        }
    }
}

/// Error type for file store operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// MIME type is not in the allowlist
    #[error("MIME type not allowed: {0}")]
    DisallowedMime(String),

    /// Upload exceeds the size limit
    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    /// Filesystem error
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A successfully stored file
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Filename on disk (unique per upload)
    pub filename: String,

    /// Path relative to the upload root
    pub path: String,

    /// Public URL
    pub url: String,
}

/// Local-disk file store rooted at a configurable directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a file store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Validates MIME type and size without touching disk
    pub fn validate(mime_type: &str, size: usize) -> Result<(), StorageError> {
        if !ALLOWED_MIME_TYPES.contains(&mime_type) {
            return Err(StorageError::DisallowedMime(mime_type.to_string()));
        }

        if size > MAX_UPLOAD_BYTES {
            return Err(StorageError::TooLarge {
                size,
                limit: MAX_UPLOAD_BYTES,
            });
        }

        Ok(())
    }

    /// Stores an upload under the given folder
    ///
    /// Validates first, then writes `{uuid}_{sanitized original name}` so
    /// concurrent uploads of the same filename never collide.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the write fails; nothing is
    /// left on disk in the error case.
    pub async fn store(
        &self,
        folder: UploadFolder,
        original_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<StoredFile, StorageError> {
        Self::validate(mime_type, data.len())?;

        let filename = format!("{}_{}", Uuid::new_v4(), sanitize_filename(original_name));
        let relative = format!("{}/{}", folder.as_str(), filename);

        let dir = self.root.join(folder.as_str());
        fs::create_dir_all(&dir).await?;

        let full_path = self.root.join(&relative);
        fs::write(&full_path, data).await?;

        debug!(path = %relative, size = data.len(), "Stored attachment file");

        Ok(StoredFile {
            filename,
            url: format!("/uploads/{}", relative),
            path: relative,
        })
    }

    /// Deletes a stored file by its relative path
    ///
    /// Callers treat failures here as non-fatal: the attachment row is the
    /// authoritative resource and its deletion must not be blocked by disk
    /// state.
    pub async fn delete(&self, relative_path: &str) -> Result<(), StorageError> {
        let full_path = self.root.join(relative_path);
        fs::remove_file(&full_path).await?;

        debug!(path = %relative_path, "Deleted attachment file");
        Ok(())
    }

    /// The store's root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Replaces every character outside `[A-Za-z0-9_.-]` with an underscore
///
/// Keeps original filenames recognizable while making them safe as path
/// components.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_filename("report-v2.1_final.pdf"), "report-v2.1_final.pdf");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize_filename("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_filename("relatório anual.pdf"), "relat_rio_anual.pdf");
    }

    #[test]
    fn test_sanitize_empty_name() {
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn test_validate_mime_allowlist() {
        assert!(FileStore::validate("application/pdf", 100).is_ok());
        assert!(FileStore::validate("image/png", 100).is_ok());

        let err = FileStore::validate("application/x-msdownload", 100).unwrap_err();
        assert!(matches!(err, StorageError::DisallowedMime(_)));
    }

    #[test]
    fn test_validate_size_limit() {
        assert!(FileStore::validate("image/png", MAX_UPLOAD_BYTES).is_ok());

        let err = FileStore::validate("image/png", MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert!(matches!(err, StorageError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_store_and_delete_roundtrip() {
        let dir = std::env::temp_dir().join(format!("taskhub-store-{}", Uuid::new_v4()));
        let store = FileStore::new(&dir);

        let stored = store
            .store(UploadFolder::Tasks, "notes.txt", "text/plain", b"hello")
            .await
            .unwrap();

        assert!(stored.path.starts_with("tasks/"));
        assert!(stored.url.starts_with("/uploads/tasks/"));

        let on_disk = tokio::fs::read(dir.join(&stored.path)).await.unwrap();
        assert_eq!(on_disk, b"hello");

        store.delete(&stored.path).await.unwrap();
        assert!(tokio::fs::metadata(dir.join(&stored.path)).await.is_err());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_store_rejects_disallowed_mime() {
        let dir = std::env::temp_dir().join(format!("taskhub-store-{}", Uuid::new_v4()));
        let store = FileStore::new(&dir);

        let result = store
            .store(UploadFolder::Projects, "evil.exe", "application/x-msdownload", b"MZ")
            .await;

        assert!(result.is_err());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
