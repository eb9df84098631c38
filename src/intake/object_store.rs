use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::info;

use super::IntakeError;

/// Size and content tag of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub etag: String,
}

/// Blob storage for original uploads, keyed by caller-chosen names.
pub trait ObjectStore {
    /// Store bytes under `key`, replacing any previous object. Returns the etag.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String, IntakeError>;

    fn stat(&self, key: &str) -> Result<Option<ObjectInfo>, IntakeError>;
}

/// Filesystem-backed bucket at `<root>/<bucket>/<key>`.
pub struct FsObjectStore {
    root: PathBuf,
    bucket: String,
}

impl FsObjectStore {
    pub fn new(root: &Path, bucket: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            bucket: bucket.to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, IntakeError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(&['/', '\\', '\0'][..]);
        if !valid {
            return Err(IntakeError::InvalidObjectKey(key.to_string()));
        }
        Ok(self.root.join(&self.bucket).join(key))
    }
}

/// Hex SHA-256 of the content.
pub fn content_etag(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String, IntakeError> {
        let path = self.object_path(key)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, bytes)?;

        let etag = content_etag(bytes);
        info!(bucket = %self.bucket, key, size = bytes.len(), %etag, "Object stored");
        Ok(etag)
    }

    fn stat(&self, key: &str) -> Result<Option<ObjectInfo>, IntakeError> {
        let path = self.object_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        Ok(Some(ObjectInfo {
            key: key.to_string(),
            size: bytes.len() as u64,
            etag: content_etag(&bytes),
        }))
    }
}
