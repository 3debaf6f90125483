//! Image storage.
//!
//! Handlers validate the file (extension, size) and hand the bytes to an
//! [`ImageStore`], which persists them and returns a public URL.
//! [`LocalImageStore`] writes under a directory that the server also
//! exposes at `/uploads`.

use std::path::PathBuf;

use async_trait::async_trait;
use stockroom_core::validation::image_extension;
use stockroom_core::{CoreError, CoreResult};
use tracing::{debug, error};
use uuid::Uuid;

/// Folder item images are stored in.
pub const ITEM_IMAGE_FOLDER: &str = "items";

/// Persists uploaded files and returns their public URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `bytes` under `folder`. Fails with `UploadFailed`.
    async fn upload(&self, bytes: &[u8], filename: &str, folder: &str) -> CoreResult<String>;

    /// Removes a file previously returned by `upload`. URLs this store did
    /// not issue and files already gone are ignored.
    async fn remove(&self, url: &str) -> CoreResult<()>;
}

/// Stores images on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        LocalImageStore {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Local path of a URL issued by this store.
    fn path_of(&self, url: &str) -> Option<PathBuf> {
        let relative = url
            .strip_prefix(&self.public_base_url)?
            .strip_prefix('/')?;
        let mut path = self.root.clone();
        for part in relative.split('/') {
            if part.is_empty() || part == "." || part == ".." || part.contains('\\') {
                return None;
            }
            path.push(part);
        }
        Some(path)
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(&self, bytes: &[u8], filename: &str, folder: &str) -> CoreResult<String> {
        let ext = image_extension(filename).unwrap_or_default();
        let stored_name = format!("{}{}", Uuid::new_v4(), ext);
        let dir = self.root.join(folder);

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            error!(dir = %dir.display(), error = %e, "Failed to create upload directory");
            CoreError::UploadFailed(e.to_string())
        })?;

        let path = dir.join(&stored_name);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to write image");
            CoreError::UploadFailed(e.to_string())
        })?;

        debug!(path = %path.display(), size = bytes.len(), "Image stored");

        Ok(format!("{}/{}/{}", self.public_base_url, folder, stored_name))
    }

    async fn remove(&self, url: &str) -> CoreResult<()> {
        let Some(path) = self.path_of(url) else {
            debug!(url = %url, "Not a local upload, nothing to remove");
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Image removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to remove image");
                Err(CoreError::UploadFailed(e.to_string()))
            }
        }
    }
}
