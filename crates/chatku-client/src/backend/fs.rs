//! Filesystem-backed object store and local media reader.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use chatku_shared::ObjectStoreError;

use crate::ports::{MediaReader, ObjectHandle, ObjectStore};

/// Resolve `key` under `base`, refusing anything that would escape it.
fn resolve_key(base: &Path, key: &str) -> Result<PathBuf, ObjectStoreError> {
    if key.is_empty() {
        return Err(ObjectStoreError::InvalidKey("empty key".into()));
    }
    let mut resolved = base.to_path_buf();
    for component in Path::new(key).components() {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ObjectStoreError::InvalidKey(key.to_string()));
            }
        }
    }
    Ok(resolved)
}

/// Stores objects as files under a base directory and serves them from
/// `public_base_url`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl FsObjectStore {
    pub async fn new(
        base_path: PathBuf,
        public_base_url: impl Into<String>,
    ) -> Result<Self, ObjectStoreError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ObjectStoreError::Upload(format!(
                "Failed to create object directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Object store initialized");

        Ok(Self {
            base_path,
            public_base_url: public_base_url.into(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub async fn read(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let path = resolve_key(&self.base_path, key)?;
        fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|_| ObjectStoreError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<ObjectHandle, ObjectStoreError> {
        let path = resolve_key(&self.base_path, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ObjectStoreError::Upload(format!("{key}: {e}")))?;
        }

        fs::write(&path, &data)
            .await
            .map_err(|e| ObjectStoreError::Upload(format!("Failed to write {key}: {e}")))?;

        debug!(key, size = data.len(), "Stored object");
        Ok(ObjectHandle {
            key: key.to_string(),
        })
    }

    async fn public_url(&self, handle: &ObjectHandle) -> Result<String, ObjectStoreError> {
        let path = resolve_key(&self.base_path, &handle.key)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ObjectStoreError::NotFound(handle.key.clone()));
        }
        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            handle.key
        ))
    }
}

/// Reads picker results from the local filesystem. Accepts plain paths
/// and `file://` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMediaReader;

#[async_trait]
impl MediaReader for FsMediaReader {
    async fn read(&self, uri: &str) -> std::io::Result<Bytes> {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        fs::read(path).await.map(Bytes::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_rejected() {
        let base = Path::new("/srv/objects");
        assert!(resolve_key(base, "../etc/passwd").is_err());
        assert!(resolve_key(base, "/etc/passwd").is_err());
        assert!(resolve_key(base, "").is_err());
        assert_eq!(
            resolve_key(base, "chat_images/./a.jpg").unwrap(),
            PathBuf::from("/srv/objects/chat_images/a.jpg")
        );
    }

    #[tokio::test]
    async fn put_then_url_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().join("objects"), "https://cdn.example/")
            .await
            .unwrap();

        let handle = store
            .put("chat_images/1_abc.jpg", Bytes::from_static(b"\xff\xd8"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(
            store.public_url(&handle).await.unwrap(),
            "https://cdn.example/chat_images/1_abc.jpg"
        );
        assert_eq!(
            store.read("chat_images/1_abc.jpg").await.unwrap(),
            Bytes::from_static(b"\xff\xd8")
        );
    }

    #[tokio::test]
    async fn url_for_missing_object_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().to_path_buf(), "https://cdn.example")
            .await
            .unwrap();
        let handle = ObjectHandle {
            key: "chat_images/none.jpg".into(),
        };
        assert!(matches!(
            store.public_url(&handle).await,
            Err(ObjectStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn media_reader_accepts_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"img").unwrap();

        let uri = format!("file://{}", path.display());
        assert_eq!(FsMediaReader.read(&uri).await.unwrap(), Bytes::from_static(b"img"));
        assert!(FsMediaReader.read("/definitely/missing.jpg").await.is_err());
    }
}
