use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use tracing::debug;

/// Blob storage for uploaded avatars, addressed by flat keys.
#[async_trait]
pub trait AvatarStorage: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    /// Succeeds if the object is already gone.
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// URL prefix (no leading or trailing slash) objects are served under.
    fn public_prefix(&self) -> &str;
    /// Directory holding the objects when they can be served as static files.
    fn local_root(&self) -> Option<&Path>;

    /// Relative path under which the object is served to clients.
    fn public_path(&self, key: &str) -> String {
        format!("{}/{}", self.public_prefix(), key)
    }

    /// Inverse of [`AvatarStorage::public_path`].
    fn key_from_public_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.public_prefix())?
            .strip_prefix('/')
            .filter(|k| is_flat_key(k))
    }
}

/// Stores avatars as files in a single directory, served statically
/// under the same relative path.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>, public_prefix: &str) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create uploads dir {}", root.display()))?;
        Ok(Self {
            root,
            public_prefix: public_prefix
                .trim_start_matches("./")
                .trim_matches('/')
                .to_string(),
        })
    }

    fn object_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(is_flat_key(key), "invalid storage key {key:?}");
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl AvatarStorage for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let dest = self.object_path(key)?;
        let tmp = self.root.join(format!("{key}.part"));
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp, &dest).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("move upload to {}", dest.display()));
        }
        debug!(key, bytes = body.len(), "avatar stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "avatar deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "avatar already gone");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("delete {}", path.display())),
        }
    }

    fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    fn local_root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

fn is_flat_key(key: &str) -> bool {
    !key.is_empty() && key != "." && key != ".." && !key.contains(['/', '\\'])
}

/// Builds a storage key from an upload time and the client's filename,
/// keeping only the final path component.
pub fn avatar_key(uploaded_at_ms: i128, original_name: &str) -> Option<String> {
    let name = original_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")?;
    Some(format!("{uploaded_at_ms}{name}"))
}
