//! Filesystem output store.
//!
//! Layout:
//! ```text
//! <root>/<run_id>/<region_id>/<ComponentName><Suffix>.tsx
//! <root>/<run_id>/index.json
//! ```
//! Source files and the index are written via temp file + rename so readers
//! never observe partial content.

use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use pagecraft_core::{GeneratedComponent, Variant};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{source_file_name, OutputStore, SourceDigest, StoredVariant};

const INDEX_FILE: &str = "index.json";

/// Write `bytes` to `path` atomically, creating the parent directory.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::Backend(format!("no parent for {}", path.display())))?;
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Reject keys that would escape the store root.
pub(crate) fn check_relative(key: &str) -> StoreResult<&Path> {
    let path = Path::new(key);
    let clean = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if key.is_empty() || !clean {
        return Err(StoreError::Backend(format!("invalid key: {key}")));
    }
    Ok(path)
}

/// Output store writing one `.tsx` file per variant.
#[derive(Debug)]
pub struct FsOutputStore {
    root: PathBuf,
    index_lock: Mutex<()>,
}

impl FsOutputStore {
    pub async fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            index_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a location returned by `put_variant`.
    pub fn path_for(&self, location: &str) -> StoreResult<PathBuf> {
        Ok(self.root.join(check_relative(location)?))
    }

    fn index_path(&self, run_id: &str) -> PathBuf {
        self.root.join(run_id).join(INDEX_FILE)
    }

    async fn read_index(&self, run_id: &str) -> StoreResult<Vec<StoredVariant>> {
        match tokio::fs::read(self.index_path(run_id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl OutputStore for FsOutputStore {
    async fn put_variant(
        &self,
        run_id: &str,
        component: &GeneratedComponent,
        variant: &Variant,
    ) -> StoreResult<StoredVariant> {
        check_relative(run_id)?;
        check_relative(&component.region_id)?;
        let location = format!(
            "{}/{}/{}",
            run_id,
            component.region_id,
            source_file_name(component.kind, variant.strategy)
        );
        let path = self.root.join(&location);
        write_atomic(&path, variant.code.as_bytes())?;

        let stored = StoredVariant {
            run_id: run_id.to_string(),
            component_id: component.id,
            region_id: component.region_id.clone(),
            kind: component.kind,
            variant_id: variant.id,
            strategy: variant.strategy,
            location: location.clone(),
            digest: SourceDigest::from_bytes(variant.code.as_bytes()),
            bytes: variant.code.len(),
            stored_at: Utc::now(),
        };

        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index(run_id).await?;
        index.retain(|s| s.location != location);
        index.push(stored.clone());
        write_atomic(&self.index_path(run_id), &serde_json::to_vec_pretty(&index)?)?;

        debug!(
            run_id,
            location = %location,
            digest = %stored.digest.short(),
            bytes = stored.bytes,
            "variant source stored"
        );
        Ok(stored)
    }

    async fn get_source(&self, location: &str) -> StoreResult<String> {
        let path = self.path_for(location)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(source) => Ok(source),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                kind: "source",
                key: location.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, run_id: &str) -> StoreResult<Vec<StoredVariant>> {
        check_relative(run_id)?;
        self.read_index(run_id).await
    }
}

impl FsOutputStore {
    /// Re-hash a stored file and compare against its recorded digest.
    pub async fn verify(&self, stored: &StoredVariant) -> StoreResult<()> {
        let source = self.get_source(&stored.location).await?;
        let actual = SourceDigest::from_bytes(source.as_bytes());
        if actual != stored.digest {
            return Err(StoreError::DigestMismatch {
                key: stored.location.clone(),
                expected: stored.digest.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_keys_only() {
        assert!(check_relative("run/hero-0/Hero.tsx").is_ok());
        assert!(check_relative("../etc/passwd").is_err());
        assert!(check_relative("/abs").is_err());
        assert!(check_relative("").is_err());
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        write_atomic(&path, b"hello").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
