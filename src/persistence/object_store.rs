// Copyright (c) 2025 - Cowboy AI, Inc.
//! Object Store contract and local implementations
//!
//! The object store holds generated artifacts, one bucket per environment
//! (several environments may share a bucket). Two implementations ship with
//! the crate:
//!
//! - [`InMemoryObjectStore`] - process-local, records every upload
//! - [`FileSystemObjectStore`] - buckets are directories under a root path
//!
//! Any S3-compatible client can be plugged in by implementing [`ObjectStore`].

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Errors reported by an object store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectStoreError {
    /// Store unreachable or the request failed in transit
    #[error("Object store transport error: {0}")]
    Transport(String),

    /// Credentials rejected
    #[error("Object store authorization error: {0}")]
    Unauthorized(String),

    /// Bucket does not exist
    #[error("No such bucket: {0}")]
    NoSuchBucket(String),

    /// Object does not exist
    #[error("No such key: {bucket}/{key}")]
    NoSuchKey { bucket: String, key: String },

    /// Key or bucket name cannot be mapped onto the store
    #[error("Invalid object name: {0}")]
    InvalidName(String),

    /// Store did not become ready in time
    #[error("Object store not ready after {0:?}")]
    NotReady(Duration),
}

impl From<std::io::Error> for ObjectStoreError {
    fn from(err: std::io::Error) -> Self {
        ObjectStoreError::Transport(err.to_string())
    }
}

/// Result of [`ObjectStore::create_bucket`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCreation {
    Created,
    AlreadyExisted,
}

/// Bucket/object CRUD consumed by the persistence gateway
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError>;

    /// Create a bucket; creating an existing bucket is not an error
    async fn create_bucket(
        &self,
        bucket: &str,
        region: &str,
    ) -> Result<BucketCreation, ObjectStoreError>;

    async fn put_object(&self, bucket: &str, key: &str, body: &[u8])
        -> Result<(), ObjectStoreError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    async fn list_objects(&self, bucket: &str, prefix: &str)
        -> Result<Vec<String>, ObjectStoreError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError>;

    /// Resolves once the underlying client finished initializing
    async fn ready(&self) -> Result<(), ObjectStoreError> {
        Ok(())
    }

    /// Single bounded wait for [`ready`](Self::ready)
    async fn wait_ready(&self, timeout: Duration) -> Result<(), ObjectStoreError> {
        tokio::time::timeout(timeout, self.ready())
            .await
            .map_err(|_| ObjectStoreError::NotReady(timeout))?
    }

    /// Get the name of this store
    fn name(&self) -> &str;
}

/// One recorded `put_object` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRecord {
    pub bucket: String,
    pub key: String,
    pub size: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    buckets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    puts: Vec<PutRecord>,
    unavailable: bool,
}

/// Process-local object store
///
/// Every successful upload is recorded in order, and the store can be
/// switched to unavailable to exercise failure paths.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    state: Mutex<MemoryState>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a transport error
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// Uploads performed so far, oldest first
    pub async fn put_log(&self) -> Vec<PutRecord> {
        self.state.lock().await.puts.clone()
    }

    /// Read an object as UTF-8 text
    pub async fn text(&self, bucket: &str, key: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|body| String::from_utf8_lossy(body).into_owned())
    }

    fn check(state: &MemoryState) -> Result<(), ObjectStoreError> {
        if state.unavailable {
            return Err(ObjectStoreError::Transport(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        let state = self.state.lock().await;
        Self::check(&state)?;
        Ok(state.buckets.contains_key(bucket))
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        _region: &str,
    ) -> Result<BucketCreation, ObjectStoreError> {
        let mut state = self.state.lock().await;
        Self::check(&state)?;
        if state.buckets.contains_key(bucket) {
            return Ok(BucketCreation::AlreadyExisted);
        }
        state.buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(BucketCreation::Created)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
    ) -> Result<(), ObjectStoreError> {
        let mut state = self.state.lock().await;
        Self::check(&state)?;
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| ObjectStoreError::NoSuchBucket(bucket.to_string()))?;
        objects.insert(key.to_string(), body.to_vec());
        state.puts.push(PutRecord {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: body.len(),
        });
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let state = self.state.lock().await;
        Self::check(&state)?;
        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| ObjectStoreError::NoSuchBucket(bucket.to_string()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NoSuchKey {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<String>, ObjectStoreError> {
        let state = self.state.lock().await;
        Self::check(&state)?;
        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| ObjectStoreError::NoSuchBucket(bucket.to_string()))?;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        let mut state = self.state.lock().await;
        Self::check(&state)?;
        if let Some(objects) = state.buckets.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Object store backed by the local file system
///
/// Bucket `b` maps to directory `{root}/b`, key `x/y` to file `{root}/b/x/y`.
#[derive(Debug, Clone)]
pub struct FileSystemObjectStore {
    root: PathBuf,
}

impl FileSystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, ObjectStoreError> {
        if bucket.is_empty() || bucket.contains('/') || bucket.contains('\\') || bucket == ".." {
            return Err(ObjectStoreError::InvalidName(bucket.to_string()));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, PathComponent::Normal(_)));
        if !safe {
            return Err(ObjectStoreError::InvalidName(key.to_string()));
        }
        Ok(self.bucket_dir(bucket)?.join(relative))
    }

    async fn require_bucket(&self, bucket: &str) -> Result<PathBuf, ObjectStoreError> {
        let dir = self.bucket_dir(bucket)?;
        if !tokio::fs::try_exists(&dir).await? {
            return Err(ObjectStoreError::NoSuchBucket(bucket.to_string()));
        }
        Ok(dir)
    }
}

#[async_trait]
impl ObjectStore for FileSystemObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        let dir = self.bucket_dir(bucket)?;
        Ok(tokio::fs::try_exists(&dir).await?)
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        region: &str,
    ) -> Result<BucketCreation, ObjectStoreError> {
        let dir = self.bucket_dir(bucket)?;
        if tokio::fs::try_exists(&dir).await? {
            return Ok(BucketCreation::AlreadyExisted);
        }
        tokio::fs::create_dir_all(&dir).await?;
        debug!("Created bucket directory {} (region {})", dir.display(), region);
        Ok(BucketCreation::Created)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
    ) -> Result<(), ObjectStoreError> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ObjectStoreError::NoSuchKey {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<String>, ObjectStoreError> {
        let dir = self.require_bucket(bucket).await?;
        let mut keys = Vec::new();
        let mut pending = vec![dir.clone()];

        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "file-system"
    }
}
