// Copyright (c) 2025 - Cowboy AI, Inc.
//! Persistence Gateway
//!
//! Maps generated artifacts onto object keys (see [`crate::layout`]) and
//! performs the writes. Any object store failure is reported uniformly as
//! [`TerragruntError::Persistence`]; nothing is retried automatically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::object_store::{BucketCreation, ObjectStore, ObjectStoreError};
use crate::errors::{TerragruntError, TerragruntResult};
use crate::layout::{environment_placeholders, environment_prefix, ArtifactPath};

/// Receipt of one successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: String,
    pub bytes: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Writes artifacts and placeholders into environment buckets
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("store", &self.store.name())
            .finish()
    }
}

fn persistence_error(action: &str, target: &str, err: ObjectStoreError) -> TerragruntError {
    TerragruntError::Persistence(format!("{} {}: {}", action, target, err))
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Bounded one-time wait for the object store client to initialize
    pub async fn wait_ready(&self, timeout: Duration) -> TerragruntResult<()> {
        self.store.wait_ready(timeout).await.map_err(|e| match e {
            ObjectStoreError::NotReady(waited) => {
                TerragruntError::Timeout(format!("object store not ready after {:?}", waited))
            }
            other => persistence_error("initialize", self.store.name(), other),
        })
    }

    /// Create the bucket unless it already exists
    pub async fn ensure_bucket(&self, bucket: &str, region: &str) -> TerragruntResult<BucketCreation> {
        let creation = self
            .store
            .create_bucket(bucket, region)
            .await
            .map_err(|e| persistence_error("create bucket", bucket, e))?;
        match creation {
            BucketCreation::Created => info!("Created bucket {} in {}", bucket, region),
            BucketCreation::AlreadyExisted => debug!("Bucket {} already exists", bucket),
        }
        Ok(creation)
    }

    /// Upload one artifact body to its deterministic key
    pub async fn write_artifact(
        &self,
        bucket: &str,
        path: &ArtifactPath,
        body: &str,
    ) -> TerragruntResult<UploadReceipt> {
        self.put(bucket, &path.key(), body.as_bytes()).await
    }

    /// Whether the root artifact was already written to this bucket
    pub async fn has_root_artifact(&self, bucket: &str) -> TerragruntResult<bool> {
        let key = ArtifactPath::Root.key();
        let keys = self
            .store
            .list_objects(bucket, &key)
            .await
            .map_err(|e| persistence_error("list", bucket, e))?;
        Ok(keys.iter().any(|k| k == &key))
    }

    /// Write the `components/` and `services/` placeholders of an environment
    pub async fn scaffold_environment(
        &self,
        bucket: &str,
        environment: &str,
    ) -> TerragruntResult<Vec<UploadReceipt>> {
        let mut receipts = Vec::with_capacity(2);
        for key in environment_placeholders(environment) {
            receipts.push(self.put(bucket, &key, b"").await?);
        }
        Ok(receipts)
    }

    /// Download an artifact as text
    pub async fn download_artifact(&self, bucket: &str, path: &ArtifactPath) -> TerragruntResult<String> {
        let key = path.key();
        let body = self
            .store
            .get_object(bucket, &key)
            .await
            .map_err(|e| persistence_error("download", &key, e))?;
        String::from_utf8(body)
            .map_err(|e| TerragruntError::Persistence(format!("{} is not UTF-8: {}", key, e)))
    }

    /// Every object key stored under an environment
    pub async fn list_environment_artifacts(
        &self,
        bucket: &str,
        environment: &str,
    ) -> TerragruntResult<Vec<String>> {
        let prefix = format!("{}/", environment_prefix(environment));
        self.store
            .list_objects(bucket, &prefix)
            .await
            .map_err(|e| persistence_error("list", &prefix, e))
    }

    /// Remove an artifact, e.g. after its entity was deleted
    pub async fn delete_artifact(&self, bucket: &str, path: &ArtifactPath) -> TerragruntResult<()> {
        let key = path.key();
        self.store
            .delete_object(bucket, &key)
            .await
            .map_err(|e| persistence_error("delete", &key, e))?;
        info!("Deleted {}/{}", bucket, key);
        Ok(())
    }

    async fn put(&self, bucket: &str, key: &str, body: &[u8]) -> TerragruntResult<UploadReceipt> {
        match self.store.put_object(bucket, key, body).await {
            Ok(()) => {
                debug!("Uploaded {}/{} ({} bytes)", bucket, key, body.len());
                Ok(UploadReceipt {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    bytes: body.len(),
                    uploaded_at: Utc::now(),
                })
            }
            Err(e) => {
                warn!("Upload of {}/{} failed: {}", bucket, key, e);
                Err(persistence_error("upload", key, e))
            }
        }
    }
}
