// Copyright (c) 2025 - Cowboy AI, Inc.
//! Persisted entity store
//!
//! One logical collection per entity type, loaded once at start-up and
//! written back in full after every mutation (last writer wins).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{TerragruntError, TerragruntResult};

/// Collection names used by the hierarchy store and the registry manager
pub mod collections {
    pub const ACCOUNTS: &str = "accounts";
    pub const REGIONS: &str = "regions";
    pub const ENVIRONMENTS: &str = "environments";
    pub const COMPONENTS: &str = "components";
    pub const SERVICES: &str = "services";
    pub const REGISTRIES: &str = "registries";
}

/// Key-value document store keyed by collection name
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a collection, `None` if it was never saved
    async fn load_collection(&self, name: &str) -> TerragruntResult<Option<Value>>;

    /// Replace a collection
    async fn save_collection(&self, name: &str, documents: &Value) -> TerragruntResult<()>;
}

/// Load a collection as a typed list, empty if absent
pub async fn load_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    name: &str,
) -> TerragruntResult<Vec<T>> {
    match store.load_collection(name).await? {
        Some(value) => serde_json::from_value(value).map_err(|e| {
            TerragruntError::Serialization(format!("collection {}: {}", name, e))
        }),
        None => Ok(Vec::new()),
    }
}

/// Save a typed list as a collection
pub async fn save_typed<T: Serialize>(
    store: &dyn DocumentStore,
    name: &str,
    documents: &[T],
) -> TerragruntResult<()> {
    let value = serde_json::to_value(documents)?;
    store.save_collection(name, &value).await
}

/// Process-local document store
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: Mutex<HashMap<String, Value>>,
    saves: Mutex<usize>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save_collection` calls so far
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn load_collection(&self, name: &str) -> TerragruntResult<Option<Value>> {
        Ok(self.collections.lock().await.get(name).cloned())
    }

    async fn save_collection(&self, name: &str, documents: &Value) -> TerragruntResult<()> {
        self.collections
            .lock()
            .await
            .insert(name.to_string(), documents.clone());
        *self.saves.lock().await += 1;
        Ok(())
    }
}

/// Document store writing one pretty-printed `{name}.json` file per collection
#[derive(Debug, Clone)]
pub struct JsonFileDocumentStore {
    dir: PathBuf,
}

impl JsonFileDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn load_collection(&self, name: &str) -> TerragruntResult<Option<Value>> {
        let path = self.path(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let value = serde_json::from_str(&content).map_err(|e| {
                    TerragruntError::Serialization(format!(
                        "Failed to parse {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TerragruntError::Persistence(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn save_collection(&self, name: &str, documents: &Value) -> TerragruntResult<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            TerragruntError::Persistence(format!(
                "Failed to create store directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.path(name);
        let staging = self.dir.join(format!(".{}.json.tmp", name));
        let content = serde_json::to_string_pretty(documents)?;

        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, &path).await?;
        debug!("Saved collection {} to {}", name, path.display());
        Ok(())
    }
}
