// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-terragrunt
//!
//! Deterministic ids and pre-wired stores shared by the integration tests.
//! Every object store and document store is in-memory; registry backends
//! are fakes whose reachability the test controls.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use cim_terragrunt::domain::{
    AccountDraft, ComponentDraft, EnvironmentDraft, Provider, RegionDraft,
};
use cim_terragrunt::persistence::{
    BucketCreation, InMemoryDocumentStore, InMemoryObjectStore, ObjectStoreError,
};
use cim_terragrunt::registry::{
    Module, RegistryBackend, RegistryConfig, RegistryConnector, RegistryType,
};
use cim_terragrunt::{
    DocumentStore, HierarchyStore, ObjectStore, PersistenceGateway, RegistryManager,
    TerragruntError, TerragruntResult, TerragruntService,
};
use serde_json::Value;

pub const ACCOUNT_ID: &str = "a1";
pub const REGION_ID: &str = "r1";
pub const ENVIRONMENT_ID: &str = "e1";
pub const COMPONENT_ID: &str = "c1";
pub const BUCKET: &str = "tg-bucket";
pub const REGION_CODE: &str = "us-east-1";
pub const VPC_SOURCE: &str = "terraform-aws-modules/vpc/aws";
pub const VPC_VERSION: &str = "3.5.0";

pub fn account_draft() -> AccountDraft {
    AccountDraft::new("prod", Provider::Aws).with_id(ACCOUNT_ID)
}

pub fn region_draft() -> RegionDraft {
    RegionDraft::new("US East", REGION_CODE, ACCOUNT_ID).with_id(REGION_ID)
}

pub fn environment_draft() -> EnvironmentDraft {
    EnvironmentDraft::new("dev", REGION_ID, BUCKET).with_id(ENVIRONMENT_ID)
}

pub fn vpc_draft() -> ComponentDraft {
    ComponentDraft::new("vpc", ENVIRONMENT_ID, VPC_SOURCE, VPC_VERSION)
        .with_id(COMPONENT_ID)
        .with_input("name", serde_json::json!("main"))
}

/// Service over empty in-memory stores
pub fn empty_service() -> (Arc<InMemoryObjectStore>, TerragruntService) {
    let objects = Arc::new(InMemoryObjectStore::new());
    let service = service_over(objects.clone(), Arc::new(InMemoryDocumentStore::new()));
    (objects, service)
}

/// Service over the given stores, with an empty hierarchy
pub fn service_over(
    objects: Arc<dyn ObjectStore>,
    documents: Arc<dyn DocumentStore>,
) -> TerragruntService {
    let hierarchy = Arc::new(HierarchyStore::new(documents));
    TerragruntService::new(hierarchy, PersistenceGateway::new(objects))
}

/// Service holding account `a1` and region `r1`
pub async fn service_with_region() -> (Arc<InMemoryObjectStore>, TerragruntService) {
    let (objects, service) = empty_service();
    seed_region(&service).await;
    (objects, service)
}

/// Create account `a1` and region `r1`
pub async fn seed_region(service: &TerragruntService) {
    service
        .hierarchy()
        .create_account(account_draft())
        .await
        .expect("account fixture");
    service
        .hierarchy()
        .create_region(region_draft())
        .await
        .expect("region fixture");
}

// ============================================================================
// Failing stores
// ============================================================================

/// Document store that loads nothing and rejects every save
pub struct FailingDocumentStore;

#[async_trait]
impl DocumentStore for FailingDocumentStore {
    async fn load_collection(&self, _name: &str) -> TerragruntResult<Option<Value>> {
        Ok(None)
    }

    async fn save_collection(&self, _name: &str, _documents: &Value) -> TerragruntResult<()> {
        Err(TerragruntError::Persistence("disk full".to_string()))
    }
}

/// Object store whose `create_bucket` always fails; everything else goes
/// to the wrapped in-memory store
pub struct NoCreateBucketStore {
    pub inner: Arc<InMemoryObjectStore>,
}

#[async_trait]
impl ObjectStore for NoCreateBucketStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        self.inner.bucket_exists(bucket).await
    }

    async fn create_bucket(
        &self,
        _bucket: &str,
        _region: &str,
    ) -> Result<BucketCreation, ObjectStoreError> {
        Err(ObjectStoreError::Unauthorized("bucket creation denied".to_string()))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
    ) -> Result<(), ObjectStoreError> {
        self.inner.put_object(bucket, key, body).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.inner.get_object(bucket, key).await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<String>, ObjectStoreError> {
        self.inner.list_objects(bucket, prefix).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.inner.delete_object(bucket, key).await
    }

    fn name(&self) -> &str {
        "no-create-bucket"
    }
}

// ============================================================================
// Registry fakes
// ============================================================================

/// Connector handing out [`FakeBackend`]s keyed by registry URL
#[derive(Default)]
pub struct FakeConnector {
    down: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    connects: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_down(&self, url: &str) {
        self.down.lock().unwrap().insert(url.to_string());
    }

    /// Hold connection tests of `url` until the returned notify fires
    pub fn gate(&self, url: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(url.to_string(), notify.clone());
        notify
    }

    pub fn connects_to(&self, url: &str) -> usize {
        self.connects
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn total_connects(&self) -> usize {
        self.connects.lock().unwrap().len()
    }
}

impl RegistryConnector for FakeConnector {
    fn connect(&self, config: &RegistryConfig) -> TerragruntResult<Arc<dyn RegistryBackend>> {
        self.connects.lock().unwrap().push(config.url.clone());
        Ok(Arc::new(FakeBackend {
            registry_type: config.registry_type,
            up: !self.down.lock().unwrap().contains(&config.url),
            gate: self.gates.lock().unwrap().get(&config.url).cloned(),
        }))
    }
}

pub struct FakeBackend {
    registry_type: RegistryType,
    up: bool,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl RegistryBackend for FakeBackend {
    fn registry_type(&self) -> RegistryType {
        self.registry_type
    }

    async fn test_connection(&self) -> bool {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.up
    }

    async fn list_namespaces(&self) -> TerragruntResult<Vec<String>> {
        Ok(vec!["network".to_string(), "storage".to_string()])
    }

    async fn search_modules(&self, query: &str) -> TerragruntResult<Vec<Module>> {
        Ok(vec![vpc_module(query)])
    }
}

pub fn vpc_module(namespace: &str) -> Module {
    Module {
        id: Module::module_id(namespace, "vpc", "aws"),
        name: "vpc".to_string(),
        namespace: namespace.to_string(),
        provider: "aws".to_string(),
        version: VPC_VERSION.to_string(),
        description: "VPC".to_string(),
        source: VPC_SOURCE.to_string(),
        inputs: None,
        outputs: None,
        versions: vec![VPC_VERSION.to_string(), "3.4.0".to_string()],
        registry_id: None,
    }
}

pub fn registry_url(name: &str) -> String {
    format!("https://{}.registry.example", name)
}

pub fn terrareg(name: &str) -> RegistryConfig {
    RegistryConfig::new(name, RegistryType::Terrareg, registry_url(name)).with_id(name)
}

pub fn registry_manager(connector: Arc<FakeConnector>) -> RegistryManager {
    RegistryManager::new(Arc::new(InMemoryDocumentStore::new()), connector)
}
