// Copyright (c) 2025 - Cowboy AI, Inc.
//! Terragrunt application service
//!
//! Orchestrates the hierarchy store, the generator and the persistence
//! gateway. Every mutation is two sequential steps:
//!
//! 1. Apply the change to the [`HierarchyStore`] (validated, write-through)
//! 2. Generate and upload the affected artifact
//!
//! A failure in either write does not roll back the in-memory change. A
//! failed write-through is reported in [`Outcome::persisted`], a failed
//! upload in [`Outcome::artifact`]; the `save_*` actions and
//! [`HierarchyStore::flush`] recover them.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::import::component_from_module;
use crate::dependency::{DependencyGraph, DependencyWarning};
use crate::domain::{
    Component, ComponentDraft, ComponentId, ComponentPatch, Environment, EnvironmentDraft,
    EnvironmentId, EnvironmentPatch, Hierarchy, Service, ServiceDraft, ServiceId, ServicePatch,
};
use crate::errors::{TerragruntError, TerragruntResult};
use crate::generator::{
    generate_component, generate_environment, generate_root, generate_service, Artifact,
    RootContext,
};
use crate::hierarchy::{Committed, HierarchyStore};
use crate::layout::ArtifactPath;
use crate::persistence::{PersistenceGateway, UploadReceipt};
use crate::registry::Module;

/// Result of a mutation followed by an artifact upload
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    /// Entity as stored; the mutation already succeeded
    pub entity: T,
    /// Write-through of the mutation to the document store
    pub persisted: Result<(), TerragruntError>,
    /// Uploads performed, or the first failure
    pub artifact: Result<Vec<UploadReceipt>, TerragruntError>,
    /// Dependencies skipped while generating
    pub warnings: Vec<DependencyWarning>,
}

impl<T> Outcome<T> {
    /// Whether the mutation was written through and every artifact uploaded
    pub fn is_saved(&self) -> bool {
        self.persisted.is_ok() && self.artifact.is_ok()
    }

    fn new(committed: Committed<T>, artifact: TerragruntResult<Vec<UploadReceipt>>) -> Self {
        Self {
            entity: committed.entity,
            persisted: committed.persisted,
            artifact,
            warnings: Vec::new(),
        }
    }
}

/// Uploads of one generated artifact set
struct Upload {
    artifact: TerragruntResult<Vec<UploadReceipt>>,
    warnings: Vec<DependencyWarning>,
}

/// Artifact that could not be saved
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFailure {
    pub path: ArtifactPath,
    pub error: TerragruntError,
}

/// Result of a manual save action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    pub receipts: Vec<UploadReceipt>,
    pub warnings: Vec<DependencyWarning>,
    pub failures: Vec<SaveFailure>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Application service for the whole hierarchy
#[derive(Debug, Clone)]
pub struct TerragruntService {
    hierarchy: Arc<HierarchyStore>,
    gateway: PersistenceGateway,
    /// Bucket region for regions without a code
    fallback_region: String,
}

/// Bucket region used unless overridden
pub const DEFAULT_BUCKET_REGION: &str = "us-east-1";

impl TerragruntService {
    pub fn new(hierarchy: Arc<HierarchyStore>, gateway: PersistenceGateway) -> Self {
        Self {
            hierarchy,
            gateway,
            fallback_region: DEFAULT_BUCKET_REGION.to_string(),
        }
    }

    pub fn with_fallback_region(mut self, region: impl Into<String>) -> Self {
        self.fallback_region = region.into();
        self
    }

    /// Store for accounts, regions and read access
    pub fn hierarchy(&self) -> &Arc<HierarchyStore> {
        &self.hierarchy
    }

    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    // ------------------------------------------------------------------
    // Environments
    // ------------------------------------------------------------------

    /// Create an environment and scaffold its bucket
    ///
    /// Ensures the bucket exists, writes the root artifact unless the bucket
    /// already has one, then the environment artifact and the two directory
    /// placeholders.
    pub async fn create_environment(
        &self,
        draft: EnvironmentDraft,
    ) -> TerragruntResult<Outcome<Environment>> {
        let committed = self.hierarchy.create_environment(draft).await?;
        let snapshot = self.hierarchy.snapshot().await;
        let artifact = self.scaffold(&snapshot, &committed.entity).await;
        Ok(Outcome::new(committed, artifact))
    }

    async fn scaffold(
        &self,
        snapshot: &Hierarchy,
        environment: &Environment,
    ) -> TerragruntResult<Vec<UploadReceipt>> {
        let ctx = RootContext::resolve(snapshot, &environment.id)?;
        let bucket = environment.bucket_name.as_str();

        let bucket_region = if ctx.region.code.is_empty() {
            self.fallback_region.as_str()
        } else {
            ctx.region.code.as_str()
        };
        // Creation failures surface again on the first upload
        if let Err(e) = self.gateway.ensure_bucket(bucket, bucket_region).await {
            warn!("Could not ensure bucket {}: {}", bucket, e);
        }

        let mut receipts = Vec::with_capacity(4);
        let root_present = match self.gateway.has_root_artifact(bucket).await {
            Ok(present) => present,
            Err(e) => {
                warn!("Could not check root artifact in {}: {}", bucket, e);
                false
            }
        };
        if root_present {
            debug!("Bucket {} already has a root artifact", bucket);
        } else {
            receipts.push(self.upload(bucket, &generate_root(&ctx)).await?);
        }
        receipts.push(self.upload(bucket, &generate_environment(&ctx)).await?);
        receipts.extend(
            self.gateway
                .scaffold_environment(bucket, &environment.name)
                .await?,
        );

        info!(
            "Scaffolded environment {} in bucket {} ({} objects)",
            environment.name,
            bucket,
            receipts.len()
        );
        Ok(receipts)
    }

    /// Update an environment and regenerate its artifact
    pub async fn update_environment(
        &self,
        id: &EnvironmentId,
        patch: EnvironmentPatch,
    ) -> TerragruntResult<Outcome<Environment>> {
        let committed = self.hierarchy.update_environment(id, patch).await?;
        let artifact = self.save_environment(id).await.map(|report| report.receipts);
        Ok(Outcome::new(committed, artifact))
    }

    /// Delete an empty environment; its artifact is removed best-effort
    ///
    /// Refused with [`TerragruntError::DependencyExists`] while components
    /// or services remain in it.
    pub async fn delete_environment(
        &self,
        id: &EnvironmentId,
    ) -> TerragruntResult<Committed<Environment>> {
        let committed = self.hierarchy.delete_environment(id).await?;
        let environment = &committed.entity;
        self.remove_artifact(
            &environment.bucket_name,
            &ArtifactPath::environment(environment.name.as_str()),
        )
        .await;
        Ok(committed)
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    pub async fn create_component(
        &self,
        draft: ComponentDraft,
    ) -> TerragruntResult<Outcome<Component>> {
        let committed = self.hierarchy.create_component(draft).await?;
        let artifact = self.upload_component(&committed.entity).await;
        Ok(Outcome::new(committed, artifact))
    }

    /// Instantiate a registry module as a component
    pub async fn import_module(
        &self,
        module: &Module,
        environment_id: &EnvironmentId,
    ) -> TerragruntResult<Outcome<Component>> {
        info!("Importing module {} into environment {}", module.id, environment_id);
        self.create_component(component_from_module(module, environment_id.clone()))
            .await
    }

    /// Update a component and regenerate its artifact
    ///
    /// Services depending on the component are regenerated too, so their
    /// `config_path` follows a rename. A renamed or moved component leaves
    /// its previous artifact behind, which is removed best-effort.
    pub async fn update_component(
        &self,
        id: &ComponentId,
        patch: ComponentPatch,
    ) -> TerragruntResult<Outcome<Component>> {
        let before = self.component_location(&self.hierarchy.snapshot().await, id);
        let committed = self.hierarchy.update_component(id, patch).await?;
        let component = committed.entity.clone();
        let mut outcome = Outcome::new(committed, self.upload_component(&component).await);

        if outcome.artifact.is_ok() {
            let dependents = self.upload_dependents(&component).await;
            outcome.warnings = dependents.warnings;
            outcome.artifact = outcome.artifact.and_then(|mut receipts| {
                receipts.extend(dependents.artifact?);
                Ok(receipts)
            });
        }

        if let (Ok(receipts), Some((bucket, path))) = (&outcome.artifact, before) {
            if is_superseded(receipts, &bucket, &path) {
                self.remove_artifact(&bucket, &path).await;
            }
        }
        Ok(outcome)
    }

    pub async fn delete_component(
        &self,
        id: &ComponentId,
    ) -> TerragruntResult<Committed<Component>> {
        let location = self.component_location(&self.hierarchy.snapshot().await, id);
        let committed = self.hierarchy.delete_component(id).await?;
        if let Some((bucket, path)) = location {
            self.remove_artifact(&bucket, &path).await;
        }
        Ok(committed)
    }

    async fn upload_component(&self, component: &Component) -> TerragruntResult<Vec<UploadReceipt>> {
        let snapshot = self.hierarchy.snapshot().await;
        let environment = snapshot
            .environment(&component.environment_id)
            .ok_or_else(|| {
                TerragruntError::referential("environment", component.environment_id.as_str())
            })?;
        let artifact = generate_component(environment, component);
        Ok(vec![self.upload(&environment.bucket_name, &artifact).await?])
    }

    /// Regenerate the services of its environment that depend on `component`
    async fn upload_dependents(&self, component: &Component) -> Upload {
        let snapshot = self.hierarchy.snapshot().await;
        let mut receipts = Vec::new();
        let mut warnings = Vec::new();

        for service in snapshot
            .services_of(&component.environment_id)
            .filter(|s| s.component_dependencies.contains(&component.id))
        {
            let upload = self.upload_service(&snapshot, service).await;
            warnings.extend(upload.warnings);
            match upload.artifact {
                Ok(more) => receipts.extend(more),
                Err(e) => {
                    warn!("Could not regenerate dependent service {}: {}", service.id, e);
                    return Upload {
                        artifact: Err(e),
                        warnings,
                    };
                }
            }
        }

        if !receipts.is_empty() {
            debug!(
                "Regenerated {} service(s) depending on component {}",
                receipts.len(),
                component.id
            );
        }
        Upload {
            artifact: Ok(receipts),
            warnings,
        }
    }

    fn component_location(
        &self,
        snapshot: &Hierarchy,
        id: &ComponentId,
    ) -> Option<(String, ArtifactPath)> {
        let component = snapshot.component(id)?;
        let environment = snapshot.environment(&component.environment_id)?;
        Some((
            environment.bucket_name.clone(),
            ArtifactPath::component(environment.name.as_str(), component.name.as_str()),
        ))
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    pub async fn create_service(&self, draft: ServiceDraft) -> TerragruntResult<Outcome<Service>> {
        let committed = self.hierarchy.create_service(draft).await?;
        Ok(self.service_outcome(committed).await)
    }

    /// Update a service and regenerate its artifact
    pub async fn update_service(
        &self,
        id: &ServiceId,
        patch: ServicePatch,
    ) -> TerragruntResult<Outcome<Service>> {
        let before = self.service_location(&self.hierarchy.snapshot().await, id);
        let committed = self.hierarchy.update_service(id, patch).await?;
        let outcome = self.service_outcome(committed).await;

        if let (Ok(receipts), Some((bucket, path))) = (&outcome.artifact, before) {
            if is_superseded(receipts, &bucket, &path) {
                self.remove_artifact(&bucket, &path).await;
            }
        }
        Ok(outcome)
    }

    pub async fn delete_service(&self, id: &ServiceId) -> TerragruntResult<Committed<Service>> {
        let location = self.service_location(&self.hierarchy.snapshot().await, id);
        let committed = self.hierarchy.delete_service(id).await?;
        if let Some((bucket, path)) = location {
            self.remove_artifact(&bucket, &path).await;
        }
        Ok(committed)
    }

    async fn service_outcome(&self, committed: Committed<Service>) -> Outcome<Service> {
        let snapshot = self.hierarchy.snapshot().await;
        let upload = self.upload_service(&snapshot, &committed.entity).await;
        Outcome {
            warnings: upload.warnings,
            ..Outcome::new(committed, upload.artifact)
        }
    }

    async fn upload_service(&self, snapshot: &Hierarchy, service: &Service) -> Upload {
        let generated = snapshot
            .environment(&service.environment_id)
            .ok_or_else(|| {
                TerragruntError::referential("environment", service.environment_id.as_str())
            })
            .and_then(|environment| {
                generate_service(environment, service, &snapshot.components)
                    .map(|artifact| (environment.bucket_name.clone(), artifact))
            });

        match generated {
            Ok((bucket, artifact)) => Upload {
                artifact: self.upload(&bucket, &artifact).await.map(|r| vec![r]),
                warnings: artifact.warnings,
            },
            Err(e) => Upload {
                artifact: Err(e),
                warnings: Vec::new(),
            },
        }
    }

    fn service_location(
        &self,
        snapshot: &Hierarchy,
        id: &ServiceId,
    ) -> Option<(String, ArtifactPath)> {
        let service = snapshot.service(id)?;
        let environment = snapshot.environment(&service.environment_id)?;
        Some((
            environment.bucket_name.clone(),
            ArtifactPath::service(environment.name.as_str(), service.name.as_str()),
        ))
    }

    // ------------------------------------------------------------------
    // Manual save actions
    // ------------------------------------------------------------------

    /// Regenerate and upload the environment artifact
    pub async fn save_environment(&self, id: &EnvironmentId) -> TerragruntResult<SaveReport> {
        let snapshot = self.hierarchy.snapshot().await;
        let ctx = RootContext::resolve(&snapshot, id)?;
        let receipt = self
            .upload(&ctx.environment.bucket_name, &generate_environment(&ctx))
            .await?;
        Ok(SaveReport {
            receipts: vec![receipt],
            ..Default::default()
        })
    }

    /// Regenerate and upload a component artifact
    pub async fn save_component(&self, id: &ComponentId) -> TerragruntResult<SaveReport> {
        let component = self
            .hierarchy
            .component(id)
            .await
            .ok_or_else(|| TerragruntError::not_found("component", id.as_str()))?;
        Ok(SaveReport {
            receipts: self.upload_component(&component).await?,
            ..Default::default()
        })
    }

    /// Regenerate and upload a service artifact
    pub async fn save_service(&self, id: &ServiceId) -> TerragruntResult<SaveReport> {
        let service = self
            .hierarchy
            .service(id)
            .await
            .ok_or_else(|| TerragruntError::not_found("service", id.as_str()))?;
        let snapshot = self.hierarchy.snapshot().await;
        let upload = self.upload_service(&snapshot, &service).await;
        Ok(SaveReport {
            receipts: upload.artifact?,
            warnings: upload.warnings,
            ..Default::default()
        })
    }

    /// Regenerate every artifact of an environment
    ///
    /// Walks root, environment, components, then services. Upload failures
    /// are collected and do not stop the walk.
    pub async fn save_all(&self, id: &EnvironmentId) -> TerragruntResult<SaveReport> {
        let snapshot = self.hierarchy.snapshot().await;
        let ctx = RootContext::resolve(&snapshot, id)?;
        let bucket = ctx.environment.bucket_name.as_str();

        let mut artifacts = vec![generate_root(&ctx), generate_environment(&ctx)];
        artifacts.extend(
            snapshot
                .components_of(id)
                .map(|c| generate_component(ctx.environment, c)),
        );

        let mut report = SaveReport::default();
        for service in snapshot.services_of(id) {
            match generate_service(ctx.environment, service, &snapshot.components) {
                Ok(artifact) => artifacts.push(artifact),
                Err(error) => report.failures.push(SaveFailure {
                    path: ArtifactPath::service(ctx.environment.name.as_str(), service.name.as_str()),
                    error,
                }),
            }
        }

        for artifact in artifacts {
            report.warnings.extend(artifact.warnings.iter().cloned());
            match self.upload(bucket, &artifact).await {
                Ok(receipt) => report.receipts.push(receipt),
                Err(error) => report.failures.push(SaveFailure {
                    path: artifact.path,
                    error,
                }),
            }
        }

        info!(
            "Saved environment {}: {} uploaded, {} failed, {} warning(s)",
            ctx.environment.name,
            report.receipts.len(),
            report.failures.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    /// Dependency graph of one environment
    pub async fn dependency_graph(&self, id: &EnvironmentId) -> TerragruntResult<DependencyGraph> {
        let snapshot = self.hierarchy.snapshot().await;
        if snapshot.environment(id).is_none() {
            return Err(TerragruntError::not_found("environment", id.as_str()));
        }
        Ok(DependencyGraph::build(&snapshot, id))
    }

    async fn upload(&self, bucket: &str, artifact: &Artifact) -> TerragruntResult<UploadReceipt> {
        self.gateway
            .write_artifact(bucket, &artifact.path, &artifact.content)
            .await
    }

    async fn remove_artifact(&self, bucket: &str, path: &ArtifactPath) {
        if let Err(e) = self.gateway.delete_artifact(bucket, path).await {
            warn!("Could not remove {} from {}: {}", path, bucket, e);
        }
    }
}

/// Whether the previous artifact location was not overwritten by `receipts`
fn is_superseded(receipts: &[UploadReceipt], bucket: &str, previous: &ArtifactPath) -> bool {
    let key = previous.key();
    !receipts.iter().any(|r| r.bucket == bucket && r.key == key)
}
