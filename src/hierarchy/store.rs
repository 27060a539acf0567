// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory hierarchy with write-through persistence

use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::events::{HierarchyEvent, EVENT_CHANNEL_CAPACITY};
use crate::domain::invariants::{
    ensure_account_deletable, ensure_component_movable, ensure_environment_deletable,
    ensure_region_deletable, require_account, require_environment, require_region,
    validate_service_dependencies,
};
use crate::domain::{
    Account, AccountDraft, AccountId, AccountPatch, Component, ComponentDraft, ComponentId,
    ComponentPatch, EntityKind, Environment, EnvironmentDraft, EnvironmentId, EnvironmentPatch,
    Hierarchy, Region, RegionDraft, RegionId, RegionPatch, Service, ServiceDraft, ServiceId,
    ServicePatch,
};
use crate::errors::{TerragruntError, TerragruntResult};
use crate::persistence::{collections, load_typed, save_typed, DocumentStore};

/// Applied mutation and the result of writing it through
///
/// The in-memory change stands even when `persisted` is an error;
/// [`HierarchyStore::flush`] retries the write.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<T> {
    pub entity: T,
    pub persisted: TerragruntResult<()>,
}

impl<T> Committed<T> {
    pub fn is_persisted(&self) -> bool {
        self.persisted.is_ok()
    }

    /// Entity if the write-through succeeded, the write error otherwise
    pub fn into_result(self) -> TerragruntResult<T> {
        self.persisted.map(|()| self.entity)
    }
}

/// Hierarchy store injected into every caller that reads or mutates entities
pub struct HierarchyStore {
    state: Mutex<Hierarchy>,
    documents: Arc<dyn DocumentStore>,
    events: broadcast::Sender<HierarchyEvent>,
}

impl std::fmt::Debug for HierarchyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyStore").finish_non_exhaustive()
    }
}

fn already_exists(kind: EntityKind, id: &str) -> TerragruntError {
    TerragruntError::Validation(format!("{} {} already exists", kind, id))
}

impl HierarchyStore {
    /// Create an empty store backed by `documents`
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self::with_state(documents, Hierarchy::default())
    }

    /// Load every collection from `documents`
    pub async fn load(documents: Arc<dyn DocumentStore>) -> TerragruntResult<Self> {
        let store = documents.as_ref();
        let hierarchy = Hierarchy {
            accounts: load_typed(store, collections::ACCOUNTS).await?,
            regions: load_typed(store, collections::REGIONS).await?,
            environments: load_typed(store, collections::ENVIRONMENTS).await?,
            components: load_typed(store, collections::COMPONENTS).await?,
            services: load_typed(store, collections::SERVICES).await?,
        };
        info!(
            "Loaded hierarchy: {} accounts, {} regions, {} environments, {} components, {} services",
            hierarchy.accounts.len(),
            hierarchy.regions.len(),
            hierarchy.environments.len(),
            hierarchy.components.len(),
            hierarchy.services.len()
        );
        Ok(Self::with_state(documents, hierarchy))
    }

    fn with_state(documents: Arc<dyn DocumentStore>, hierarchy: Hierarchy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(hierarchy),
            documents,
            events,
        }
    }

    /// Receive every mutation applied from now on
    pub fn subscribe(&self) -> broadcast::Receiver<HierarchyEvent> {
        self.events.subscribe()
    }

    /// Consistent copy of every collection
    pub async fn snapshot(&self) -> Hierarchy {
        self.state.lock().await.clone()
    }

    /// Write every collection again, e.g. after a failed write-through
    pub async fn flush(&self) -> TerragruntResult<()> {
        let state = self.state.lock().await;
        for kind in [
            EntityKind::Account,
            EntityKind::Region,
            EntityKind::Environment,
            EntityKind::Component,
            EntityKind::Service,
        ] {
            self.persist(&state, kind).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    pub async fn accounts(&self) -> Vec<Account> {
        self.state.lock().await.accounts.clone()
    }

    pub async fn account(&self, id: &AccountId) -> Option<Account> {
        self.state.lock().await.account(id).cloned()
    }

    pub async fn create_account(
        &self,
        draft: AccountDraft,
    ) -> TerragruntResult<Committed<Account>> {
        let mut state = self.state.lock().await;
        let id = draft
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(AccountId::generate);
        if state.account(&id).is_some() {
            return Err(already_exists(EntityKind::Account, id.as_str()));
        }

        let account = draft.build(id);
        state.accounts.push(account.clone());
        info!("Created account {} ({})", account.id, account.provider);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Created {
                    kind: EntityKind::Account,
                    id: account.id.to_string(),
                },
                &[EntityKind::Account],
            )
            .await;
        Ok(Committed {
            entity: account,
            persisted,
        })
    }

    /// Update an account; a provider change is copied onto its regions
    pub async fn update_account(
        &self,
        id: &AccountId,
        patch: AccountPatch,
    ) -> TerragruntResult<Committed<Account>> {
        let mut state = self.state.lock().await;
        let index = state
            .accounts
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| TerragruntError::not_found("account", id.as_str()))?;

        state.accounts[index].apply(patch);
        let account = state.accounts[index].clone();

        let mut synced = 0;
        for region in state.regions.iter_mut().filter(|r| &r.account_id == id) {
            if region.provider != account.provider {
                region.provider = account.provider;
                synced += 1;
            }
        }
        if synced > 0 {
            debug!("Synced provider {} onto {} region(s)", account.provider, synced);
        }
        info!("Updated account {}", account.id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Updated {
                    kind: EntityKind::Account,
                    id: account.id.to_string(),
                },
                &[EntityKind::Account, EntityKind::Region],
            )
            .await;
        Ok(Committed {
            entity: account,
            persisted,
        })
    }

    pub async fn delete_account(&self, id: &AccountId) -> TerragruntResult<Committed<Account>> {
        let mut state = self.state.lock().await;
        let index = state
            .accounts
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| TerragruntError::not_found("account", id.as_str()))?;
        ensure_account_deletable(&state, id)?;

        let account = state.accounts.remove(index);
        info!("Deleted account {}", account.id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Deleted {
                    kind: EntityKind::Account,
                    id: account.id.to_string(),
                },
                &[EntityKind::Account],
            )
            .await;
        Ok(Committed {
            entity: account,
            persisted,
        })
    }

    // ------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------

    pub async fn regions(&self) -> Vec<Region> {
        self.state.lock().await.regions.clone()
    }

    pub async fn region(&self, id: &RegionId) -> Option<Region> {
        self.state.lock().await.region(id).cloned()
    }

    /// Create a region; its provider is copied from the owning account
    pub async fn create_region(&self, draft: RegionDraft) -> TerragruntResult<Committed<Region>> {
        let mut state = self.state.lock().await;
        let provider = require_account(&state, &draft.account_id)?.provider;
        let id = draft
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(RegionId::generate);
        if state.region(&id).is_some() {
            return Err(already_exists(EntityKind::Region, id.as_str()));
        }

        let region = draft.build(id, provider);
        state.regions.push(region.clone());
        info!("Created region {} ({}) in account {}", region.id, region.code, region.account_id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Created {
                    kind: EntityKind::Region,
                    id: region.id.to_string(),
                },
                &[EntityKind::Region],
            )
            .await;
        Ok(Committed {
            entity: region,
            persisted,
        })
    }

    /// Update a region; moving it to another account re-derives its provider
    pub async fn update_region(
        &self,
        id: &RegionId,
        patch: RegionPatch,
    ) -> TerragruntResult<Committed<Region>> {
        let mut state = self.state.lock().await;
        let index = state
            .regions
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| TerragruntError::not_found("region", id.as_str()))?;
        let moved_to = match &patch.account_id {
            Some(account_id) => Some((
                account_id.clone(),
                require_account(&state, account_id)?.provider,
            )),
            None => None,
        };

        let region = &mut state.regions[index];
        region.apply(&patch);
        if let Some((account_id, provider)) = moved_to {
            region.account_id = account_id;
            region.provider = provider;
        }
        let region = region.clone();
        info!("Updated region {}", region.id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Updated {
                    kind: EntityKind::Region,
                    id: region.id.to_string(),
                },
                &[EntityKind::Region],
            )
            .await;
        Ok(Committed {
            entity: region,
            persisted,
        })
    }

    pub async fn delete_region(&self, id: &RegionId) -> TerragruntResult<Committed<Region>> {
        let mut state = self.state.lock().await;
        let index = state
            .regions
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| TerragruntError::not_found("region", id.as_str()))?;
        ensure_region_deletable(&state, id)?;

        let region = state.regions.remove(index);
        info!("Deleted region {}", region.id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Deleted {
                    kind: EntityKind::Region,
                    id: region.id.to_string(),
                },
                &[EntityKind::Region],
            )
            .await;
        Ok(Committed {
            entity: region,
            persisted,
        })
    }

    // ------------------------------------------------------------------
    // Environments
    // ------------------------------------------------------------------

    pub async fn environments(&self) -> Vec<Environment> {
        self.state.lock().await.environments.clone()
    }

    pub async fn environment(&self, id: &EnvironmentId) -> Option<Environment> {
        self.state.lock().await.environment(id).cloned()
    }

    pub async fn create_environment(
        &self,
        draft: EnvironmentDraft,
    ) -> TerragruntResult<Committed<Environment>> {
        let mut state = self.state.lock().await;
        require_region(&state, &draft.region_id)?;
        let id = draft
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(EnvironmentId::generate);
        if state.environment(&id).is_some() {
            return Err(already_exists(EntityKind::Environment, id.as_str()));
        }

        let environment = draft.build(id);
        state.environments.push(environment.clone());
        info!(
            "Created environment {} in region {} (bucket {})",
            environment.id, environment.region_id, environment.bucket_name
        );

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Created {
                    kind: EntityKind::Environment,
                    id: environment.id.to_string(),
                },
                &[EntityKind::Environment],
            )
            .await;
        Ok(Committed {
            entity: environment,
            persisted,
        })
    }

    pub async fn update_environment(
        &self,
        id: &EnvironmentId,
        patch: EnvironmentPatch,
    ) -> TerragruntResult<Committed<Environment>> {
        let mut state = self.state.lock().await;
        let index = state
            .environments
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| TerragruntError::not_found("environment", id.as_str()))?;
        if let Some(region_id) = &patch.region_id {
            require_region(&state, region_id)?;
        }

        state.environments[index].apply(patch);
        let environment = state.environments[index].clone();
        info!("Updated environment {}", environment.id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Updated {
                    kind: EntityKind::Environment,
                    id: environment.id.to_string(),
                },
                &[EntityKind::Environment],
            )
            .await;
        Ok(Committed {
            entity: environment,
            persisted,
        })
    }

    /// Delete an environment that no component or service lives in
    ///
    /// Children are never removed implicitly, so an environment is torn
    /// down by deleting its components and services first.
    pub async fn delete_environment(
        &self,
        id: &EnvironmentId,
    ) -> TerragruntResult<Committed<Environment>> {
        let mut state = self.state.lock().await;
        let index = state
            .environments
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| TerragruntError::not_found("environment", id.as_str()))?;
        ensure_environment_deletable(&state, id)?;

        let environment = state.environments.remove(index);
        info!("Deleted environment {}", environment.id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Deleted {
                    kind: EntityKind::Environment,
                    id: environment.id.to_string(),
                },
                &[EntityKind::Environment],
            )
            .await;
        Ok(Committed {
            entity: environment,
            persisted,
        })
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    pub async fn components(&self) -> Vec<Component> {
        self.state.lock().await.components.clone()
    }

    pub async fn component(&self, id: &ComponentId) -> Option<Component> {
        self.state.lock().await.component(id).cloned()
    }

    pub async fn create_component(
        &self,
        draft: ComponentDraft,
    ) -> TerragruntResult<Committed<Component>> {
        let mut state = self.state.lock().await;
        require_environment(&state, &draft.environment_id)?;
        let id = draft
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(ComponentId::generate);
        if state.component(&id).is_some() {
            return Err(already_exists(EntityKind::Component, id.as_str()));
        }

        let component = draft.build(id);
        state.components.push(component.clone());
        info!(
            "Created component {} ({}) in environment {}",
            component.id,
            component.pinned_source(),
            component.environment_id
        );

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Created {
                    kind: EntityKind::Component,
                    id: component.id.to_string(),
                },
                &[EntityKind::Component],
            )
            .await;
        Ok(Committed {
            entity: component,
            persisted,
        })
    }

    pub async fn update_component(
        &self,
        id: &ComponentId,
        patch: ComponentPatch,
    ) -> TerragruntResult<Committed<Component>> {
        let mut state = self.state.lock().await;
        let index = state
            .components
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| TerragruntError::not_found("component", id.as_str()))?;
        if let Some(environment_id) = &patch.environment_id {
            require_environment(&state, environment_id)?;
            if environment_id != &state.components[index].environment_id {
                ensure_component_movable(&state, id, environment_id)?;
            }
        }

        state.components[index].apply(patch);
        let component = state.components[index].clone();
        info!("Updated component {}", component.id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Updated {
                    kind: EntityKind::Component,
                    id: component.id.to_string(),
                },
                &[EntityKind::Component],
            )
            .await;
        Ok(Committed {
            entity: component,
            persisted,
        })
    }

    /// Delete a component
    ///
    /// Services referencing it keep the dangling id; generation skips it
    /// with a warning.
    pub async fn delete_component(
        &self,
        id: &ComponentId,
    ) -> TerragruntResult<Committed<Component>> {
        let mut state = self.state.lock().await;
        let index = state
            .components
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| TerragruntError::not_found("component", id.as_str()))?;

        let dependents = state
            .services
            .iter()
            .filter(|s| s.component_dependencies.contains(id))
            .count();
        if dependents > 0 {
            warn!(
                "Deleting component {} still referenced by {} service(s)",
                id, dependents
            );
        }

        let component = state.components.remove(index);
        info!("Deleted component {}", component.id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Deleted {
                    kind: EntityKind::Component,
                    id: component.id.to_string(),
                },
                &[EntityKind::Component],
            )
            .await;
        Ok(Committed {
            entity: component,
            persisted,
        })
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    pub async fn services(&self) -> Vec<Service> {
        self.state.lock().await.services.clone()
    }

    pub async fn service(&self, id: &ServiceId) -> Option<Service> {
        self.state.lock().await.service(id).cloned()
    }

    pub async fn create_service(
        &self,
        draft: ServiceDraft,
    ) -> TerragruntResult<Committed<Service>> {
        let mut state = self.state.lock().await;
        require_environment(&state, &draft.environment_id)?;
        validate_service_dependencies(
            &state,
            &draft.environment_id,
            &draft.component_dependencies,
        )?;
        let id = draft
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(ServiceId::generate);
        if state.service(&id).is_some() {
            return Err(already_exists(EntityKind::Service, id.as_str()));
        }

        let service = draft.build(id);
        state.services.push(service.clone());
        info!(
            "Created service {} in environment {} with {} dependencies",
            service.id,
            service.environment_id,
            service.component_dependencies.len()
        );

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Created {
                    kind: EntityKind::Service,
                    id: service.id.to_string(),
                },
                &[EntityKind::Service],
            )
            .await;
        Ok(Committed {
            entity: service,
            persisted,
        })
    }

    /// Update a service; a changed environment or dependency set is revalidated
    pub async fn update_service(
        &self,
        id: &ServiceId,
        patch: ServicePatch,
    ) -> TerragruntResult<Committed<Service>> {
        let mut state = self.state.lock().await;
        let index = state
            .services
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| TerragruntError::not_found("service", id.as_str()))?;

        if patch.environment_id.is_some() || patch.component_dependencies.is_some() {
            let current = &state.services[index];
            let environment_id = patch
                .environment_id
                .clone()
                .unwrap_or_else(|| current.environment_id.clone());
            let dependencies = patch
                .component_dependencies
                .clone()
                .unwrap_or_else(|| current.component_dependencies.clone());
            require_environment(&state, &environment_id)?;
            validate_service_dependencies(&state, &environment_id, &dependencies)?;
        }

        state.services[index].apply(patch);
        let service = state.services[index].clone();
        info!("Updated service {}", service.id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Updated {
                    kind: EntityKind::Service,
                    id: service.id.to_string(),
                },
                &[EntityKind::Service],
            )
            .await;
        Ok(Committed {
            entity: service,
            persisted,
        })
    }

    pub async fn delete_service(&self, id: &ServiceId) -> TerragruntResult<Committed<Service>> {
        let mut state = self.state.lock().await;
        let index = state
            .services
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| TerragruntError::not_found("service", id.as_str()))?;

        let service = state.services.remove(index);
        info!("Deleted service {}", service.id);

        let persisted = self
            .commit(
                &state,
                HierarchyEvent::Deleted {
                    kind: EntityKind::Service,
                    id: service.id.to_string(),
                },
                &[EntityKind::Service],
            )
            .await;
        Ok(Committed {
            entity: service,
            persisted,
        })
    }

    // ------------------------------------------------------------------
    // Write-through
    // ------------------------------------------------------------------

    /// Publish the event, then write the touched collections
    async fn commit(
        &self,
        state: &Hierarchy,
        event: HierarchyEvent,
        touched: &[EntityKind],
    ) -> TerragruntResult<()> {
        // No receivers is not an error
        let _ = self.events.send(event);

        for kind in touched {
            if let Err(e) = self.persist(state, *kind).await {
                warn!("Write-through of {} failed: {}", kind.collection(), e);
                return Err(e);
            }
        }
        Ok(())
    }

    async fn persist(&self, state: &Hierarchy, kind: EntityKind) -> TerragruntResult<()> {
        let documents = self.documents.as_ref();
        let name = kind.collection();
        let result = match kind {
            EntityKind::Account => save_typed(documents, name, &state.accounts).await,
            EntityKind::Region => save_typed(documents, name, &state.regions).await,
            EntityKind::Environment => save_typed(documents, name, &state.environments).await,
            EntityKind::Component => save_typed(documents, name, &state.components).await,
            EntityKind::Service => save_typed(documents, name, &state.services).await,
        };
        result.map_err(|e| match e {
            TerragruntError::Persistence(_) => e,
            other => TerragruntError::Persistence(other.to_string()),
        })
    }
}
