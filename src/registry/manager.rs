// Copyright (c) 2025 - Cowboy AI, Inc.
//! Registry selection state and module query proxy

use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::connector::RegistryConnector;
use super::{Module, RegistryConfig, RegistryEvent, RegistryPatch, RegistryType};
use crate::domain::RegistryId;
use crate::errors::{TerragruntError, TerragruntResult};
use crate::hierarchy::EVENT_CHANNEL_CAPACITY;
use crate::persistence::{collections, load_typed, save_typed, DocumentStore};

/// Name given to a registry imported from a legacy Terrareg setting
pub const LEGACY_IMPORT_NAME: &str = "Terrareg (Imported)";

#[derive(Debug, Default)]
struct RegistryState {
    registries: Vec<RegistryConfig>,
    active_id: Option<RegistryId>,
    connected: bool,
}

impl RegistryState {
    fn index_of(&self, id: &RegistryId) -> TerragruntResult<usize> {
        self.registries
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| TerragruntError::not_found("registry", id.as_str()))
    }

    fn active(&self) -> Option<&RegistryConfig> {
        let id = self.active_id.as_ref()?;
        self.registries.iter().find(|r| &r.id == id)
    }

    fn default_registry(&self) -> Option<&RegistryConfig> {
        self.registries.iter().find(|r| r.is_default)
    }

    /// Clear the default flag on every registry except `keep`
    fn make_sole_default(&mut self, keep: &RegistryId) {
        for registry in self.registries.iter_mut() {
            registry.is_default = &registry.id == keep;
        }
    }

    /// First default wins; without one the first registry becomes default
    fn normalize_default(&mut self) {
        match self.default_registry().map(|r| r.id.clone()) {
            Some(id) => self.make_sole_default(&id),
            None => {
                if let Some(first) = self.registries.first_mut() {
                    first.is_default = true;
                }
            }
        }
    }

    /// Point `active_id` at `id` and reset the connection flag
    fn select(&mut self, id: Option<RegistryId>) -> Option<RegistryConfig> {
        self.active_id = id;
        self.connected = false;
        self.active().cloned()
    }
}

/// Registry Manager
///
/// Connection tests run without holding the state lock. A result is applied
/// only if the tested registry is still the active one when it arrives.
pub struct RegistryManager {
    state: Mutex<RegistryState>,
    documents: Arc<dyn DocumentStore>,
    connector: Arc<dyn RegistryConnector>,
    events: broadcast::Sender<RegistryEvent>,
}

impl std::fmt::Debug for RegistryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryManager").finish_non_exhaustive()
    }
}

impl RegistryManager {
    /// Manager without any registry
    pub fn new(documents: Arc<dyn DocumentStore>, connector: Arc<dyn RegistryConnector>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(RegistryState::default()),
            documents,
            connector,
            events,
        }
    }

    /// Load the `registries` collection and activate the default registry
    pub async fn load(
        documents: Arc<dyn DocumentStore>,
        connector: Arc<dyn RegistryConnector>,
    ) -> TerragruntResult<Self> {
        let registries: Vec<RegistryConfig> =
            load_typed(documents.as_ref(), collections::REGISTRIES).await?;
        let manager = Self::new(documents, connector);

        let probe = {
            let mut state = manager.state.lock().await;
            state.registries = registries;
            state.normalize_default();
            let default_id = state.default_registry().map(|r| r.id.clone());
            info!("Loaded {} registries", state.registries.len());
            state.select(default_id)
        };
        if let Some(config) = probe {
            manager.refresh_connection(config).await;
        }
        Ok(manager)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub async fn registries(&self) -> Vec<RegistryConfig> {
        self.state.lock().await.registries.clone()
    }

    pub async fn registry(&self, id: &RegistryId) -> Option<RegistryConfig> {
        let state = self.state.lock().await;
        state.registries.iter().find(|r| &r.id == id).cloned()
    }

    pub async fn active_registry(&self) -> Option<RegistryConfig> {
        self.state.lock().await.active().cloned()
    }

    pub async fn default_registry(&self) -> Option<RegistryConfig> {
        self.state.lock().await.default_registry().cloned()
    }

    /// Result of the last connection test of the active registry
    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.connected
    }

    /// Whether any registry is configured
    pub async fn is_configured(&self) -> bool {
        !self.state.lock().await.registries.is_empty()
    }

    /// Add a registry
    ///
    /// The first registry is forced to be default. A default registry clears
    /// the flag on every other one. The registry becomes active when it is
    /// the first one, or when it is default and nothing is active yet.
    pub async fn add_registry(&self, mut config: RegistryConfig) -> TerragruntResult<RegistryConfig> {
        let (added, probe, persisted) = {
            let mut state = self.state.lock().await;
            if config.id.is_empty() {
                config.id = RegistryId::generate();
            } else if state.registries.iter().any(|r| r.id == config.id) {
                return Err(TerragruntError::Validation(format!(
                    "registry {} already exists",
                    config.id
                )));
            }

            let first = state.registries.is_empty();
            if first {
                config.is_default = true;
            }
            state.registries.push(config.clone());
            if config.is_default {
                state.make_sole_default(&config.id);
            }
            info!(
                "Added {} registry {} ({})",
                config.registry_type, config.id, config.url
            );
            self.notify(RegistryEvent::Added {
                id: config.id.clone(),
            });

            let probe = if first || (config.is_default && state.active_id.is_none()) {
                self.activate(&mut state, Some(config.id.clone()))
            } else {
                None
            };
            let persisted = self.persist(&state).await;
            (config, probe, persisted)
        };

        if let Some(active) = probe {
            self.refresh_connection(active).await;
        }
        persisted.map(|_| added)
    }

    /// Update a registry
    ///
    /// Clearing the flag on the default promotes the first other registry;
    /// the only registry stays default. The active registry is re-tested.
    pub async fn update_registry(
        &self,
        id: &RegistryId,
        patch: RegistryPatch,
    ) -> TerragruntResult<RegistryConfig> {
        let (updated, probe, persisted) = {
            let mut state = self.state.lock().await;
            let index = state.index_of(id)?;
            let was_default = state.registries[index].is_default;

            state.registries[index].apply(&patch);
            match patch.is_default {
                Some(true) => state.make_sole_default(id),
                Some(false) if was_default => {
                    match state.registries.iter().position(|r| &r.id != id) {
                        Some(other) => {
                            let promoted = state.registries[other].id.clone();
                            debug!("Promoting {} to default", promoted);
                            state.make_sole_default(&promoted);
                        }
                        None => state.registries[index].is_default = true,
                    }
                }
                _ => {}
            }
            let updated = state.registries[index].clone();
            info!("Updated registry {}", id);
            self.notify(RegistryEvent::Updated { id: id.clone() });

            let probe = if state.active_id.as_ref() == Some(id) {
                state.connected = false;
                Some(updated.clone())
            } else if patch.is_default == Some(true) && state.active_id.is_none() {
                self.activate(&mut state, Some(id.clone()))
            } else {
                None
            };
            let persisted = self.persist(&state).await;
            (updated, probe, persisted)
        };

        if let Some(active) = probe {
            self.refresh_connection(active).await;
        }
        persisted.map(|_| updated)
    }

    /// Delete a registry, promoting a new default and active registry
    pub async fn delete_registry(&self, id: &RegistryId) -> TerragruntResult<RegistryConfig> {
        let (removed, probe, persisted) = {
            let mut state = self.state.lock().await;
            let index = state.index_of(id)?;
            let removed = state.registries.remove(index);

            if removed.is_default {
                if let Some(first) = state.registries.first_mut() {
                    first.is_default = true;
                    debug!("Promoted {} to default", first.id);
                }
            }
            info!("Deleted registry {}", id);
            self.notify(RegistryEvent::Deleted { id: id.clone() });

            let probe = if state.active_id.as_ref() == Some(id) {
                let next = state
                    .default_registry()
                    .or_else(|| state.registries.first())
                    .map(|r| r.id.clone());
                self.activate(&mut state, next)
            } else {
                None
            };
            let persisted = self.persist(&state).await;
            (removed, probe, persisted)
        };

        if let Some(active) = probe {
            self.refresh_connection(active).await;
        }
        persisted.map(|_| removed)
    }

    /// Make a registry active and test its connection
    pub async fn set_active(&self, id: &RegistryId) -> TerragruntResult<bool> {
        let config = {
            let mut state = self.state.lock().await;
            state.index_of(id)?;
            self.activate(&mut state, Some(id.clone()))
        };
        match config {
            Some(config) => Ok(self.refresh_connection(config).await),
            None => Ok(false),
        }
    }

    /// Probe a registry; disabled registries are never contacted
    pub async fn test_connection(&self, config: &RegistryConfig) -> bool {
        if !config.is_enabled {
            debug!("Registry {} is disabled", config.id);
            return false;
        }
        match self.connector.connect(config) {
            Ok(backend) => {
                let connected = backend.test_connection().await;
                info!(
                    "Connection test for registry {} ({}): {}",
                    config.id,
                    config.registry_type,
                    if connected { "ok" } else { "failed" }
                );
                connected
            }
            Err(e) => {
                warn!("Cannot connect to registry {}: {}", config.id, e);
                false
            }
        }
    }

    pub async fn get_namespaces(&self) -> TerragruntResult<Vec<String>> {
        let (_, backend) = self.connected_backend().await?;
        backend.list_namespaces().await
    }

    pub async fn get_modules(&self, namespace: &str) -> TerragruntResult<Vec<Module>> {
        let (id, backend) = self.connected_backend().await?;
        let modules = backend.list_modules(namespace).await?;
        Ok(stamp(modules, &id))
    }

    pub async fn search_modules(&self, query: &str) -> TerragruntResult<Vec<Module>> {
        let (id, backend) = self.connected_backend().await?;
        let modules = backend.search_modules(query).await?;
        Ok(stamp(modules, &id))
    }

    /// Published versions of a module, newest first
    pub async fn get_module_versions(
        &self,
        namespace: &str,
        name: &str,
        provider: &str,
    ) -> TerragruntResult<Vec<String>> {
        let (_, backend) = self.connected_backend().await?;
        backend.module_versions(namespace, name, provider).await
    }

    /// Import a legacy single-Terrareg setting as a registry
    ///
    /// Returns `false` when a Terrareg registry with this URL already exists.
    pub async fn import_legacy_terrareg(
        &self,
        url: &str,
        api_key: Option<String>,
        auto_update_modules: bool,
    ) -> TerragruntResult<bool> {
        let exists = {
            let state = self.state.lock().await;
            state
                .registries
                .iter()
                .any(|r| r.registry_type == RegistryType::Terrareg && r.url == url)
        };
        if exists {
            debug!("Terrareg registry {} already imported", url);
            return Ok(false);
        }

        let mut config = RegistryConfig::new(LEGACY_IMPORT_NAME, RegistryType::Terrareg, url);
        config.api_key = api_key;
        config.auto_update_modules = auto_update_modules;
        self.add_registry(config).await?;
        Ok(true)
    }

    /// Select `id`, returning the registry to probe
    fn activate(&self, state: &mut RegistryState, id: Option<RegistryId>) -> Option<RegistryConfig> {
        let selected = state.select(id.clone());
        info!(
            "Active registry is now {}",
            id.as_ref().map(|i| i.as_str()).unwrap_or("none")
        );
        self.notify(RegistryEvent::ActiveChanged { id });
        selected
    }

    /// Test `config` and record the result if it is still active
    async fn refresh_connection(&self, config: RegistryConfig) -> bool {
        let connected = self.test_connection(&config).await;

        let mut state = self.state.lock().await;
        if state.active_id.as_ref() != Some(&config.id) {
            debug!(
                "Discarding stale connection result for registry {}",
                config.id
            );
            return state.connected;
        }
        state.connected = connected;
        self.notify(RegistryEvent::ConnectionChanged {
            id: config.id,
            connected,
        });
        connected
    }

    async fn connected_backend(
        &self,
    ) -> TerragruntResult<(RegistryId, Arc<dyn super::RegistryBackend>)> {
        let active = {
            let state = self.state.lock().await;
            match state.active() {
                Some(active) if state.connected => active.clone(),
                _ => return Err(TerragruntError::NotConnected),
            }
        };
        let backend = self.connector.connect(&active)?;
        Ok((active.id, backend))
    }

    async fn persist(&self, state: &RegistryState) -> TerragruntResult<()> {
        save_typed(
            self.documents.as_ref(),
            collections::REGISTRIES,
            &state.registries,
        )
        .await
        .map_err(|e| {
            warn!("Saving registries failed: {}", e);
            match e {
                TerragruntError::Persistence(_) => e,
                other => TerragruntError::Persistence(other.to_string()),
            }
        })
    }

    fn notify(&self, event: RegistryEvent) {
        // No receivers is not an error
        let _ = self.events.send(event);
    }
}

fn stamp(modules: Vec<Module>, registry_id: &RegistryId) -> Vec<Module> {
    modules
        .into_iter()
        .map(|mut module| {
            module.registry_id = Some(registry_id.clone());
            module
        })
        .collect()
}
