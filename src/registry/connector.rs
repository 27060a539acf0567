// Copyright (c) 2025 - Cowboy AI, Inc.
//! Builds a backend for a registry configuration

use std::sync::Arc;

use super::backend::{Custom, GitHub, GitLab, RegistryBackend, TerraformRegistry, Terrareg};
use super::http::{HttpOptions, RegistryHttpClient};
use super::{RegistryConfig, RegistryType};
use crate::errors::TerragruntResult;

/// Source of registry backends
///
/// The manager asks for a fresh backend every time it talks to a registry,
/// so edits to URL or API key take effect immediately.
pub trait RegistryConnector: Send + Sync {
    fn connect(&self, config: &RegistryConfig) -> TerragruntResult<Arc<dyn RegistryBackend>>;
}

/// Production connector speaking HTTP
#[derive(Debug, Clone, Default)]
pub struct HttpRegistryConnector {
    options: HttpOptions,
}

impl HttpRegistryConnector {
    pub fn new(options: HttpOptions) -> Self {
        Self { options }
    }
}

impl RegistryConnector for HttpRegistryConnector {
    fn connect(&self, config: &RegistryConfig) -> TerragruntResult<Arc<dyn RegistryBackend>> {
        let client = RegistryHttpClient::new(config, &self.options)?;
        let backend: Arc<dyn RegistryBackend> = match config.registry_type {
            RegistryType::Terrareg => Arc::new(Terrareg::new(client)),
            RegistryType::TerraformRegistry => Arc::new(TerraformRegistry::new(client)),
            RegistryType::Gitlab => Arc::new(GitLab::new(client)),
            RegistryType::Github => Arc::new(GitHub::new(client)),
            RegistryType::Custom => Arc::new(Custom::new(client)),
        };
        Ok(backend)
    }
}
