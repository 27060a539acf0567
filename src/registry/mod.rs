// Copyright (c) 2025 - Cowboy AI, Inc.
//! Registry Manager
//!
//! Keeps the configured module registries, enforces the default and active
//! selection rules, and proxies module queries to the active registry.
//!
//! ```text
//! RegistryManager ──connect──▶ RegistryConnector ──▶ Arc<dyn RegistryBackend>
//!        │                                              ├── Terrareg          (real queries)
//!        │                                              ├── TerraformRegistry (probe only)
//!        │                                              ├── GitLab            (probe only)
//!        │                                              ├── GitHub            (probe only)
//!        │                                              └── Custom            (probe only)
//!        └── broadcast::Sender<RegistryEvent>
//! ```
//!
//! # Selection rules
//!
//! - At most one registry is default; a non-empty set has exactly one.
//! - The active registry is independent of the default. It is chosen on
//!   load (the default), on the first add, and when the active registry is
//!   deleted (the new default, else the first remaining one).
//! - Queries require an active registry whose last connection test passed.

pub mod backend;
pub mod connector;
pub mod http;
pub mod manager;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::RegistryId;
use crate::errors::TerragruntError;

pub use backend::{Custom, GitHub, GitLab, RegistryBackend, TerraformRegistry, Terrareg};
pub use connector::{HttpRegistryConnector, RegistryConnector};
pub use manager::RegistryManager;

/// Kind of module registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistryType {
    Terrareg,
    TerraformRegistry,
    Gitlab,
    Github,
    Custom,
}

impl RegistryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryType::Terrareg => "TERRAREG",
            RegistryType::TerraformRegistry => "TERRAFORM_REGISTRY",
            RegistryType::Gitlab => "GITLAB",
            RegistryType::Github => "GITHUB",
            RegistryType::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for RegistryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistryType {
    type Err = TerragruntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TERRAREG" => Ok(RegistryType::Terrareg),
            "TERRAFORM_REGISTRY" => Ok(RegistryType::TerraformRegistry),
            "GITLAB" => Ok(RegistryType::Gitlab),
            "GITHUB" => Ok(RegistryType::Github),
            "CUSTOM" => Ok(RegistryType::Custom),
            other => Err(TerragruntError::Validation(format!(
                "unknown registry type: {}",
                other
            ))),
        }
    }
}

/// Configured module registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    pub id: RegistryId,
    pub name: String,
    #[serde(rename = "type")]
    pub registry_type: RegistryType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub auto_update_modules: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "enabled")]
    pub is_enabled: bool,
}

fn enabled() -> bool {
    true
}

impl RegistryConfig {
    /// Enabled, non-default registry without an id; one is assigned on add
    pub fn new(name: impl Into<String>, registry_type: RegistryType, url: impl Into<String>) -> Self {
        Self {
            id: RegistryId::default(),
            name: name.into(),
            registry_type,
            url: url.into(),
            api_key: None,
            auto_update_modules: false,
            is_default: false,
            is_enabled: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<RegistryId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub(crate) fn apply(&mut self, patch: &RegistryPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(registry_type) = patch.registry_type {
            self.registry_type = registry_type;
        }
        if let Some(url) = &patch.url {
            self.url = url.clone();
        }
        if let Some(api_key) = &patch.api_key {
            self.api_key = api_key.clone();
        }
        if let Some(auto_update) = patch.auto_update_modules {
            self.auto_update_modules = auto_update;
        }
        if let Some(is_default) = patch.is_default {
            self.is_default = is_default;
        }
        if let Some(is_enabled) = patch.is_enabled {
            self.is_enabled = is_enabled;
        }
    }
}

/// Partial registry update
///
/// `api_key: Some(None)` clears the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryPatch {
    pub name: Option<String>,
    pub registry_type: Option<RegistryType>,
    pub url: Option<String>,
    pub api_key: Option<Option<String>>,
    pub auto_update_modules: Option<bool>,
    pub is_default: Option<bool>,
    pub is_enabled: Option<bool>,
}

/// Module listed by a registry; never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// `{namespace}/{name}/{provider}`
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub provider: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<serde_json::Value>,
    /// Newest first
    #[serde(default)]
    pub versions: Vec<String>,
    /// Registry the module was listed by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_id: Option<RegistryId>,
}

impl Module {
    pub fn module_id(namespace: &str, name: &str, provider: &str) -> String {
        format!("{}/{}/{}", namespace, name, provider)
    }
}

/// Registry manager change notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum RegistryEvent {
    Added { id: RegistryId },
    Updated { id: RegistryId },
    Deleted { id: RegistryId },
    ActiveChanged { id: Option<RegistryId> },
    ConnectionChanged { id: RegistryId, connected: bool },
}
