// Copyright (c) 2025 - Cowboy AI, Inc.
//! Workload entities: Components and Services inside an Environment
//!
//! Inputs are kept in a `BTreeMap` so that every serialization walks keys in
//! lexicographic order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{ComponentId, EnvironmentId, ServiceId};

/// Arbitrary module inputs passed through to generated configuration
pub type Inputs = BTreeMap<String, Value>;

/// A single infrastructure unit instantiated from a module source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub environment_id: EnvironmentId,
    /// Module source locator (registry path or URL)
    pub source: String,
    pub version: String,
    #[serde(default)]
    pub inputs: Inputs,
    /// Declared outputs, only consulted by the dependency graph heuristic
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: Inputs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_module: Option<String>,
}

/// Creation input for a [`Component`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentDraft {
    pub id: Option<ComponentId>,
    pub name: String,
    pub description: Option<String>,
    pub environment_id: EnvironmentId,
    pub source: String,
    pub version: String,
    pub inputs: Inputs,
    pub outputs: Inputs,
    pub registry_namespace: Option<String>,
    pub registry_module: Option<String>,
}

/// Partial update for a [`Component`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub environment_id: Option<EnvironmentId>,
    pub source: Option<String>,
    pub version: Option<String>,
    pub inputs: Option<Inputs>,
    pub outputs: Option<Inputs>,
}

impl ComponentDraft {
    pub fn new(
        name: impl Into<String>,
        environment_id: impl Into<EnvironmentId>,
        source: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            environment_id: environment_id.into(),
            source: source.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<ComponentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }

    pub fn with_output(mut self, key: impl Into<String>, value: Value) -> Self {
        self.outputs.insert(key.into(), value);
        self
    }

    pub(crate) fn build(self, id: ComponentId) -> Component {
        Component {
            id,
            name: self.name,
            description: self.description,
            environment_id: self.environment_id,
            source: self.source,
            version: self.version,
            inputs: self.inputs,
            outputs: self.outputs,
            registry_namespace: self.registry_namespace,
            registry_module: self.registry_module,
        }
    }
}

impl Component {
    /// Pinned module reference as written into the artifact
    pub fn pinned_source(&self) -> String {
        format!("{}//{}", self.source, self.version)
    }

    pub(crate) fn apply(&mut self, patch: ComponentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(environment_id) = patch.environment_id {
            self.environment_id = environment_id;
        }
        if let Some(source) = patch.source {
            self.source = source;
        }
        if let Some(version) = patch.version {
            self.version = version;
        }
        if let Some(inputs) = patch.inputs {
            self.inputs = inputs;
        }
        if let Some(outputs) = patch.outputs {
            self.outputs = outputs;
        }
    }
}

/// A higher-level unit that depends on Components of the same Environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub environment_id: EnvironmentId,
    pub module_source: String,
    pub version: String,
    #[serde(default)]
    pub inputs: Inputs,
    /// Ordered, duplicate-free set of component ids
    #[serde(default)]
    pub component_dependencies: Vec<ComponentId>,
}

/// Creation input for a [`Service`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDraft {
    pub id: Option<ServiceId>,
    pub name: String,
    pub description: Option<String>,
    pub environment_id: EnvironmentId,
    pub module_source: String,
    pub version: String,
    pub inputs: Inputs,
    pub component_dependencies: Vec<ComponentId>,
}

/// Partial update for a [`Service`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub environment_id: Option<EnvironmentId>,
    pub module_source: Option<String>,
    pub version: Option<String>,
    pub inputs: Option<Inputs>,
    pub component_dependencies: Option<Vec<ComponentId>>,
}

impl ServiceDraft {
    pub fn new(
        name: impl Into<String>,
        environment_id: impl Into<EnvironmentId>,
        module_source: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            environment_id: environment_id.into(),
            module_source: module_source.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<ServiceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }

    pub fn depends_on(mut self, component_id: impl Into<ComponentId>) -> Self {
        self.component_dependencies.push(component_id.into());
        self
    }

    pub(crate) fn build(self, id: ServiceId) -> Service {
        Service {
            id,
            name: self.name,
            description: self.description,
            environment_id: self.environment_id,
            module_source: self.module_source,
            version: self.version,
            inputs: self.inputs,
            component_dependencies: dedup_preserving_order(self.component_dependencies),
        }
    }
}

impl Service {
    /// Pinned module reference as written into the artifact
    pub fn pinned_source(&self) -> String {
        format!("{}//{}", self.module_source, self.version)
    }

    pub(crate) fn apply(&mut self, patch: ServicePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(environment_id) = patch.environment_id {
            self.environment_id = environment_id;
        }
        if let Some(module_source) = patch.module_source {
            self.module_source = module_source;
        }
        if let Some(version) = patch.version {
            self.version = version;
        }
        if let Some(inputs) = patch.inputs {
            self.inputs = inputs;
        }
        if let Some(dependencies) = patch.component_dependencies {
            self.component_dependencies = dedup_preserving_order(dependencies);
        }
    }
}

fn dedup_preserving_order(ids: Vec<ComponentId>) -> Vec<ComponentId> {
    let mut unique: Vec<ComponentId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
