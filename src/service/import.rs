// Copyright (c) 2025 - Cowboy AI, Inc.
//! Module import: turn a registry module into a component draft

use crate::domain::{ComponentDraft, EnvironmentId};
use crate::registry::Module;

/// Component draft instantiating `module` in an environment
///
/// The version is the newest published one, falling back to the module's
/// own version. The registry namespace is the first segment of the source.
/// A module without a source is addressed by its registry id.
pub fn component_from_module(module: &Module, environment_id: impl Into<EnvironmentId>) -> ComponentDraft {
    let source = if module.source.is_empty() {
        module.id.clone()
    } else {
        module.source.clone()
    };
    let version = module
        .versions
        .first()
        .cloned()
        .unwrap_or_else(|| module.version.clone());
    let namespace = source
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| module.namespace.clone());

    let mut draft = ComponentDraft::new(module.name.as_str(), environment_id, source, version);
    if !module.description.is_empty() {
        draft.description = Some(module.description.clone());
    }
    draft.registry_namespace = Some(namespace);
    draft.registry_module = Some(module.name.clone());
    draft
}
