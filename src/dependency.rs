// Copyright (c) 2025 - Cowboy AI, Inc.
//! Dependency Resolver
//!
//! Computes the edges between the components and services of one
//! environment.
//!
//! ```text
//!   Service ──depends on──▶ Component      resolved, used by the generator
//!   Component ┄┄suggests┄┄▶ Component      heuristic, graph view only
//! ```
//!
//! Service edges come from `component_dependencies`. Ids that do not resolve
//! to a component of the same environment are reported as warnings and never
//! become edges.
//!
//! Component edges are suggested when an input key of one component is an
//! output key of another, or when the input key contains the other
//! component's name. The heuristic is approximate and may produce false
//! positives; nothing but the graph view consumes it.
//!
//! Services cannot depend on services, so the graph is one level deep and
//! acyclic. Allowing service-to-service edges would require DFS cycle
//! detection here.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::domain::{Component, ComponentId, EnvironmentId, Hierarchy, Service, ServiceId};

/// Resolved `Service → Component` edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub service_id: ServiceId,
    pub component_id: ComponentId,
}

/// Why a dependency id was not turned into an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// No component with this id exists
    Missing,
    /// The component lives in another environment
    OtherEnvironment,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::Missing => write!(f, "component does not exist"),
            UnresolvedReason::OtherEnvironment => {
                write!(f, "component belongs to another environment")
            }
        }
    }
}

/// Non-fatal warning about a dependency id that was skipped
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyWarning {
    pub service_id: ServiceId,
    pub component_id: ComponentId,
    pub reason: UnresolvedReason,
}

impl fmt::Display for DependencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "service {} depends on {}: {}",
            self.service_id, self.component_id, self.reason
        )
    }
}

/// Edges and warnings for a set of services
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDependencies {
    pub edges: Vec<DependencyEdge>,
    pub warnings: Vec<DependencyWarning>,
}

/// Resolve the component dependencies of `services` against `components`
///
/// A dependency resolves when the component exists and shares the service's
/// environment. Edge order follows service order, then dependency order.
pub fn resolve(components: &[Component], services: &[Service]) -> ResolvedDependencies {
    let mut resolved = ResolvedDependencies::default();

    for service in services {
        for component_id in &service.component_dependencies {
            match components.iter().find(|c| &c.id == component_id) {
                Some(component) if component.environment_id == service.environment_id => {
                    resolved.edges.push(DependencyEdge {
                        service_id: service.id.clone(),
                        component_id: component_id.clone(),
                    });
                }
                found => {
                    let reason = if found.is_some() {
                        UnresolvedReason::OtherEnvironment
                    } else {
                        UnresolvedReason::Missing
                    };
                    let warning = DependencyWarning {
                        service_id: service.id.clone(),
                        component_id: component_id.clone(),
                        reason,
                    };
                    warn!("Skipping dependency: {}", warning);
                    resolved.warnings.push(warning);
                }
            }
        }
    }

    debug!(
        "Resolved {} dependency edge(s), {} warning(s)",
        resolved.edges.len(),
        resolved.warnings.len()
    );
    resolved
}

/// Why a component edge was suggested
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum SuggestionReason {
    /// Input key equals one of the target's output keys
    SharedKey { key: String },
    /// Input key contains the target's name
    NameReference { key: String },
}

/// Heuristic `Component → Component` edge for the graph view
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestedEdge {
    pub from: ComponentId,
    pub to: ComponentId,
    pub reason: SuggestionReason,
}

/// Suggest component edges; at most one edge per ordered pair
pub fn suggest_component_edges(components: &[Component]) -> Vec<SuggestedEdge> {
    let mut edges = Vec::new();

    for from in components {
        for to in components.iter().filter(|c| c.id != from.id) {
            let shared = from.inputs.keys().find(|key| to.outputs.contains_key(*key));
            let reason = match shared {
                Some(key) => Some(SuggestionReason::SharedKey { key: key.clone() }),
                // An empty name is a substring of every key
                None if to.name.is_empty() => None,
                None => from
                    .inputs
                    .keys()
                    .find(|key| key.contains(to.name.as_str()))
                    .map(|key| SuggestionReason::NameReference { key: key.clone() }),
            };
            if let Some(reason) = reason {
                edges.push(SuggestedEdge {
                    from: from.id.clone(),
                    to: to.id.clone(),
                    reason,
                });
            }
        }
    }
    edges
}

/// Every edge of one environment, for visualization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub environment_id: EnvironmentId,
    pub components: Vec<ComponentId>,
    pub services: Vec<ServiceId>,
    pub service_edges: Vec<DependencyEdge>,
    pub component_edges: Vec<SuggestedEdge>,
    pub warnings: Vec<DependencyWarning>,
}

impl DependencyGraph {
    /// Build the graph of `environment_id` from a hierarchy snapshot
    pub fn build(hierarchy: &Hierarchy, environment_id: &EnvironmentId) -> Self {
        let components: Vec<Component> =
            hierarchy.components_of(environment_id).cloned().collect();
        let services: Vec<Service> = hierarchy.services_of(environment_id).cloned().collect();

        // Resolve against every component so cross-environment ids are told
        // apart from deleted ones.
        let resolved = resolve(&hierarchy.components, &services);

        Self {
            environment_id: environment_id.clone(),
            components: components.iter().map(|c| c.id.clone()).collect(),
            services: services.iter().map(|s| s.id.clone()).collect(),
            service_edges: resolved.edges,
            component_edges: suggest_component_edges(&components),
            warnings: resolved.warnings,
        }
    }

    /// Components a service depends on, in declaration order
    pub fn dependencies_of<'a>(
        &'a self,
        service_id: &'a ServiceId,
    ) -> impl Iterator<Item = &'a ComponentId> + 'a {
        self.service_edges
            .iter()
            .filter(move |e| &e.service_id == service_id)
            .map(|e| &e.component_id)
    }

    /// Services depending on a component
    pub fn dependents_of<'a>(
        &'a self,
        component_id: &'a ComponentId,
    ) -> impl Iterator<Item = &'a ServiceId> + 'a {
        self.service_edges
            .iter()
            .filter(move |e| &e.component_id == component_id)
            .map(|e| &e.service_id)
    }
}
