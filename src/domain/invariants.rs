// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Hierarchy Invariants
//!
//! Every rule the [`HierarchyStore`](crate::hierarchy::HierarchyStore)
//! enforces lives here as a pure function over a [`Hierarchy`] view.
//!
//! # Invariant Categories
//!
//! 1. **Referential Invariants**: foreign keys resolve to existing parents
//! 2. **Deletion Invariants**: parents with live children cannot be removed
//! 3. **Locality Invariants**: service dependencies stay inside one environment
//!
//! All functions run before a mutation is applied, so a failure never leaves
//! partial state behind.

use super::{
    Account, AccountId, ComponentId, Environment, EntityKind, EnvironmentId, Hierarchy, Region,
    RegionId,
};
use crate::errors::{TerragruntError, TerragruntResult};

/// Resolve an account reference
pub fn require_account<'a>(
    hierarchy: &'a Hierarchy,
    id: &AccountId,
) -> TerragruntResult<&'a Account> {
    hierarchy
        .account(id)
        .ok_or_else(|| TerragruntError::referential(EntityKind::Account.as_str(), id.as_str()))
}

/// Resolve a region reference
pub fn require_region<'a>(hierarchy: &'a Hierarchy, id: &RegionId) -> TerragruntResult<&'a Region> {
    hierarchy
        .region(id)
        .ok_or_else(|| TerragruntError::referential(EntityKind::Region.as_str(), id.as_str()))
}

/// Resolve an environment reference
pub fn require_environment<'a>(
    hierarchy: &'a Hierarchy,
    id: &EnvironmentId,
) -> TerragruntResult<&'a Environment> {
    hierarchy
        .environment(id)
        .ok_or_else(|| TerragruntError::referential(EntityKind::Environment.as_str(), id.as_str()))
}

/// Validate an account can be deleted
///
/// # Rules
/// - No region may reference the account
pub fn ensure_account_deletable(hierarchy: &Hierarchy, id: &AccountId) -> TerragruntResult<()> {
    blocked_by(hierarchy.regions_of(id).count(), EntityKind::Region)
}

/// Validate a region can be deleted
///
/// # Rules
/// - No environment may reference the region
pub fn ensure_region_deletable(hierarchy: &Hierarchy, id: &RegionId) -> TerragruntResult<()> {
    blocked_by(hierarchy.environments_of(id).count(), EntityKind::Environment)
}

/// Validate an environment can be deleted
///
/// # Rules
/// - No component may live in the environment
/// - No service may live in the environment
pub fn ensure_environment_deletable(
    hierarchy: &Hierarchy,
    id: &EnvironmentId,
) -> TerragruntResult<()> {
    blocked_by(hierarchy.components_of(id).count(), EntityKind::Component)?;
    blocked_by(hierarchy.services_of(id).count(), EntityKind::Service)
}

/// Validate the dependency set of a service
///
/// # Rules
/// - Every id resolves to an existing component
/// - That component lives in the same environment as the service
pub fn validate_service_dependencies(
    hierarchy: &Hierarchy,
    environment_id: &EnvironmentId,
    dependencies: &[ComponentId],
) -> TerragruntResult<()> {
    for dependency in dependencies {
        match hierarchy.component(dependency) {
            None => {
                return Err(TerragruntError::referential(
                    EntityKind::Component.as_str(),
                    dependency.as_str(),
                ))
            }
            Some(component) if &component.environment_id != environment_id => {
                return Err(TerragruntError::referential(
                    format!("component of environment {}", environment_id),
                    dependency.as_str(),
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Validate a component can move to `target`
///
/// # Rules
/// - No service outside `target` may depend on the component
pub fn ensure_component_movable(
    hierarchy: &Hierarchy,
    id: &ComponentId,
    target: &EnvironmentId,
) -> TerragruntResult<()> {
    let stranded = hierarchy
        .services
        .iter()
        .filter(|s| &s.environment_id != target && s.component_dependencies.contains(id))
        .count();
    blocked_by(stranded, EntityKind::Service)
}

fn blocked_by(count: usize, dependent: EntityKind) -> TerragruntResult<()> {
    if count > 0 {
        return Err(TerragruntError::DependencyExists {
            count,
            dependent_kind: dependent.as_str().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AccountDraft, ComponentDraft, EnvironmentDraft, Provider, RegionDraft, ServiceDraft,
        ServiceId,
    };

    fn sample() -> Hierarchy {
        let mut hierarchy = Hierarchy::default();
        hierarchy
            .accounts
            .push(AccountDraft::new("prod", Provider::Aws).build(AccountId::new("a1")));
        hierarchy.regions.push(
            RegionDraft::new("east", "us-east-1", "a1").build(RegionId::new("r1"), Provider::Aws),
        );
        hierarchy
            .environments
            .push(EnvironmentDraft::new("dev", "r1", "tg-bucket").build(EnvironmentId::new("e1")));
        hierarchy
            .environments
            .push(EnvironmentDraft::new("qa", "r1", "tg-bucket").build(EnvironmentId::new("e2")));
        hierarchy.components.push(
            ComponentDraft::new("vpc", "e1", "src", "1").build(ComponentId::new("c1")),
        );
        hierarchy
    }

    #[test]
    fn test_require_account_missing() {
        let hierarchy = sample();
        let missing = AccountId::new("nope");
        let result = require_account(&hierarchy, &missing);
        assert!(matches!(
            result,
            Err(TerragruntError::Referential { ref kind, .. }) if kind == "account"
        ));
    }

    #[test]
    fn test_account_with_region_not_deletable() {
        let err = ensure_account_deletable(&sample(), &AccountId::new("a1")).unwrap_err();
        assert_eq!(
            err,
            TerragruntError::DependencyExists {
                count: 1,
                dependent_kind: "region".to_string()
            }
        );
    }

    #[test]
    fn test_region_with_environments_not_deletable() {
        let err = ensure_region_deletable(&sample(), &RegionId::new("r1")).unwrap_err();
        assert_eq!(
            err,
            TerragruntError::DependencyExists {
                count: 2,
                dependent_kind: "environment".to_string()
            }
        );
    }

    #[test]
    fn test_empty_environment_deletable() {
        assert!(ensure_environment_deletable(&sample(), &EnvironmentId::new("e2")).is_ok());
        assert!(ensure_environment_deletable(&sample(), &EnvironmentId::new("e1")).is_err());
    }

    #[test]
    fn test_cross_environment_dependency_rejected() {
        let hierarchy = sample();
        assert!(validate_service_dependencies(
            &hierarchy,
            &EnvironmentId::new("e1"),
            &[ComponentId::new("c1")]
        )
        .is_ok());

        assert!(matches!(
            validate_service_dependencies(
                &hierarchy,
                &EnvironmentId::new("e2"),
                &[ComponentId::new("c1")]
            ),
            Err(TerragruntError::Referential { .. })
        ));
    }

    #[test]
    fn test_component_with_remote_dependents_not_movable() {
        let mut hierarchy = sample();
        hierarchy.services.push(
            ServiceDraft::new("api", "e1", "src", "1")
                .depends_on("c1")
                .build(ServiceId::new("s1")),
        );

        let vpc = ComponentId::new("c1");
        let qa = EnvironmentId::new("e2");

        let err = ensure_component_movable(&hierarchy, &vpc, &qa).unwrap_err();
        assert_eq!(
            err,
            TerragruntError::DependencyExists {
                count: 1,
                dependent_kind: "service".to_string()
            }
        );

        // Services already in the target environment keep a local dependency
        hierarchy.services[0].environment_id = qa.clone();
        assert!(ensure_component_movable(&hierarchy, &vpc, &qa).is_ok());
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let result = validate_service_dependencies(
            &sample(),
            &EnvironmentId::new("e1"),
            &[ComponentId::new("ghost")],
        );
        assert!(result.is_err());
    }
}
