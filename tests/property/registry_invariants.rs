// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Registry Selection
//!
//! Random sequences of add, update, delete and activate must always leave a
//! non-empty registry list with exactly one default and an existing active
//! registry whose connection flag matches its reachability.

use cim_terragrunt::registry::RegistryPatch;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use crate::fixtures::{registry_manager, registry_url, terrareg, FakeConnector};

// ============================================================================
// Operations
// ============================================================================

#[derive(Debug, Clone)]
enum RegistryOp {
    Add { default: bool, reachable: bool },
    SetDefault { index: usize, default: bool },
    Delete { index: usize },
    Activate { index: usize },
}

fn registry_op() -> impl Strategy<Value = RegistryOp> {
    prop_oneof![
        3 => (any::<bool>(), any::<bool>())
            .prop_map(|(default, reachable)| RegistryOp::Add { default, reachable }),
        2 => (0usize..8, any::<bool>())
            .prop_map(|(index, default)| RegistryOp::SetDefault { index, default }),
        1 => (0usize..8).prop_map(|index| RegistryOp::Delete { index }),
        2 => (0usize..8).prop_map(|index| RegistryOp::Activate { index }),
    ]
}

fn op_sequence() -> impl Strategy<Value = Vec<RegistryOp>> {
    prop::collection::vec(registry_op(), 1..40)
}

// ============================================================================
// Driver
// ============================================================================

async fn apply_sequence(ops: Vec<RegistryOp>) -> Result<(), TestCaseError> {
    let connector = FakeConnector::new();
    let manager = registry_manager(connector.clone());
    let mut unreachable = Vec::new();
    let mut added = 0usize;

    for op in ops {
        let ids: Vec<_> = manager.registries().await.into_iter().map(|r| r.id).collect();
        match op {
            RegistryOp::Add { default, reachable } => {
                added += 1;
                let name = format!("reg{}", added);
                if !reachable {
                    connector.set_down(&registry_url(&name));
                    unreachable.push(registry_url(&name));
                }
                let config = if default {
                    terrareg(&name).as_default()
                } else {
                    terrareg(&name)
                };
                manager.add_registry(config).await.map_err(fail)?;
            }
            RegistryOp::SetDefault { index, default } if !ids.is_empty() => {
                let patch = RegistryPatch {
                    is_default: Some(default),
                    ..Default::default()
                };
                manager
                    .update_registry(&ids[index % ids.len()], patch)
                    .await
                    .map_err(fail)?;
            }
            RegistryOp::Delete { index } if !ids.is_empty() => {
                manager
                    .delete_registry(&ids[index % ids.len()])
                    .await
                    .map_err(fail)?;
            }
            RegistryOp::Activate { index } if !ids.is_empty() => {
                manager
                    .set_active(&ids[index % ids.len()])
                    .await
                    .map_err(fail)?;
            }
            _ => {}
        }

        let registries = manager.registries().await;
        let defaults = registries.iter().filter(|r| r.is_default).count();
        let active = manager.active_registry().await;

        if registries.is_empty() {
            prop_assert_eq!(defaults, 0);
            prop_assert!(active.is_none(), "Empty manager must have no active registry");
            prop_assert!(!manager.is_connected().await);
        } else {
            prop_assert_eq!(defaults, 1, "Exactly one default registry");
            let active = match active {
                Some(active) => active,
                None => return Err(TestCaseError::fail("Non-empty manager lost its active registry")),
            };
            prop_assert!(registries.iter().any(|r| r.id == active.id));
            prop_assert_eq!(
                manager.is_connected().await,
                !unreachable.contains(&active.url),
                "Connection flag must reflect the active registry"
            );
        }
    }
    Ok(())
}

fn fail(e: cim_terragrunt::TerragruntError) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: selection invariants survive every operation sequence
    #[test]
    fn prop_single_default_and_live_active(ops in op_sequence()) {
        tokio_test::block_on(apply_sequence(ops))?;
    }

    /// Property: adding registries never moves the active selection
    /// once one exists
    #[test]
    fn prop_add_keeps_active(defaults in prop::collection::vec(any::<bool>(), 1..10)) {
        tokio_test::block_on(async {
            let manager = registry_manager(FakeConnector::new());
            for (n, default) in defaults.iter().enumerate() {
                let config = terrareg(&format!("r{}", n));
                let config = if *default { config.as_default() } else { config };
                manager.add_registry(config).await.map_err(fail)?;

                let active = manager.active_registry().await.map(|r| r.id);
                prop_assert_eq!(active.as_ref().map(|id| id.as_str()), Some("r0"));
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
