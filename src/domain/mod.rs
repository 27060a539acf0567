// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Organization Domain Models
//!
//! Entities of the hierarchy rendered into Terragrunt configuration:
//!
//! ```text
//! Account ─┬─ Region ─┬─ Environment ─┬─ Component
//!          │          │               └─ Service ──depends on──▶ Component
//! ```
//!
//! # Entities
//!
//! - [`Account`] - root of the hierarchy, carries the cloud [`Provider`]
//! - [`Region`] - provider region inside an account
//! - [`Environment`] - deployment stage, owns an object store bucket
//! - [`Component`] - module instance inside an environment
//! - [`Service`] - module instance depending on components of its environment
//!
//! # Invariants
//!
//! The rules in [`invariants`] are pure functions over a [`Hierarchy`] view
//! and are checked before every mutation.

pub mod catalog;
pub mod ids;
pub mod invariants;
pub mod organization;
pub mod provider;
pub mod workload;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use catalog::Hierarchy;
pub use ids::{AccountId, ComponentId, EnvironmentId, RegionId, RegistryId, ServiceId};
pub use organization::{
    Account, AccountDraft, AccountPatch, Environment, EnvironmentDraft, EnvironmentPatch, Region,
    RegionDraft, RegionPatch,
};
pub use provider::Provider;
pub use workload::{
    Component, ComponentDraft, ComponentPatch, Inputs, Service, ServiceDraft, ServicePatch,
};

/// Kind of hierarchy entity, used in errors and change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    Region,
    Environment,
    Component,
    Service,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Region => "region",
            Self::Environment => "environment",
            Self::Component => "component",
            Self::Service => "service",
        }
    }

    /// Document store collection holding this kind
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Account => "accounts",
            Self::Region => "regions",
            Self::Environment => "environments",
            Self::Component => "components",
            Self::Service => "services",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
