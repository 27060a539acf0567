// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud organization hierarchy and Terragrunt configuration generation
//!
//! Models accounts, regions, environments, components and services, renders
//! them into a layered `terragrunt.hcl` tree and writes that tree into an
//! object store bucket per environment. Module registries supply the
//! modules components are instantiated from.
//!
//! ```text
//! ObjectStore, Module Registry            (external)
//!     ↓
//! PersistenceGateway, RegistryManager
//!     ↓
//! Dependency Resolver
//!     ↓
//! HierarchyStore
//!     ↓
//! Config Generator ──▶ TerragruntService
//! ```

pub mod config;
pub mod dependency;
pub mod domain;
pub mod errors;
pub mod generator;
pub mod hierarchy;
pub mod layout;
pub mod persistence;
pub mod registry;
pub mod service;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{TerragruntError, TerragruntResult};
pub use hierarchy::{HierarchyEvent, HierarchyStore};
pub use persistence::{DocumentStore, ObjectStore, PersistenceGateway};
pub use registry::{RegistryConfig, RegistryManager, RegistryType};
pub use service::{Outcome, TerragruntService};
