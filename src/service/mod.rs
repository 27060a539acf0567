// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer
//!
//! The application service callers are handed: it owns the hierarchy store
//! and the persistence gateway and drives the generator between them.
//!
//! # Architecture
//!
//! ```text
//! Caller
//!     ↓
//! TerragruntService (this module)
//!     ↓
//! HierarchyStore ──validate, write-through──▶ DocumentStore
//!     ↓
//! Config Generator (pure)
//!     ↓
//! PersistenceGateway ──upload──▶ ObjectStore
//! ```
//!
//! Accounts and regions have no artifacts of their own and are managed
//! directly through [`TerragruntService::hierarchy`].
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_terragrunt::service::TerragruntService;
//!
//! let service = TerragruntService::new(hierarchy, gateway);
//! let outcome = service.create_component(draft).await?;
//! if !outcome.is_saved() {
//!     service.save_component(&outcome.entity.id).await?;
//! }
//! ```

pub mod import;
pub mod terragrunt;

pub use import::component_from_module;
pub use terragrunt::{Outcome, SaveFailure, SaveReport, TerragruntService, DEFAULT_BUCKET_REGION};
