// Copyright (c) 2025 - Cowboy AI, Inc.
//! Hierarchy Store
//!
//! Authoritative collection of Accounts, Regions, Environments, Components
//! and Services. Every mutation follows the same sequence:
//!
//! ```text
//! validate (pure, domain::invariants) → apply in memory → notify → write-through
//! ```
//!
//! Validation failures leave the store untouched. Once validation passes the
//! mutation stands: a failed write-through is returned in
//! [`Committed::persisted`] alongside the stored entity, and
//! [`HierarchyStore::flush`] retries it.

pub mod events;
pub mod store;

pub use events::{HierarchyEvent, EVENT_CHANNEL_CAPACITY};
pub use store::{Committed, HierarchyStore};
