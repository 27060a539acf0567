// Copyright (c) 2025 - Cowboy AI, Inc.
//! Point-in-time view of every hierarchy collection
//!
//! [`Hierarchy`] is what the generator and the dependency resolver read.
//! Collections keep insertion order; lookups are linear scans.

use serde::{Deserialize, Serialize};

use super::{
    Account, AccountId, Component, ComponentId, Environment, EnvironmentId, Region, RegionId,
    Service, ServiceId,
};

/// Every entity of the hierarchy, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub accounts: Vec<Account>,
    pub regions: Vec<Region>,
    pub environments: Vec<Environment>,
    pub components: Vec<Component>,
    pub services: Vec<Service>,
}

impl Hierarchy {
    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| &a.id == id)
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| &r.id == id)
    }

    pub fn environment(&self, id: &EnvironmentId) -> Option<&Environment> {
        self.environments.iter().find(|e| &e.id == id)
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| &c.id == id)
    }

    pub fn service(&self, id: &ServiceId) -> Option<&Service> {
        self.services.iter().find(|s| &s.id == id)
    }

    pub fn regions_of<'a>(&'a self, account_id: &'a AccountId) -> impl Iterator<Item = &'a Region> {
        self.regions.iter().filter(move |r| &r.account_id == account_id)
    }

    pub fn environments_of<'a>(
        &'a self,
        region_id: &'a RegionId,
    ) -> impl Iterator<Item = &'a Environment> {
        self.environments.iter().filter(move |e| &e.region_id == region_id)
    }

    pub fn components_of<'a>(
        &'a self,
        environment_id: &'a EnvironmentId,
    ) -> impl Iterator<Item = &'a Component> {
        self.components
            .iter()
            .filter(move |c| &c.environment_id == environment_id)
    }

    pub fn services_of<'a>(
        &'a self,
        environment_id: &'a EnvironmentId,
    ) -> impl Iterator<Item = &'a Service> {
        self.services
            .iter()
            .filter(move |s| &s.environment_id == environment_id)
    }

    /// Total number of entities across all collections
    pub fn len(&self) -> usize {
        self.accounts.len()
            + self.regions.len()
            + self.environments.len()
            + self.components.len()
            + self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
