// Copyright (c) 2025 - Cowboy AI, Inc.
//! Organization entities: Account → Region → Environment
//!
//! Each entity comes with a draft (creation input, id optional) and a patch
//! (partial update, every field optional). Foreign keys are validated by the
//! [`HierarchyStore`](crate::hierarchy::HierarchyStore), not here.

use serde::{Deserialize, Serialize};

use super::{AccountId, EnvironmentId, Provider, RegionId};

/// Root of the hierarchy: one cloud account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Creation input for an [`Account`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDraft {
    pub id: Option<AccountId>,
    pub name: String,
    pub provider: Provider,
    pub description: Option<String>,
}

/// Partial update for an [`Account`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub provider: Option<Provider>,
    pub description: Option<String>,
}

impl AccountDraft {
    pub fn new(name: impl Into<String>, provider: Provider) -> Self {
        Self {
            name: name.into(),
            provider,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<AccountId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub(crate) fn build(self, id: AccountId) -> Account {
        Account {
            id,
            name: self.name,
            provider: self.provider,
            description: self.description,
        }
    }
}

impl Account {
    pub(crate) fn apply(&mut self, patch: AccountPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(provider) = patch.provider {
            self.provider = provider;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
    }
}

/// A cloud region inside an account
///
/// `provider` is a denormalized copy of the owning account's provider. The
/// store re-derives it whenever `account_id` changes and propagates account
/// provider changes to every region of that account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    /// Provider region code, e.g. `us-east-1`
    pub code: String,
    pub account_id: AccountId,
    pub provider: Provider,
}

/// Creation input for a [`Region`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionDraft {
    pub id: Option<RegionId>,
    pub name: String,
    pub code: String,
    pub account_id: AccountId,
}

/// Partial update for a [`Region`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub account_id: Option<AccountId>,
}

impl RegionDraft {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        account_id: impl Into<AccountId>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            code: code.into(),
            account_id: account_id.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<RegionId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub(crate) fn build(self, id: RegionId, provider: Provider) -> Region {
        Region {
            id,
            name: self.name,
            code: self.code,
            account_id: self.account_id,
            provider,
        }
    }
}

impl Region {
    /// Apply name/code changes; account moves are handled by the store
    pub(crate) fn apply(&mut self, patch: &RegionPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(code) = &patch.code {
            self.code = code.clone();
        }
    }
}

/// A deployment environment inside a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: EnvironmentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub region_id: RegionId,
    /// Object store bucket holding every generated artifact of this environment
    pub bucket_name: String,
}

/// Creation input for an [`Environment`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentDraft {
    pub id: Option<EnvironmentId>,
    pub name: String,
    pub description: Option<String>,
    pub region_id: RegionId,
    pub bucket_name: String,
}

/// Partial update for an [`Environment`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub region_id: Option<RegionId>,
    pub bucket_name: Option<String>,
}

impl EnvironmentDraft {
    pub fn new(
        name: impl Into<String>,
        region_id: impl Into<RegionId>,
        bucket_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region_id: region_id.into(),
            bucket_name: bucket_name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<EnvironmentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub(crate) fn build(self, id: EnvironmentId) -> Environment {
        Environment {
            id,
            name: self.name,
            description: self.description,
            region_id: self.region_id,
            bucket_name: self.bucket_name,
        }
    }
}

impl Environment {
    pub(crate) fn apply(&mut self, patch: EnvironmentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(region_id) = patch.region_id {
            self.region_id = region_id;
        }
        if let Some(bucket_name) = patch.bucket_name {
            self.bucket_name = bucket_name;
        }
    }
}
