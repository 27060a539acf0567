// Copyright (c) 2025 - Cowboy AI, Inc.
//! Change notifications published by the hierarchy store
//!
//! Consumers call [`HierarchyStore::subscribe`](super::HierarchyStore::subscribe)
//! and receive one event per applied mutation, in application order.

use serde::{Deserialize, Serialize};

use crate::domain::EntityKind;

/// Channel capacity; lagging receivers observe `RecvError::Lagged`
pub const EVENT_CHANNEL_CAPACITY: usize = 128;

/// One applied hierarchy mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum HierarchyEvent {
    Created { kind: EntityKind, id: String },
    Updated { kind: EntityKind, id: String },
    Deleted { kind: EntityKind, id: String },
}

impl HierarchyEvent {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Created { kind, .. } | Self::Updated { kind, .. } | Self::Deleted { kind, .. } => {
                *kind
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Created { id, .. } | Self::Updated { id, .. } | Self::Deleted { id, .. } => id,
        }
    }
}
