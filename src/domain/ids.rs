// Copyright (c) 2025 - Cowboy AI, Inc.
//! Opaque entity identifiers
//!
//! Each entity kind gets its own newtype so a `RegionId` can never be passed
//! where an `AccountId` is expected. Generated ids are UUID v7 strings, which
//! keeps them unique and time-ordered; ids supplied by callers are taken as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh time-ordered identifier
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of an [`Account`](super::Account)
    AccountId
);
entity_id!(
    /// Identifier of a [`Region`](super::Region)
    RegionId
);
entity_id!(
    /// Identifier of an [`Environment`](super::Environment)
    EnvironmentId
);
entity_id!(
    /// Identifier of a [`Component`](super::Component)
    ComponentId
);
entity_id!(
    /// Identifier of a [`Service`](super::Service)
    ServiceId
);
entity_id!(
    /// Identifier of a [`RegistryConfig`](crate::registry::RegistryConfig)
    RegistryId
);
