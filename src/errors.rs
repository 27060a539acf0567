// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for hierarchy, registry and artifact operations
//!
//! Validation failures (`Referential`, `DependencyExists`, `NotFound`) are
//! raised before any mutation is applied. `Persistence` is raised after the
//! in-memory mutation already succeeded and is recoverable by saving again.

use thiserror::Error;

/// Errors that can occur while managing the hierarchy and its artifacts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerragruntError {
    /// A referenced parent entity does not exist
    #[error("Referential error: {kind} {id} does not exist")]
    Referential { kind: String, id: String },

    /// Delete blocked by entities that still reference the target
    #[error("Cannot delete: {count} {dependent_kind}(s) still reference it")]
    DependencyExists { count: usize, dependent_kind: String },

    /// Unknown id on update, delete or selection
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Registry query attempted without a connected active registry
    #[error("No active registry or not connected")]
    NotConnected,

    /// Object store or document store I/O failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Malformed entity or request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Registry answered with an error or an undecodable body
    #[error("Registry error: {0}")]
    Registry(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl TerragruntError {
    /// Shorthand for a missing parent reference
    pub fn referential(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Referential {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Shorthand for an unknown id
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Whether the error leaves the in-memory state mutated
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Result type for hierarchy and artifact operations
pub type TerragruntResult<T> = Result<T, TerragruntError>;

impl From<serde_json::Error> for TerragruntError {
    fn from(err: serde_json::Error) -> Self {
        TerragruntError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for TerragruntError {
    fn from(err: std::io::Error) -> Self {
        TerragruntError::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_exists_display() {
        let err = TerragruntError::DependencyExists {
            count: 2,
            dependent_kind: "region".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot delete: 2 region(s) still reference it");
    }

    #[test]
    fn test_only_persistence_is_recoverable() {
        assert!(TerragruntError::Persistence("boom".into()).is_recoverable());
        assert!(!TerragruntError::not_found("account", "a1").is_recoverable());
        assert!(!TerragruntError::NotConnected.is_recoverable());
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let converted: TerragruntError = err.into();
        assert!(matches!(converted, TerragruntError::Serialization(_)));
    }
}
