// Copyright (c) 2025 - Cowboy AI, Inc.
//! Object layout of an environment bucket
//!
//! ```text
//! terragrunt/terragrunt.hcl                                        root
//! terragrunt/environments/{env}/terragrunt.hcl                     environment
//! terragrunt/environments/{env}/components/.gitkeep                placeholder
//! terragrunt/environments/{env}/components/{name}/terragrunt.hcl   component
//! terragrunt/environments/{env}/services/.gitkeep                  placeholder
//! terragrunt/environments/{env}/services/{name}/terragrunt.hcl     service
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level prefix of every generated object
pub const TERRAGRUNT_PREFIX: &str = "terragrunt";

/// File name of every artifact
pub const ARTIFACT_FILE: &str = "terragrunt.hcl";

/// Placeholder object establishing an otherwise empty directory
pub const PLACEHOLDER_FILE: &str = ".gitkeep";

/// Scope of one generated artifact, resolved to a deterministic object key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ArtifactPath {
    Root,
    Environment { environment: String },
    Component { environment: String, component: String },
    Service { environment: String, service: String },
}

impl ArtifactPath {
    pub fn environment(environment: impl Into<String>) -> Self {
        Self::Environment {
            environment: environment.into(),
        }
    }

    pub fn component(environment: impl Into<String>, component: impl Into<String>) -> Self {
        Self::Component {
            environment: environment.into(),
            component: component.into(),
        }
    }

    pub fn service(environment: impl Into<String>, service: impl Into<String>) -> Self {
        Self::Service {
            environment: environment.into(),
            service: service.into(),
        }
    }

    /// Directory of the artifact, relative to the bucket root
    pub fn directory(&self) -> String {
        match self {
            Self::Root => TERRAGRUNT_PREFIX.to_string(),
            Self::Environment { environment } => environment_prefix(environment),
            Self::Component {
                environment,
                component,
            } => format!("{}/components/{}", environment_prefix(environment), component),
            Self::Service {
                environment,
                service,
            } => format!("{}/services/{}", environment_prefix(environment), service),
        }
    }

    /// Object key of the artifact
    pub fn key(&self) -> String {
        format!("{}/{}", self.directory(), ARTIFACT_FILE)
    }

    /// Relative path from this artifact's directory to the root artifact
    pub fn root_include_path(&self) -> String {
        let depth = match self {
            Self::Root => 0,
            Self::Environment { .. } => 2,
            Self::Component { .. } | Self::Service { .. } => 4,
        };
        let mut path = "../".repeat(depth);
        path.push_str(ARTIFACT_FILE);
        path
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Prefix under which every object of an environment lives
pub fn environment_prefix(environment: &str) -> String {
    format!("{}/environments/{}", TERRAGRUNT_PREFIX, environment)
}

/// Placeholder keys written once when an environment is created
pub fn environment_placeholders(environment: &str) -> [String; 2] {
    let prefix = environment_prefix(environment);
    [
        format!("{}/components/{}", prefix, PLACEHOLDER_FILE),
        format!("{}/services/{}", prefix, PLACEHOLDER_FILE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ArtifactPath::Root, "terragrunt/terragrunt.hcl")]
    #[test_case(ArtifactPath::environment("dev"), "terragrunt/environments/dev/terragrunt.hcl")]
    #[test_case(
        ArtifactPath::component("dev", "vpc"),
        "terragrunt/environments/dev/components/vpc/terragrunt.hcl"
    )]
    #[test_case(
        ArtifactPath::service("dev", "api"),
        "terragrunt/environments/dev/services/api/terragrunt.hcl"
    )]
    fn test_artifact_keys(path: ArtifactPath, expected: &str) {
        assert_eq!(path.key(), expected);
    }

    #[test]
    fn test_root_include_resolves_from_each_depth() {
        assert_eq!(
            ArtifactPath::environment("dev").root_include_path(),
            "../../terragrunt.hcl"
        );
        assert_eq!(
            ArtifactPath::component("dev", "vpc").root_include_path(),
            "../../../../terragrunt.hcl"
        );
    }

    #[test]
    fn test_placeholders() {
        let [components, services] = environment_placeholders("dev");
        assert_eq!(components, "terragrunt/environments/dev/components/.gitkeep");
        assert_eq!(services, "terragrunt/environments/dev/services/.gitkeep");
    }
}
