// Copyright (c) 2025 - Cowboy AI, Inc.
//! Config Generator
//!
//! Renders one `terragrunt.hcl` artifact per hierarchy scope. Every function
//! here is pure: it reads entity state and returns text, and never touches
//! the object store.
//!
//! # Scope order
//!
//! ```text
//! root ──▶ environment ──▶ component* ──▶ service*
//!  │            │               │              │
//!  │            └── include ────┴──── include ─┘
//!  └── remote state backend + global inputs
//! ```
//!
//! Artifacts include the root by relative path. Component and service inputs
//! are rendered with sorted keys so identical state always yields
//! byte-identical text.

pub mod hcl;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dependency::{self, DependencyWarning, UnresolvedReason};
use crate::domain::invariants::{require_account, require_environment, require_region};
use crate::domain::{Account, Component, Environment, EnvironmentId, Hierarchy, Region, Service};
use crate::errors::{TerragruntError, TerragruntResult};
use crate::layout::ArtifactPath;

use hcl::{quote, render_inputs};

/// Generated text for one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: ArtifactPath,
    pub content: String,
    /// Dependencies skipped while rendering a service
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DependencyWarning>,
}

impl Artifact {
    fn new(path: ArtifactPath, content: String) -> Self {
        Self {
            path,
            content,
            warnings: Vec::new(),
        }
    }
}

/// Environment together with the region and account it resolves to
#[derive(Debug, Clone, Copy)]
pub struct RootContext<'a> {
    pub environment: &'a Environment,
    pub region: &'a Region,
    pub account: &'a Account,
}

impl<'a> RootContext<'a> {
    /// Resolve the parents of an environment
    ///
    /// The provider is read from the account, so artifacts always carry the
    /// account's current provider.
    pub fn resolve(hierarchy: &'a Hierarchy, environment_id: &EnvironmentId) -> TerragruntResult<Self> {
        let environment = require_environment(hierarchy, environment_id)?;
        let region = require_region(hierarchy, &environment.region_id)?;
        let account = require_account(hierarchy, &region.account_id)?;
        Ok(Self {
            environment,
            region,
            account,
        })
    }

    fn global_inputs(&self) -> String {
        format!(
            "inputs = {{\n  aws_region  = {}\n  aws_account = {}\n  environment = {}\n  provider    = {}\n}}\n",
            quote(&self.region.code),
            quote(self.account.id.as_str()),
            quote(&self.environment.name),
            quote(self.account.provider.as_str()),
        )
    }
}

/// Root artifact: remote state backend and global inputs
pub fn generate_root(ctx: &RootContext<'_>) -> Artifact {
    let content = format!(
        r#"# Root terragrunt.hcl file
# This file defines global configuration for all modules

remote_state {{
  backend = "s3"
  config = {{
    bucket         = {bucket}
    key            = "${{path_relative_to_include()}}/terraform.tfstate"
    region         = {region}
    encrypt        = true
    dynamodb_table = "terraform-locks"
  }}
}}

# Global variables that will be available to all modules
{inputs}"#,
        bucket = quote(&ctx.environment.bucket_name),
        region = quote(&ctx.region.code),
        inputs = ctx.global_inputs(),
    );
    Artifact::new(ArtifactPath::Root, content)
}

/// Environment artifact: includes the root and repeats the global inputs
pub fn generate_environment(ctx: &RootContext<'_>) -> Artifact {
    let path = ArtifactPath::environment(ctx.environment.name.as_str());
    let content = format!(
        "# Environment-specific terragrunt.hcl file for {name}\n\
         # This file defines configuration specific to this environment\n\
         \n\
         {include}\n\
         # Environment-specific variables\n\
         {inputs}",
        name = ctx.environment.name,
        include = include_root(&path),
        inputs = ctx.global_inputs(),
    );
    Artifact::new(path, content)
}

/// Component artifact: pinned module source and sorted inputs
pub fn generate_component(environment: &Environment, component: &Component) -> Artifact {
    let path = ArtifactPath::component(environment.name.as_str(), component.name.as_str());
    let content = format!(
        "# Terragrunt configuration for {name}\n{include}\n{terraform}\ninputs = {inputs}\n",
        name = component.name,
        include = include_root(&path),
        terraform = terraform_source(&component.pinned_source()),
        inputs = render_inputs(&component.inputs),
    );
    debug!("Generated {}", path);
    Artifact::new(path, content)
}

/// Service artifact: like a component, plus one dependency block per
/// resolved component
///
/// Ids that no longer resolve are skipped and reported in
/// [`Artifact::warnings`]. A dependency on a component of another
/// environment is a referential error.
pub fn generate_service(
    environment: &Environment,
    service: &Service,
    components: &[Component],
) -> TerragruntResult<Artifact> {
    let resolved = dependency::resolve(components, std::slice::from_ref(service));
    if let Some(foreign) = resolved
        .warnings
        .iter()
        .find(|w| w.reason == UnresolvedReason::OtherEnvironment)
    {
        return Err(TerragruntError::referential(
            format!("component of environment {}", service.environment_id),
            foreign.component_id.as_str(),
        ));
    }

    let blocks: Vec<String> = resolved
        .edges
        .iter()
        .filter_map(|edge| components.iter().find(|c| c.id == edge.component_id))
        .map(|component| {
            format!(
                "dependency {} {{\n  config_path = {}\n}}\n",
                quote(&component.name),
                quote(&format!("../components/{}", component.name)),
            )
        })
        .collect();

    let path = ArtifactPath::service(environment.name.as_str(), service.name.as_str());
    let mut content = format!(
        "# Terragrunt configuration for {name}\n{include}\n{terraform}\n",
        name = service.name,
        include = include_root(&path),
        terraform = terraform_source(&service.pinned_source()),
    );
    if !blocks.is_empty() {
        content.push_str(&blocks.join("\n"));
        content.push('\n');
    }
    content.push_str("inputs = ");
    content.push_str(&render_inputs(&service.inputs));
    content.push('\n');

    debug!(
        "Generated {} with {} dependency block(s)",
        path,
        blocks.len()
    );
    Ok(Artifact {
        path,
        content,
        warnings: resolved.warnings,
    })
}

fn include_root(path: &ArtifactPath) -> String {
    format!(
        "include \"root\" {{\n  path = {}\n}}\n",
        quote(&path.root_include_path())
    )
}

fn terraform_source(pinned: &str) -> String {
    format!("terraform {{\n  source = {}\n}}\n", quote(pinned))
}
