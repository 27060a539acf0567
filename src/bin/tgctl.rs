// Copyright (c) 2025 - Cowboy AI, Inc.
//! Terragrunt hierarchy operator tool
//!
//! Loads the persisted hierarchy and registries and runs one action:
//!
//! ```bash
//! # Print entity counts and registry status (default)
//! tgctl summary
//!
//! # Rewrite every artifact of every environment
//! tgctl regenerate
//!
//! # Print the dependency graph of one environment as JSON
//! tgctl graph <environment-id>
//! ```
//!
//! Configuration comes from `TG_*` environment variables, see
//! `cim_terragrunt::config`.

use anyhow::{bail, Context, Result};
use cim_terragrunt::{
    domain::EnvironmentId,
    persistence::{FileSystemObjectStore, JsonFileDocumentStore},
    registry::HttpRegistryConnector,
    AppConfig, HierarchyStore, PersistenceGateway, RegistryManager, TerragruntService,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Terragrunt hierarchy operator tool
#[derive(Debug, Parser)]
#[command(name = "tgctl")]
#[command(about = "Inspect the cloud hierarchy and regenerate its Terragrunt artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Commands {
    /// Print entity counts and registry status
    Summary,
    /// Rewrite every artifact of every environment
    Regenerate,
    /// Print the dependency graph of an environment as JSON
    Graph { environment_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let command = Cli::parse().command.unwrap_or(Commands::Summary);

    // Load configuration
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded:");
    info!("  - Data directory: {}", config.data_dir.display());
    info!("  - Object store root: {}", config.object_store_root.display());

    let documents = Arc::new(JsonFileDocumentStore::new(&config.data_dir));
    let objects = Arc::new(FileSystemObjectStore::new(&config.object_store_root));

    let gateway = PersistenceGateway::new(objects);
    gateway
        .wait_ready(config.store_init_timeout())
        .await
        .context("Object store did not become ready")?;

    let hierarchy = Arc::new(
        HierarchyStore::load(documents.clone())
            .await
            .context("Failed to load hierarchy")?,
    );
    let service = TerragruntService::new(hierarchy.clone(), gateway)
        .with_fallback_region(config.object_store_region.clone());

    match command {
        Commands::Summary => {
            let registries = RegistryManager::load(
                documents,
                Arc::new(HttpRegistryConnector::new(config.registry_http())),
            )
            .await
            .context("Failed to load registries")?;

            let snapshot = hierarchy.snapshot().await;
            info!("Accounts:     {}", snapshot.accounts.len());
            info!("Regions:      {}", snapshot.regions.len());
            info!("Environments: {}", snapshot.environments.len());
            info!("Components:   {}", snapshot.components.len());
            info!("Services:     {}", snapshot.services.len());

            match registries.active_registry().await {
                Some(active) => info!(
                    "Active registry: {} ({}, connected: {})",
                    active.name,
                    active.registry_type,
                    registries.is_connected().await
                ),
                None => info!("No registry configured"),
            }
        }
        Commands::Regenerate => {
            let mut failed = 0;
            for environment in hierarchy.environments().await {
                let report = service
                    .save_all(&environment.id)
                    .await
                    .with_context(|| format!("Failed to regenerate {}", environment.name))?;
                for warning in &report.warnings {
                    warn!("{}", warning);
                }
                for failure in &report.failures {
                    error!("{}: {}", failure.path, failure.error);
                }
                failed += report.failures.len();
                info!(
                    "Environment {}: {} artifact(s) written",
                    environment.name,
                    report.receipts.len()
                );
            }
            if failed > 0 {
                bail!("{} artifact(s) could not be written", failed);
            }
        }
        Commands::Graph { environment_id } => {
            let graph = service
                .dependency_graph(&EnvironmentId::new(environment_id))
                .await?;
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Commands, clap::Error> {
        let cli = Cli::try_parse_from(std::iter::once("tgctl").chain(args.iter().copied()))?;
        Ok(cli.command.unwrap_or(Commands::Summary))
    }

    #[test]
    fn test_default_command_is_summary() {
        assert_eq!(parse(&[]).unwrap(), Commands::Summary);
        assert_eq!(parse(&["summary"]).unwrap(), Commands::Summary);
    }

    #[test]
    fn test_graph_requires_id() {
        assert!(parse(&["graph"]).is_err());
        assert_eq!(
            parse(&["graph", "e1"]).unwrap(),
            Commands::Graph {
                environment_id: "e1".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse(&["deploy"]).is_err());
    }
}
