// Copyright (c) 2025 - Cowboy AI, Inc.
//! One backend per registry type
//!
//! Only [`Terrareg`] answers module queries. The other types probe their
//! endpoint for connection tests and list nothing, so callers must handle
//! empty results.

use async_trait::async_trait;
use tracing::{debug, info};

use super::http::{ModulesResponse, NamespacesResponse, RegistryHttpClient, VersionsResponse};
use super::{Module, RegistryType};
use crate::errors::TerragruntResult;

/// Capabilities of a registry
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    fn registry_type(&self) -> RegistryType;

    /// Whether the registry is reachable
    async fn test_connection(&self) -> bool;

    async fn list_namespaces(&self) -> TerragruntResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn list_modules(&self, _namespace: &str) -> TerragruntResult<Vec<Module>> {
        Ok(Vec::new())
    }

    async fn search_modules(&self, _query: &str) -> TerragruntResult<Vec<Module>> {
        Ok(Vec::new())
    }

    /// Published versions, newest first
    async fn module_versions(
        &self,
        _namespace: &str,
        _name: &str,
        _provider: &str,
    ) -> TerragruntResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Terrareg-compatible registry
#[derive(Debug, Clone)]
pub struct Terrareg {
    client: RegistryHttpClient,
}

impl Terrareg {
    pub fn new(client: RegistryHttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RegistryBackend for Terrareg {
    fn registry_type(&self) -> RegistryType {
        RegistryType::Terrareg
    }

    async fn test_connection(&self) -> bool {
        self.client.probe("/v1/modules").await
    }

    async fn list_namespaces(&self) -> TerragruntResult<Vec<String>> {
        let response: NamespacesResponse = self.client.get_json("/v1/namespaces").await?;
        debug!("{} namespace(s) at {}", response.namespaces.len(), self.client.base_url());
        Ok(response.namespaces)
    }

    async fn list_modules(&self, namespace: &str) -> TerragruntResult<Vec<Module>> {
        let path = format!("/v1/modules/{}", urlencoding::encode(namespace));
        let response: ModulesResponse = self.client.get_json(&path).await?;
        info!("Listed {} module(s) in namespace {}", response.modules.len(), namespace);
        Ok(response
            .modules
            .into_iter()
            .map(|m| m.into_module(Some(namespace)))
            .collect())
    }

    async fn search_modules(&self, query: &str) -> TerragruntResult<Vec<Module>> {
        let path = format!("/v1/modules/search?q={}", urlencoding::encode(query));
        let response: ModulesResponse = self.client.get_json(&path).await?;
        info!("Search {:?} matched {} module(s)", query, response.modules.len());
        Ok(response
            .modules
            .into_iter()
            .map(|m| m.into_module(None))
            .collect())
    }

    async fn module_versions(
        &self,
        namespace: &str,
        name: &str,
        provider: &str,
    ) -> TerragruntResult<Vec<String>> {
        let path = format!(
            "/v1/modules/{}/{}/{}/versions",
            urlencoding::encode(namespace),
            urlencoding::encode(name),
            urlencoding::encode(provider)
        );
        let response: VersionsResponse = self.client.get_json(&path).await?;
        Ok(response.versions)
    }
}

/// Public Terraform registry protocol; listing is not implemented
#[derive(Debug, Clone)]
pub struct TerraformRegistry {
    client: RegistryHttpClient,
}

impl TerraformRegistry {
    pub fn new(client: RegistryHttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RegistryBackend for TerraformRegistry {
    fn registry_type(&self) -> RegistryType {
        RegistryType::TerraformRegistry
    }

    async fn test_connection(&self) -> bool {
        self.client.probe("/v1/modules").await
    }
}

// Registry types whose connection test only checks the base URL
macro_rules! base_url_backend {
    ($(#[$meta:meta])* $name:ident, $registry_type:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            client: RegistryHttpClient,
        }

        impl $name {
            pub fn new(client: RegistryHttpClient) -> Self {
                Self { client }
            }
        }

        #[async_trait]
        impl RegistryBackend for $name {
            fn registry_type(&self) -> RegistryType {
                $registry_type
            }

            async fn test_connection(&self) -> bool {
                self.client.probe("").await
            }
        }
    };
}

base_url_backend!(
    /// GitLab module registry
    GitLab,
    RegistryType::Gitlab
);
base_url_backend!(
    /// GitHub-hosted modules
    GitHub,
    RegistryType::Github
);
base_url_backend!(
    /// Any other HTTP registry
    Custom,
    RegistryType::Custom
);
