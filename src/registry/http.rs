// Copyright (c) 2025 - Cowboy AI, Inc.
//! HTTP access to module registries
//!
//! Wraps a `reqwest` client bound to one registry base URL. When the
//! registry carries an API key every request sends
//! `Authorization: Bearer {key}`.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Module, RegistryConfig};
use crate::errors::{TerragruntError, TerragruntResult};

/// HTTP client options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Client for one registry base URL
#[derive(Debug, Clone)]
pub struct RegistryHttpClient {
    base_url: String,
    client: Client,
}

impl RegistryHttpClient {
    pub fn new(config: &RegistryConfig, options: &HttpOptions) -> TerragruntResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| TerragruntError::Configuration(format!("Invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                TerragruntError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: config.base_url().to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Whether `GET {base}{path}` answers with a success status
    pub async fn probe(&self, path: &str) -> bool {
        let url = self.url(path);
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Registry probe {} succeeded", url);
                true
            }
            Ok(response) => {
                warn!("Registry probe {} returned {}", url, response.status());
                false
            }
            Err(e) => {
                warn!("Registry probe {} failed: {}", url, e);
                false
            }
        }
    }

    /// `GET {base}{path}` decoded as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> TerragruntResult<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TerragruntError::Registry(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TerragruntError::Registry(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TerragruntError::Registry(format!("Invalid response from {}: {}", url, e)))
    }
}

/// `GET /v1/namespaces`
#[derive(Debug, Default, Deserialize)]
pub struct NamespacesResponse {
    #[serde(default)]
    pub namespaces: Vec<String>,
}

/// `GET /v1/modules/{namespace}` and `GET /v1/modules/search`
#[derive(Debug, Default, Deserialize)]
pub struct ModulesResponse {
    #[serde(default)]
    pub modules: Vec<WireModule>,
}

/// `GET /v1/modules/{namespace}/{name}/{provider}/versions`
#[derive(Debug, Default, Deserialize)]
pub struct VersionsResponse {
    #[serde(default)]
    pub versions: Vec<String>,
}

/// Module as returned by the registry; most fields are optional
#[derive(Debug, Default, Deserialize)]
pub struct WireModule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub inputs: Option<serde_json::Value>,
    #[serde(default)]
    pub outputs: Option<serde_json::Value>,
}

impl WireModule {
    /// Normalize into a [`Module`]; `namespace` is used when the body omits it
    pub fn into_module(self, namespace: Option<&str>) -> Module {
        let namespace = self
            .namespace
            .or_else(|| namespace.map(str::to_string))
            .unwrap_or_default();
        Module {
            id: Module::module_id(&namespace, &self.name, &self.provider),
            name: self.name,
            namespace,
            provider: self.provider,
            version: self
                .version
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "latest".to_string()),
            description: self.description.unwrap_or_default(),
            source: self.source.unwrap_or_default(),
            inputs: self.inputs,
            outputs: self.outputs,
            versions: self.versions,
            registry_id: None,
        }
    }
}
