//! Control plane configuration
//!
//! Loaded from YAML and overridden from the command line. Every field has
//! a default matching a stock Mayastor installation.

use crate::domain::vocabulary::ControlPlaneVersion;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the control-plane query layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlPlaneConfig {
    /// Namespace Mayastor is installed in
    pub namespace: String,
    pub rest: RestConfig,
    pub plugin: PluginConfig,
    pub grpc: GrpcConfig,
    /// Components probed, in order, to detect the deployed generation
    pub components: Vec<ComponentCandidate>,
    /// Label (`key` or `key=value`) marking nodes that run the data plane
    pub storage_node_label: String,
    /// Label (`key` or `key=value`) marking Kubernetes control nodes
    pub control_node_label: String,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            namespace: "mayastor".to_string(),
            rest: RestConfig::default(),
            plugin: PluginConfig::default(),
            grpc: GrpcConfig::default(),
            components: vec![
                ComponentCandidate::new("core-agent", ControlPlaneVersion::Rest),
                ComponentCandidate::new("moac", ControlPlaneVersion::Crd),
            ],
            storage_node_label: "openebs.io/engine=mayastor".to_string(),
            control_node_label: "node-role.kubernetes.io/master".to_string(),
        }
    }
}

impl ControlPlaneConfig {
    /// Load a configuration file, missing fields take their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: Self = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(Error::Configuration("namespace must not be empty".into()));
        }
        if self.components.is_empty() {
            return Err(Error::Configuration(
                "at least one control plane component must be listed".into(),
            ));
        }
        if self.rest.port == 0 || self.grpc.port == 0 {
            return Err(Error::Configuration("ports must be non-zero".into()));
        }
        if self.rest.client == RestClientKind::Plugin && self.plugin.binary.is_empty() {
            return Err(Error::Configuration("plugin binary must be set".into()));
        }
        Ok(())
    }
}

/// A named Deployment/StatefulSet whose presence identifies a generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentCandidate {
    pub name: String,
    pub version: ControlPlaneVersion,
}

impl ComponentCandidate {
    pub fn new(name: impl Into<String>, version: ControlPlaneVersion) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

// =============================================================================
// REST / Plugin
// =============================================================================

/// Which client talks to the REST control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestClientKind {
    /// Direct HTTP requests against the OpenAPI endpoints
    OpenApi,
    /// The kubectl-mayastor plugin
    Plugin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RestConfig {
    pub client: RestClientKind,
    pub scheme: String,
    /// Port the REST service is exposed on, on every node
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            client: RestClientKind::OpenApi,
            scheme: "http".to_string(),
            port: 30011,
            request_timeout_secs: 30,
        }
    }
}

impl RestConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL of the REST service on one node
    pub fn endpoint(&self, address: &str) -> String {
        format!("{}://{}:{}", self.scheme, address, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginConfig {
    /// Plugin executable, resolved through PATH when not absolute
    pub binary: String,
    /// Arguments placed before the generated ones
    pub base_args: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            binary: "kubectl-mayastor".to_string(),
            base_args: Vec::new(),
        }
    }
}

// =============================================================================
// gRPC
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrpcConfig {
    /// Port of the storage node gRPC service
    pub port: u16,
    /// Per-call deadline
    pub deadline_secs: u64,
    pub retry: RetryConfig,
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            port: 10124,
            deadline_secs: 5,
            retry: RetryConfig::default(),
        }
    }
}

impl GrpcConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

/// Backoff applied to pool listing when a storage node misses its deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub initial_interval_secs: u64,
    pub multiplier: f64,
    pub max_interval_secs: u64,
    /// Total time budget, zero disables retrying
    pub max_elapsed_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_secs: 5,
            multiplier: 2.0,
            max_interval_secs: 240,
            max_elapsed_secs: 555,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ControlPlaneConfig::default();
        assert_eq!(config.namespace, "mayastor");
        assert_eq!(config.rest.port, 30011);
        assert_eq!(config.grpc.port, 10124);
        assert_eq!(config.grpc.deadline(), Duration::from_secs(5));
        assert_eq!(config.components[0].name, "core-agent");
        assert_eq!(config.rest.endpoint("10.0.0.1"), "http://10.0.0.1:30011");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "namespace: openebs\nrest:\n  client: plugin\n  port: 30012\nplugin:\n  binary: /usr/local/bin/kubectl-mayastor\n"
        )
        .unwrap();

        let config = ControlPlaneConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.namespace, "openebs");
        assert_eq!(config.rest.client, RestClientKind::Plugin);
        assert_eq!(config.rest.port, 30012);
        assert_eq!(config.rest.scheme, "http");
        assert_eq!(config.grpc.port, 10124);
        assert_eq!(config.components.len(), 2);
    }

    #[test]
    fn test_validation() {
        let mut config = ControlPlaneConfig::default();
        config.components.clear();
        assert_matches!(config.validate(), Err(Error::Configuration(_)));

        let mut config = ControlPlaneConfig::default();
        config.namespace.clear();
        assert_matches!(config.validate(), Err(Error::Configuration(_)));
    }
}
