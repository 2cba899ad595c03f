//! kubectl-mayastor Plugin Adapter
//!
//! Drives the REST control plane through the kubectl plugin, pointed at one
//! node at a time with `-r http://<node>:<port>`. The plugin reports
//! failures only as text, so absence and timeouts are recognised by
//! matching its output. That matching breaks silently if the plugin changes
//! its wording; it is confined to this adapter.
//!
//! The plugin does not show replica URIs, those come from the REST API.

use crate::controlplane::backends::rest::RestControlPlane;
use crate::controlplane::backends::wire::{resolve_volume, WireList, WireNode, WirePool, WireVolume};
use crate::controlplane::config::{PluginConfig, RestConfig};
use crate::controlplane::failover;
use crate::domain::model::{Node, Pool, Volume};
use crate::domain::ports::{
    ControlPlaneBackend, NodeAddressProvider, NodeDirectory, PoolDirectory, VolumeDirectory,
};
use crate::domain::vocabulary::ControlPlaneVersion;
use crate::error::{Error, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

/// Present in the plugin output whenever the REST call behind it failed
const ERROR_MARKER: &str = "Error error";

// =============================================================================
// Output Classification
// =============================================================================

struct OutputPatterns {
    rest_error_kind: Regex,
    timeout: Regex,
}

impl OutputPatterns {
    fn new() -> Result<Self> {
        Ok(Self {
            rest_error_kind: Regex::new(r"Error error in response.*RestJsonError.*kind:\s*(\w+)")?,
            timeout: Regex::new(r"(Request Timeout)|(request timed out)")?,
        })
    }

    fn is_not_found(&self, output: &str) -> bool {
        self.rest_error_kind
            .captures(output)
            .and_then(|c| c.get(1))
            .map(|kind| kind.as_str() == "NotFound")
            .unwrap_or(false)
    }

    fn is_timeout(&self, output: &str) -> bool {
        self.timeout.is_match(output)
    }
}

/// What a plugin invocation is about, for error reporting
struct Target<'a> {
    kind: &'a str,
    name: &'a str,
}

// =============================================================================
// Plugin Adapter
// =============================================================================

/// Adapter for the REST control plane through the kubectl plugin
pub struct PluginControlPlane {
    plugin: PluginConfig,
    rest: RestConfig,
    replicas: RestControlPlane,
    nodes: Arc<dyn NodeAddressProvider>,
    patterns: OutputPatterns,
}

impl PluginControlPlane {
    /// Create a new plugin adapter
    pub fn new(
        plugin: PluginConfig,
        rest: RestConfig,
        nodes: Arc<dyn NodeAddressProvider>,
    ) -> Result<Self> {
        let replicas = RestControlPlane::new(rest.clone(), nodes.clone())?;
        Ok(Self {
            plugin,
            rest,
            replicas,
            nodes,
            patterns: OutputPatterns::new()?,
        })
    }

    /// Run the plugin against one node, returning its stdout
    async fn run(&self, address: String, args: &[&str], target: &Target<'_>) -> Result<Vec<u8>> {
        let endpoint = self.rest.endpoint(&address);
        let mut command = Command::new(&self.plugin.binary);
        command
            .args(&self.plugin.base_args)
            .arg("-r")
            .arg(&endpoint)
            .args(args)
            .kill_on_drop(true);

        let rendered = format!("{} -r {} {}", self.plugin.binary, endpoint, args.join(" "));
        debug!(command = %rendered, "running plugin");

        let output = command.output().await?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() || text.contains(ERROR_MARKER) {
            return Err(self.classify(rendered, endpoint, text, target));
        }
        Ok(output.stdout)
    }

    fn classify(&self, command: String, endpoint: String, output: String, target: &Target<'_>) -> Error {
        if self.patterns.is_not_found(&output) {
            Error::not_found(target.kind, target.name)
        } else if self.patterns.is_timeout(&output) {
            Error::RequestTimeout { url: endpoint }
        } else {
            Error::Plugin {
                command,
                output: output.trim().to_string(),
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        address: String,
        args: &[&str],
        target: &Target<'_>,
    ) -> Result<T> {
        let mut full = vec!["-ojson", "get"];
        full.extend_from_slice(args);
        let stdout = self.run(address, &full, target).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    /// `get <args>` on the first node that answers
    async fn get_any<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: &[&str],
        target: Target<'_>,
    ) -> Result<T> {
        let addresses = self.nodes.node_addresses().await?;
        failover::query(operation, &addresses, |address| {
            self.get_json(address, args, &target)
        })
        .await
    }

    async fn resolve(&self, wire: &WireVolume) -> Result<Option<Volume>> {
        resolve_volume(wire, |id| self.replicas.replica_uri(id)).await
    }
}

impl ControlPlaneBackend for PluginControlPlane {
    fn version(&self) -> ControlPlaneVersion {
        ControlPlaneVersion::Rest
    }

    fn backend_name(&self) -> &str {
        "plugin"
    }

    fn is_timeout_error(&self, err: &Error) -> bool {
        match err {
            Error::Plugin { output, .. } => self.patterns.is_timeout(output),
            other => other.is_timeout(),
        }
    }
}

#[async_trait]
impl VolumeDirectory for PluginControlPlane {
    async fn get_volume(&self, uuid: &str) -> Result<Option<Volume>> {
        let target = Target {
            kind: "volume",
            name: uuid,
        };
        let wire: WireVolume = self
            .get_any("get volume", &["volume", uuid], target)
            .await?;
        self.resolve(&wire).await
    }

    async fn get_volume_state(&self, uuid: &str) -> Result<String> {
        let target = Target {
            kind: "volume",
            name: uuid,
        };
        let wire: WireVolume = self
            .get_any("get volume state", &["volume", uuid], target)
            .await?;
        Ok(wire.reported_state())
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        let target = Target {
            kind: "volumes",
            name: "",
        };
        let list: WireList<WireVolume> = self.get_any("list volumes", &["volumes"], target).await?;

        let mut volumes = Vec::new();
        for wire in list.into_vec() {
            if let Some(volume) = self.resolve(&wire).await? {
                volumes.push(volume);
            }
        }
        Ok(volumes)
    }

    async fn set_replica_count(&self, uuid: &str, count: u32) -> Result<()> {
        info!("Scaling volume {} to {} replicas", uuid, count);
        let count = count.to_string();
        let target = Target {
            kind: "volume",
            name: uuid,
        };
        let addresses = self.nodes.node_addresses().await?;
        failover::query("set replica count", &addresses, |address| {
            let args = ["scale", "volume", uuid, count.as_str()];
            let target = &target;
            async move { self.run(address, &args, target).await.map(|_| ()) }
        })
        .await
    }

    async fn delete_volume(&self, uuid: &str) -> Result<()> {
        debug!(uuid, "volume deletion requested through the plugin");
        Err(Error::Unsupported {
            operation: "delete volume".into(),
            backend: self.backend_name().to_string(),
        })
    }
}

#[async_trait]
impl PoolDirectory for PluginControlPlane {
    async fn get_pool(&self, name: &str) -> Result<Pool> {
        let target = Target { kind: "pool", name };
        let pool: WirePool = self.get_any("get pool", &["pool", name], target).await?;
        Ok(pool.to_pool())
    }

    async fn list_pools(&self) -> Result<Vec<Pool>> {
        let target = Target {
            kind: "pools",
            name: "",
        };
        let list: WireList<WirePool> = self.get_any("list pools", &["pools"], target).await?;
        Ok(list.into_vec().iter().map(WirePool::to_pool).collect())
    }
}

#[async_trait]
impl NodeDirectory for PluginControlPlane {
    async fn get_node(&self, name: &str) -> Result<Node> {
        let target = Target { kind: "node", name };
        let node: WireNode = self.get_any("get node", &["node", name], target).await?;
        Ok(node.to_node())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let target = Target {
            kind: "nodes",
            name: "",
        };
        let list: WireList<WireNode> = self.get_any("list nodes", &["nodes"], target).await?;
        Ok(list.into_vec().iter().map(WireNode::to_node).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_output() {
        let patterns = OutputPatterns::new().unwrap();
        let output = "Error error in response: status code '404 Not Found', content: \
                      'RestJsonError { details: \"\", kind: NotFound }'";
        assert!(patterns.is_not_found(output));
        assert!(!patterns.is_timeout(output));

        let output = "Error error in response: status code '500', content: \
                      'RestJsonError { details: \"\", kind: Internal }'";
        assert!(!patterns.is_not_found(output));
    }

    #[test]
    fn test_timeout_output() {
        let patterns = OutputPatterns::new().unwrap();
        assert!(patterns.is_timeout("Error error in response: 408 Request Timeout"));
        assert!(patterns.is_timeout("failed: request timed out"));
        assert!(!patterns.is_timeout("connection refused"));
    }
}
