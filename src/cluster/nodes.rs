//! Cluster node enumeration
//!
//! Builds the candidate address lists for failover queries from the
//! Kubernetes node list.

use crate::domain::model::NodeLocation;
use crate::domain::ports::NodeAddressProvider;
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::debug;

// =============================================================================
// Label Selectors
// =============================================================================

/// A single-label selector, `key` (presence) or `key=value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch {
    key: String,
    value: Option<String>,
}

impl LabelMatch {
    pub fn parse(selector: &str) -> Self {
        match selector.split_once('=') {
            Some((key, value)) => Self {
                key: key.trim().to_string(),
                value: Some(value.trim().to_string()),
            },
            None => Self {
                key: selector.trim().to_string(),
                value: None,
            },
        }
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match (&self.value, labels.get(&self.key)) {
            (None, found) => found.is_some(),
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
        }
    }
}

// =============================================================================
// Kubernetes Node Provider
// =============================================================================

/// Node locations read from the Kubernetes API
pub struct KubeNodeAddressProvider {
    client: Client,
    storage_label: LabelMatch,
    control_label: LabelMatch,
}

impl KubeNodeAddressProvider {
    pub fn new(client: Client, storage_label: &str, control_label: &str) -> Self {
        Self {
            client,
            storage_label: LabelMatch::parse(storage_label),
            control_label: LabelMatch::parse(control_label),
        }
    }

    fn locate(&self, node: &Node) -> Result<NodeLocation> {
        let name = node.metadata.name.clone().unwrap_or_default();
        let addresses = node
            .status
            .as_ref()
            .and_then(|s| s.addresses.as_ref())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let address_of = |kind: &str| {
            addresses
                .iter()
                .find(|a| a.type_ == kind)
                .map(|a| a.address.clone())
        };

        let (hostname, ip_address) = match (address_of("Hostname"), address_of("InternalIP")) {
            (Some(hostname), Some(ip)) => (hostname, ip),
            (hostname, _) => {
                let missing = if hostname.is_none() { "Hostname" } else { "InternalIP" };
                return Err(Error::NodeFields {
                    node: name,
                    missing: missing.to_string(),
                });
            }
        };

        let labels = node.metadata.labels.clone().unwrap_or_default();
        Ok(NodeLocation {
            node_name: hostname,
            ip_address,
            storage_node: self.storage_label.matches(&labels),
            control_node: self.control_label.matches(&labels),
        })
    }
}

#[async_trait]
impl NodeAddressProvider for KubeNodeAddressProvider {
    async fn node_locations(&self) -> Result<Vec<NodeLocation>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let nodes = api.list(&ListParams::default()).await?;

        let locations = nodes
            .items
            .iter()
            .map(|node| self.locate(node))
            .collect::<Result<Vec<_>>>()?;
        debug!(count = locations.len(), "enumerated cluster nodes");
        Ok(locations)
    }
}

// =============================================================================
// Static Node Provider
// =============================================================================

/// A fixed node list, for clusters reached without Kubernetes access
#[derive(Debug, Clone, Default)]
pub struct StaticNodeAddresses {
    locations: Vec<NodeLocation>,
}

impl StaticNodeAddresses {
    /// Every address is treated as a storage node named after its IP
    pub fn new(addresses: Vec<String>) -> Self {
        Self {
            locations: addresses
                .into_iter()
                .map(|ip| NodeLocation {
                    node_name: ip.clone(),
                    ip_address: ip,
                    storage_node: true,
                    control_node: false,
                })
                .collect(),
        }
    }

    pub fn from_locations(locations: Vec<NodeLocation>) -> Self {
        Self { locations }
    }
}

#[async_trait]
impl NodeAddressProvider for StaticNodeAddresses {
    async fn node_locations(&self) -> Result<Vec<NodeLocation>> {
        Ok(self.locations.clone())
    }
}
