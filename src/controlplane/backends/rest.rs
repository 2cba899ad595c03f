//! REST Control Plane Adapter
//!
//! Talks to the core agent's OpenAPI service, exposed on the same port on
//! every node. Each request fails over across the cluster's node addresses.
//! Absence is the HTTP 404 status and a timeout is HTTP 408; no response
//! text is inspected.

use crate::controlplane::backends::wire::{
    resolve_volume, WireList, WireNode, WirePool, WireReplica, WireVolume,
};
use crate::controlplane::config::RestConfig;
use crate::controlplane::failover;
use crate::domain::model::{Node, Pool, Volume};
use crate::domain::ports::{
    ControlPlaneBackend, NodeAddressProvider, NodeDirectory, PoolDirectory, VolumeDirectory,
};
use crate::domain::vocabulary::ControlPlaneVersion;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};
use urlencoding::encode;

// =============================================================================
// REST Adapter
// =============================================================================

/// Adapter for the REST control plane
pub struct RestControlPlane {
    config: RestConfig,
    http: reqwest::Client,
    nodes: Arc<dyn NodeAddressProvider>,
}

impl RestControlPlane {
    /// Create a new REST adapter
    pub fn new(config: RestConfig, nodes: Arc<dyn NodeAddressProvider>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            config,
            http,
            nodes,
        })
    }

    fn url(&self, address: &str, path: &str) -> String {
        format!("{}/v0/{}", self.config.endpoint(address), path)
    }

    /// Issue one request against one node
    async fn request(&self, method: Method, address: String, path: &str) -> Result<reqwest::Response> {
        let url = self.url(&address, path);
        debug!(%method, url = %url, "REST request");

        let response = self.http.request(method, &url).send().await?;
        let status = response.status();

        if status == StatusCode::REQUEST_TIMEOUT {
            return Err(Error::RequestTimeout { url });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                url,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, address: String, path: &str) -> Result<T> {
        let bytes = self.request(Method::GET, address, path).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GET `path` from the first node that answers
    async fn get_any<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<T> {
        let addresses = self.nodes.node_addresses().await?;
        failover::query(operation, &addresses, |address| self.get(address, path)).await
    }

    /// Send a body-less mutation to the first node that accepts it
    async fn send_any(&self, operation: &str, method: Method, path: &str) -> Result<()> {
        let addresses = self.nodes.node_addresses().await?;
        failover::query(operation, &addresses, |address| {
            let method = method.clone();
            async move { self.request(method, address, path).await.map(|_| ()) }
        })
        .await
    }

    /// Connection URI of one replica
    pub(crate) async fn replica_uri(&self, uuid: String) -> Result<String> {
        let path = format!("replicas/{}", encode(&uuid));
        let replica: WireReplica = self
            .get_any("get replica", &path)
            .await
            .map_err(not_found_as("replica", &uuid))?;
        Ok(replica.uri)
    }

    async fn resolve(&self, wire: &WireVolume) -> Result<Option<Volume>> {
        resolve_volume(wire, |id| self.replica_uri(id)).await
    }
}

/// Turn a 404 into a named not-found error, other errors pass through
pub(crate) fn not_found_as<'a>(kind: &'a str, name: &'a str) -> impl FnOnce(Error) -> Error + 'a {
    move |e| {
        if e.is_not_found() {
            Error::not_found(kind, name)
        } else {
            e
        }
    }
}

impl ControlPlaneBackend for RestControlPlane {
    fn version(&self) -> ControlPlaneVersion {
        ControlPlaneVersion::Rest
    }

    fn backend_name(&self) -> &str {
        "rest"
    }
}

#[async_trait]
impl VolumeDirectory for RestControlPlane {
    async fn get_volume(&self, uuid: &str) -> Result<Option<Volume>> {
        let path = format!("volumes/{}", encode(uuid));
        let wire: WireVolume = self
            .get_any("get volume", &path)
            .await
            .map_err(not_found_as("volume", uuid))?;

        let volume = self.resolve(&wire).await?;
        if volume.is_none() {
            debug!(uuid, "volume is pending");
        }
        Ok(volume)
    }

    /// The state as reported, without the checks `get_volume` applies
    async fn get_volume_state(&self, uuid: &str) -> Result<String> {
        let path = format!("volumes/{}", encode(uuid));
        let wire: WireVolume = self
            .get_any("get volume state", &path)
            .await
            .map_err(not_found_as("volume", uuid))?;
        Ok(wire.reported_state())
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        let list: WireList<WireVolume> = self.get_any("list volumes", "volumes").await?;

        let mut volumes = Vec::new();
        for wire in list.into_vec() {
            if let Some(volume) = self.resolve(&wire).await? {
                volumes.push(volume);
            }
        }
        Ok(volumes)
    }

    async fn set_replica_count(&self, uuid: &str, count: u32) -> Result<()> {
        info!("Setting replica count of volume {} to {}", uuid, count);
        let path = format!("volumes/{}/replica_count/{}", encode(uuid), count);
        self.send_any("set replica count", Method::PUT, &path)
            .await
            .map_err(not_found_as("volume", uuid))
    }

    async fn delete_volume(&self, uuid: &str) -> Result<()> {
        info!("Deleting volume {}", uuid);
        let path = format!("volumes/{}", encode(uuid));
        self.send_any("delete volume", Method::DELETE, &path)
            .await
            .map_err(not_found_as("volume", uuid))
    }
}

#[async_trait]
impl PoolDirectory for RestControlPlane {
    async fn get_pool(&self, name: &str) -> Result<Pool> {
        let path = format!("pools/{}", encode(name));
        let pool: WirePool = self
            .get_any("get pool", &path)
            .await
            .map_err(not_found_as("pool", name))?;
        Ok(pool.to_pool())
    }

    async fn list_pools(&self) -> Result<Vec<Pool>> {
        let list: WireList<WirePool> = self.get_any("list pools", "pools").await?;
        Ok(list.into_vec().iter().map(WirePool::to_pool).collect())
    }

    async fn delete_pool(&self, name: &str) -> Result<()> {
        info!("Deleting pool {}", name);
        let path = format!("pools/{}", encode(name));
        self.send_any("delete pool", Method::DELETE, &path)
            .await
            .map_err(not_found_as("pool", name))
    }
}

#[async_trait]
impl NodeDirectory for RestControlPlane {
    async fn get_node(&self, name: &str) -> Result<Node> {
        let path = format!("nodes/{}", encode(name));
        let node: WireNode = self
            .get_any("get node", &path)
            .await
            .map_err(not_found_as("node", name))?;
        Ok(node.to_node())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let list: WireList<WireNode> = self.get_any("list nodes", "nodes").await?;
        Ok(list.into_vec().iter().map(WireNode::to_node).collect())
    }
}
