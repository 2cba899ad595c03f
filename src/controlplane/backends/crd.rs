//! CRD Control Plane Adapter
//!
//! Reads the MayastorVolume, MayastorPool and MayastorNode custom resources
//! from the control-plane namespace. Absence is the Kubernetes API's 404;
//! the API server enforces its own deadlines, so no error is classified as
//! a control-plane timeout.

use crate::crd::{MayastorNode, MayastorPool, MayastorVolume};
use crate::domain::model::{
    Nexus, NexusChild, Node, NodeSpec, NodeState, Pool, PoolSpec, PoolStatus, Replica, Volume,
    VolumeSpec, VolumeStatus,
};
use crate::domain::ports::{ControlPlaneBackend, NodeDirectory, PoolDirectory, VolumeDirectory};
use crate::domain::vocabulary::ControlPlaneVersion;
use crate::error::{Error, Result};
use async_trait::async_trait;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde_json::json;
use tracing::{debug, info};

/// MayastorVolume state while moac is still placing the volume
const MSV_STATE_PENDING: &str = "pending";

// =============================================================================
// Decoding
// =============================================================================

/// Decode a MayastorVolume, `None` while it is pending
pub fn msv_to_volume(msv: &MayastorVolume) -> Result<Option<Volume>> {
    let name = msv.name_any();
    let status = msv.status.clone().unwrap_or_default();

    if status.state == MSV_STATE_PENDING {
        return Ok(None);
    }
    if status.state.is_empty() {
        return Err(Error::StateNotDefined {
            kind: "volume".into(),
            name,
            state: status.state,
        });
    }
    let replica_count = u32::try_from(msv.spec.replica_count)
        .ok()
        .filter(|count| *count >= 1)
        .ok_or_else(|| Error::InvalidReplicaCount {
            uuid: name.clone(),
            count: msv.spec.replica_count,
        })?;

    let nexus = Nexus {
        children: status
            .nexus
            .children
            .iter()
            .map(|c| NexusChild::new(c.uri.clone(), c.state.clone()))
            .collect(),
        device_uri: status.nexus.device_uri.clone(),
        node: status.nexus.node.clone(),
        state: status.nexus.state.clone(),
        uuid: name.clone(),
    };
    let replicas = status
        .replicas
        .iter()
        .map(|r| Replica {
            node: r.node.clone(),
            pool: r.pool.clone(),
            uri: r.uri.clone(),
            offline: r.offline,
        })
        .collect();

    Ok(Some(Volume {
        spec: VolumeSpec {
            protocol: msv.spec.protocol.clone(),
            replica_count,
            required_bytes: msv.spec.required_bytes,
            target_node: status.target_nodes.first().cloned().unwrap_or_default(),
        },
        status: VolumeStatus {
            state: status.state,
            size: status.size,
            nexus,
            replicas,
            reason: status.reason,
        },
        name,
    }))
}

/// The MayastorVolume state as reported, empty while pending or unset
pub fn msv_state(msv: &MayastorVolume) -> String {
    match &msv.status {
        Some(status) if status.state != MSV_STATE_PENDING => status.state.clone(),
        _ => String::new(),
    }
}

pub fn msp_to_pool(msp: &MayastorPool) -> Pool {
    let status = msp.status.clone().unwrap_or_default();
    Pool {
        name: msp.name_any(),
        spec: PoolSpec {
            node: msp.spec.node.clone(),
            disks: msp.spec.disks.clone(),
        },
        status: PoolStatus::new(
            status.capacity,
            status.used,
            status.disks,
            status.state,
            status.reason,
        ),
    }
}

pub fn msn_to_node(msn: &MayastorNode) -> Node {
    let name = msn.name_any();
    Node {
        spec: NodeSpec {
            id: name.clone(),
            grpc_endpoint: msn.spec.grpc_endpoint.clone(),
        },
        state: NodeState {
            id: name.clone(),
            grpc_endpoint: msn.spec.grpc_endpoint.clone(),
            status: msn.status.clone().unwrap_or_default(),
        },
        name,
    }
}

fn kube_not_found<'a>(kind: &'static str, name: &'a str) -> impl FnOnce(kube::Error) -> Error + 'a {
    move |e| {
        let err = Error::Kube(e);
        if err.is_not_found() {
            Error::not_found(kind, name)
        } else {
            err
        }
    }
}

// =============================================================================
// CRD Adapter
// =============================================================================

/// Adapter for the CRD-based control plane
pub struct CrdControlPlane {
    client: Client,
    namespace: String,
}

impl CrdControlPlane {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    fn volumes(&self) -> Api<MayastorVolume> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn pools(&self) -> Api<MayastorPool> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn nodes(&self) -> Api<MayastorNode> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

impl ControlPlaneBackend for CrdControlPlane {
    fn version(&self) -> ControlPlaneVersion {
        ControlPlaneVersion::Crd
    }

    fn backend_name(&self) -> &str {
        "crd"
    }

    fn is_timeout_error(&self, _err: &Error) -> bool {
        false
    }
}

#[async_trait]
impl VolumeDirectory for CrdControlPlane {
    async fn get_volume(&self, uuid: &str) -> Result<Option<Volume>> {
        let msv = self
            .volumes()
            .get(uuid)
            .await
            .map_err(kube_not_found("volume", uuid))?;
        msv_to_volume(&msv)
    }

    async fn get_volume_state(&self, uuid: &str) -> Result<String> {
        let msv = self
            .volumes()
            .get(uuid)
            .await
            .map_err(kube_not_found("volume", uuid))?;
        Ok(msv_state(&msv))
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        let list = self.volumes().list(&ListParams::default()).await?;
        debug!(count = list.items.len(), namespace = %self.namespace, "listed MayastorVolumes");

        let mut volumes = Vec::with_capacity(list.items.len());
        for msv in &list.items {
            if let Some(volume) = msv_to_volume(msv)? {
                volumes.push(volume);
            }
        }
        Ok(volumes)
    }

    async fn set_replica_count(&self, uuid: &str, count: u32) -> Result<()> {
        info!("Patching MayastorVolume {} replicaCount to {}", uuid, count);
        let patch = json!({ "spec": { "replicaCount": count } });
        self.volumes()
            .patch(uuid, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(kube_not_found("volume", uuid))?;
        Ok(())
    }

    async fn delete_volume(&self, uuid: &str) -> Result<()> {
        info!("Deleting MayastorVolume {}", uuid);
        self.volumes()
            .delete(uuid, &DeleteParams::default())
            .await
            .map_err(kube_not_found("volume", uuid))?;
        Ok(())
    }
}

#[async_trait]
impl PoolDirectory for CrdControlPlane {
    async fn get_pool(&self, name: &str) -> Result<Pool> {
        let msp = self
            .pools()
            .get(name)
            .await
            .map_err(kube_not_found("pool", name))?;
        Ok(msp_to_pool(&msp))
    }

    async fn list_pools(&self) -> Result<Vec<Pool>> {
        let list = self.pools().list(&ListParams::default()).await?;
        Ok(list.items.iter().map(msp_to_pool).collect())
    }

    async fn delete_pool(&self, name: &str) -> Result<()> {
        info!("Deleting MayastorPool {}", name);
        self.pools()
            .delete(name, &DeleteParams::default())
            .await
            .map_err(kube_not_found("pool", name))?;
        Ok(())
    }
}

#[async_trait]
impl NodeDirectory for CrdControlPlane {
    async fn get_node(&self, name: &str) -> Result<Node> {
        let msn = self
            .nodes()
            .get(name)
            .await
            .map_err(kube_not_found("node", name))?;
        Ok(msn_to_node(&msn))
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let list = self.nodes().list(&ListParams::default()).await?;
        Ok(list.items.iter().map(msn_to_node).collect())
    }
}
