//! Domain Ports - Core trait definitions for the query layer
//!
//! These traits define the boundaries between the query logic and the
//! cluster. Wire adapters implement the directories; the cluster module
//! implements node enumeration and component probing.

use crate::domain::model::{Node, NodeLocation, NexusChild, Pool, Replica, Volume, VolumeNodes};
use crate::domain::vocabulary::{ControlPlaneVersion, StateVocabulary};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, info};

// =============================================================================
// Cluster Collaborators
// =============================================================================

/// Enumerates the Kubernetes nodes of the cluster under test
#[async_trait]
pub trait NodeAddressProvider: Send + Sync {
    /// All nodes, in the order the cluster reports them
    async fn node_locations(&self) -> Result<Vec<NodeLocation>>;

    /// IP addresses of every node
    async fn node_addresses(&self) -> Result<Vec<String>> {
        Ok(self
            .node_locations()
            .await?
            .into_iter()
            .map(|n| n.ip_address)
            .collect())
    }

    /// IP addresses of the nodes running the Mayastor data plane
    async fn storage_node_addresses(&self) -> Result<Vec<String>> {
        Ok(self
            .node_locations()
            .await?
            .into_iter()
            .filter(|n| n.storage_node)
            .map(|n| n.ip_address)
            .collect())
    }
}

/// Detects deployed control-plane components
#[async_trait]
pub trait ComponentProbe: Send + Sync {
    /// True if a Deployment or a StatefulSet named `name` exists in `namespace`,
    /// whatever its readiness
    async fn component_exists(&self, namespace: &str, name: &str) -> Result<bool>;
}

// =============================================================================
// Control Plane Directories
// =============================================================================

/// Identity of a wire adapter
pub trait ControlPlaneBackend: Send + Sync {
    fn version(&self) -> ControlPlaneVersion;

    /// Short adapter name for logs ("crd", "rest", "plugin")
    fn backend_name(&self) -> &str;

    fn vocabulary(&self) -> &'static StateVocabulary {
        self.version().vocabulary()
    }

    fn is_timeout_error(&self, err: &Error) -> bool {
        err.is_timeout()
    }
}

/// Volume queries and mutations
///
/// `get_volume` returns `Ok(None)` for a volume that is still being
/// created; callers poll until it materialises.
#[async_trait]
pub trait VolumeDirectory: ControlPlaneBackend {
    async fn get_volume(&self, uuid: &str) -> Result<Option<Volume>>;

    /// All created volumes. Pending volumes are left out; a single
    /// malformed record fails the whole call.
    async fn list_volumes(&self) -> Result<Vec<Volume>>;

    async fn set_replica_count(&self, uuid: &str, count: u32) -> Result<()>;

    async fn delete_volume(&self, uuid: &str) -> Result<()>;

    async fn get_volume_nodes(&self, uuid: &str) -> Result<VolumeNodes> {
        Ok(self
            .get_volume(uuid)
            .await?
            .map(|v| VolumeNodes {
                nexus_node: v.status.nexus.node.clone(),
                replica_nodes: v.replica_nodes(),
            })
            .unwrap_or_default())
    }

    /// Volume state, empty while the volume is pending
    async fn get_volume_state(&self, uuid: &str) -> Result<String> {
        Ok(self
            .get_volume(uuid)
            .await?
            .map(|v| v.status.state)
            .unwrap_or_default())
    }

    async fn get_volume_replicas(&self, uuid: &str) -> Result<Vec<Replica>> {
        Ok(self
            .get_volume(uuid)
            .await?
            .map(|v| v.status.replicas)
            .unwrap_or_default())
    }

    async fn get_nexus_children(&self, uuid: &str) -> Result<Vec<NexusChild>> {
        Ok(self
            .get_volume(uuid)
            .await?
            .map(|v| v.status.nexus.children)
            .unwrap_or_default())
    }

    async fn get_nexus_state(&self, uuid: &str) -> Result<String> {
        Ok(self
            .get_volume(uuid)
            .await?
            .map(|v| v.status.nexus.state)
            .unwrap_or_default())
    }

    async fn is_volume_published(&self, uuid: &str) -> Result<bool> {
        Ok(self
            .get_volume(uuid)
            .await?
            .map(|v| !v.spec.target_node.is_empty())
            .unwrap_or(false))
    }

    /// True only when the backend positively reports the volume as absent
    async fn is_volume_deleted(&self, uuid: &str) -> Result<bool> {
        match self.get_volume(uuid).await {
            Ok(_) => Ok(false),
            Err(e) if e.is_not_found() => Ok(true),
            Err(e) => Err(e),
        }
    }

    async fn check_for_volumes(&self) -> Result<bool> {
        Ok(!self.list_volumes().await?.is_empty())
    }

    async fn check_all_volumes_healthy(&self) -> Result<()> {
        let healthy = self.vocabulary().vol_state_healthy();
        let unhealthy: Vec<String> = self
            .list_volumes()
            .await?
            .into_iter()
            .filter(|v| v.status.state != healthy)
            .map(|v| {
                info!(uuid = %v.name, state = %v.status.state, "volume is not healthy");
                format!("{}={}", v.name, v.status.state)
            })
            .collect();

        if unhealthy.is_empty() {
            Ok(())
        } else {
            Err(Error::Unhealthy {
                kind: "volumes".into(),
                names: unhealthy.join(", "),
            })
        }
    }
}

/// Pool queries
#[async_trait]
pub trait PoolDirectory: ControlPlaneBackend {
    /// Fails with a not-found error when the pool does not exist
    async fn get_pool(&self, name: &str) -> Result<Pool>;

    async fn list_pools(&self) -> Result<Vec<Pool>>;

    async fn delete_pool(&self, name: &str) -> Result<()> {
        debug!(pool = %name, backend = %self.backend_name(), "pool deletion not available");
        Err(Error::Unsupported {
            operation: "delete pool".into(),
            backend: self.backend_name().to_string(),
        })
    }

    async fn check_all_pools_online(&self) -> Result<()> {
        let online = self.vocabulary().pool_state_online();
        let offline: Vec<String> = self
            .list_pools()
            .await?
            .into_iter()
            .filter(|p| p.status.state != online)
            .map(|p| {
                info!(pool = %p.name, state = %p.status.state, "pool is not online");
                format!("{}={}", p.name, p.status.state)
            })
            .collect();

        if offline.is_empty() {
            Ok(())
        } else {
            Err(Error::Unhealthy {
                kind: "pools".into(),
                names: offline.join(", "),
            })
        }
    }
}

/// Mayastor node queries
#[async_trait]
pub trait NodeDirectory: ControlPlaneBackend {
    /// Fails with a not-found error when the node is not registered
    async fn get_node(&self, name: &str) -> Result<Node>;

    async fn list_nodes(&self) -> Result<Vec<Node>>;

    async fn get_node_status(&self, name: &str) -> Result<String> {
        Ok(self.get_node(name).await?.state.status)
    }
}

/// The complete operation set every control-plane generation provides
pub trait ControlPlane: VolumeDirectory + PoolDirectory + NodeDirectory {}

impl<T> ControlPlane for T where T: VolumeDirectory + PoolDirectory + NodeDirectory {}
