//! Canonical resource model
//!
//! Backend-independent records for volumes, pools and nodes. Every wire
//! adapter decodes its native payload into these types; nothing here is
//! cached, each query rebuilds the records from a fresh response.

use serde::{Deserialize, Serialize};

/// URI scheme of a nexus child colocated with its nexus
pub const NEXUS_LOCAL_SCHEME: &str = "bdev:///";

// =============================================================================
// Volume
// =============================================================================

/// A Mayastor volume, identified by its UUID
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume UUID
    pub name: String,
    pub spec: VolumeSpec,
    pub status: VolumeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    /// Share protocol of the volume target (nvmf, iscsi, none)
    pub protocol: String,
    /// Declared number of replicas, at least 1 for a created volume
    pub replica_count: u32,
    /// Requested size in bytes
    pub required_bytes: i64,
    /// Node the volume is published on, empty while unpublished
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_node: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeStatus {
    /// Backend-specific state string, compare via [`crate::StateVocabulary`]
    pub state: String,
    pub size: i64,
    pub nexus: Nexus,
    pub replicas: Vec<Replica>,
    pub reason: String,
}

impl Volume {
    /// Names of the nodes hosting a replica of this volume
    pub fn replica_nodes(&self) -> Vec<String> {
        self.status.replicas.iter().map(|r| r.node.clone()).collect()
    }
}

/// Node placement of a volume's nexus and replicas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeNodes {
    pub nexus_node: String,
    pub replica_nodes: Vec<String>,
}

// =============================================================================
// Nexus
// =============================================================================

/// The I/O target of a volume, aggregating the replica data paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nexus {
    pub children: Vec<NexusChild>,
    pub device_uri: String,
    pub node: String,
    pub state: String,
    pub uuid: String,
}

impl Nexus {
    /// Children colocated with the nexus. A healthy nexus has at most one.
    pub fn local_children(&self) -> impl Iterator<Item = &NexusChild> {
        self.children.iter().filter(|c| c.is_local())
    }

    /// The first nexus-local child, if any
    pub fn local_child(&self) -> Option<&NexusChild> {
        self.local_children().next()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NexusChild {
    pub uri: String,
    pub state: String,
}

impl NexusChild {
    pub fn new(uri: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            state: state.into(),
        }
    }

    /// True when the child is served by the nexus node itself
    pub fn is_local(&self) -> bool {
        self.uri.starts_with(NEXUS_LOCAL_SCHEME)
    }
}

// =============================================================================
// Replica
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replica {
    pub node: String,
    pub pool: String,
    /// Connection URI, empty when the backend no longer knows the replica
    pub uri: String,
    pub offline: bool,
}

// =============================================================================
// Pool
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub name: String,
    pub spec: PoolSpec,
    pub status: PoolStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    pub node: String,
    pub disks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
    pub capacity: i64,
    pub used: i64,
    /// Always `capacity - used`, see [`PoolStatus::new`]
    pub avail: i64,
    pub disks: Vec<String>,
    pub state: String,
    pub reason: String,
}

impl PoolStatus {
    /// Build a pool status, deriving the available bytes from the response
    pub fn new(
        capacity: i64,
        used: i64,
        disks: Vec<String>,
        state: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            capacity,
            used,
            avail: capacity - used,
            disks,
            state: state.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Node
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    pub spec: NodeSpec,
    pub state: NodeState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: String,
    pub grpc_endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeState {
    pub id: String,
    pub grpc_endpoint: String,
    /// Online, Offline, Unknown or empty, spelled per backend
    pub status: String,
}

// =============================================================================
// Cluster Topology
// =============================================================================

/// One Kubernetes node as seen by the query layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLocation {
    pub node_name: String,
    pub ip_address: String,
    /// Runs the Mayastor data plane
    pub storage_node: bool,
    /// Runs the Kubernetes control plane
    pub control_node: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nexus_local_child() {
        let nexus = Nexus {
            children: vec![
                NexusChild::new("bdev:///replica1", "Online"),
                NexusChild::new("nvmf://10.0.0.2:8420/nqn.2019-05.io.openebs:replica2", "Online"),
            ],
            ..Default::default()
        };

        assert_eq!(nexus.local_children().count(), 1);
        assert_eq!(
            nexus.local_child().map(|c| c.uri.as_str()),
            Some("bdev:///replica1")
        );
        assert!(!nexus.children[1].is_local());
    }

    #[test]
    fn test_pool_avail_derived() {
        let status = PoolStatus::new(10_000, 2_500, vec!["/dev/sdb".into()], "Online", "");
        assert_eq!(status.avail, 7_500);
        assert_eq!(status.avail, status.capacity - status.used);
    }

    #[test]
    fn test_replica_nodes() {
        let volume = Volume {
            status: VolumeStatus {
                replicas: vec![
                    Replica {
                        node: "node-a".into(),
                        ..Default::default()
                    },
                    Replica {
                        node: "node-b".into(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(volume.replica_nodes(), vec!["node-a", "node-b"]);
    }
}
