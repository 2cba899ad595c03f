//! REST control plane wire format
//!
//! JSON shapes returned by the OpenAPI endpoints. The kubectl plugin emits
//! the same documents with `-ojson`, so both REST adapters decode through
//! these types. Every field is optional on the wire; validation decides
//! whether a volume is pending, malformed or usable.

use crate::domain::model::{
    Nexus, NexusChild, Node, NodeSpec, NodeState, Pool, PoolSpec, PoolStatus, Replica, Volume,
    VolumeSpec, VolumeStatus,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use tracing::warn;

/// Volume spec status reported while the volume is being created
const SPEC_STATUS_CREATING: &str = "Creating";
/// Volume state reported before the control plane has placed the volume
const STATE_STATUS_PENDING: &str = "pending";
/// Volume state the REST control plane reports when it cannot tell
const STATE_STATUS_UNKNOWN: &str = "Unknown";
/// Replica topology state of a reachable replica
const REPLICA_ONLINE: &str = "Online";

// =============================================================================
// Collections
// =============================================================================

/// Collection responses, plain arrays or paginated `entries`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireList<T> {
    Plain(Vec<T>),
    Paged {
        entries: Vec<T>,
        #[serde(default)]
        next_token: Option<u64>,
    },
}

impl<T> WireList<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            WireList::Plain(items) => items,
            WireList::Paged { entries, .. } => entries,
        }
    }
}

// =============================================================================
// Volume
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireVolume {
    #[serde(default)]
    pub spec: Option<WireVolumeSpec>,
    #[serde(default)]
    pub state: Option<WireVolumeState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireVolumeSpec {
    pub num_replicas: i64,
    pub size: i64,
    pub status: String,
    pub target: Option<WireSpecTarget>,
    pub uuid: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireSpecTarget {
    pub protocol: Option<String>,
    pub node: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireVolumeState {
    pub target: Option<WireNexus>,
    pub size: i64,
    pub status: String,
    pub uuid: String,
    /// Replica UUID to placement, ordered for stable output
    pub replica_topology: BTreeMap<String, WireReplicaTopology>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireNexus {
    pub children: Vec<WireChild>,
    #[serde(rename = "deviceUri")]
    pub device_uri: String,
    pub node: String,
    pub rebuilds: u32,
    pub protocol: String,
    pub size: i64,
    pub state: String,
    pub uuid: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireChild {
    pub state: String,
    pub uri: String,
    #[serde(rename = "rebuildProgress")]
    pub rebuild_progress: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireReplicaTopology {
    pub node: Option<String>,
    pub pool: Option<String>,
    pub state: String,
}

/// A volume that passed validation
#[derive(Debug, Clone, Copy)]
pub struct CheckedVolume<'a> {
    spec: &'a WireVolumeSpec,
    state: &'a WireVolumeState,
}

impl WireVolume {
    /// The reported volume state as is, empty while the volume is pending.
    ///
    /// Unlike [`WireVolume::check`] this accepts any state string, so a
    /// reading taken mid-transition (`Unknown` while a node reboots) is
    /// handed to the caller instead of failing.
    pub fn reported_state(&self) -> String {
        match (&self.spec, &self.state) {
            (Some(spec), Some(state))
                if !spec.uuid.is_empty()
                    && spec.status != SPEC_STATUS_CREATING
                    && !state.status.eq_ignore_ascii_case(STATE_STATUS_PENDING) =>
            {
                state.status.clone()
            }
            _ => String::new(),
        }
    }

    /// Classify the volume.
    ///
    /// `Ok(None)` while it is still being created, an error when a created
    /// volume is missing its state or declares fewer than one replica.
    pub fn check(&self) -> Result<Option<CheckedVolume<'_>>> {
        let (spec, state) = match (&self.spec, &self.state) {
            (Some(spec), Some(state)) => (spec, state),
            _ => return Ok(None),
        };

        if spec.uuid.is_empty()
            || spec.status == SPEC_STATUS_CREATING
            || state.status.eq_ignore_ascii_case(STATE_STATUS_PENDING)
        {
            return Ok(None);
        }

        if state.status.is_empty() || state.status == STATE_STATUS_UNKNOWN {
            return Err(Error::StateNotDefined {
                kind: "volume".into(),
                name: spec.uuid.clone(),
                state: state.status.clone(),
            });
        }

        if spec.num_replicas < 1 {
            return Err(Error::InvalidReplicaCount {
                uuid: spec.uuid.clone(),
                count: spec.num_replicas,
            });
        }

        if let Some(nexus) = &state.target {
            if nexus.children.is_empty() {
                return Err(Error::MissingNexusChildren {
                    uuid: spec.uuid.clone(),
                });
            }
        }

        Ok(Some(CheckedVolume { spec, state }))
    }
}

impl<'a> CheckedVolume<'a> {
    pub fn uuid(&self) -> &'a str {
        let spec = self.spec;
        &spec.uuid
    }

    /// Replica UUIDs in topology order; their URIs need a separate lookup
    pub fn replica_ids(&self) -> impl Iterator<Item = &'a str> {
        let state = self.state;
        state.replica_topology.keys().map(String::as_str)
    }

    /// Build the canonical volume. `uris` maps replica UUID to URI, replicas
    /// missing from it get an empty URI.
    pub fn to_volume(&self, uris: &HashMap<String, String>) -> Volume {
        let replicas = self
            .state
            .replica_topology
            .iter()
            .map(|(id, topology)| Replica {
                node: topology.node.clone().unwrap_or_default(),
                pool: topology.pool.clone().unwrap_or_default(),
                uri: uris.get(id).cloned().unwrap_or_default(),
                offline: topology.state != REPLICA_ONLINE,
            })
            .collect();

        let nexus = self
            .state
            .target
            .as_ref()
            .map(|n| Nexus {
                children: n
                    .children
                    .iter()
                    .map(|c| NexusChild::new(c.uri.clone(), c.state.clone()))
                    .collect(),
                device_uri: n.device_uri.clone(),
                node: n.node.clone(),
                state: n.state.clone(),
                uuid: n.uuid.clone(),
            })
            .unwrap_or_default();

        let target = self.spec.target.as_ref();
        Volume {
            name: self.spec.uuid.clone(),
            spec: VolumeSpec {
                protocol: target
                    .and_then(|t| t.protocol.clone())
                    .unwrap_or_else(|| "none".to_string()),
                replica_count: u32::try_from(self.spec.num_replicas).unwrap_or(u32::MAX),
                required_bytes: self.spec.size,
                target_node: target.map(|t| t.node.clone()).unwrap_or_default(),
            },
            status: VolumeStatus {
                state: self.state.status.clone(),
                size: self.state.size,
                nexus,
                replicas,
                reason: String::new(),
            },
        }
    }
}

/// Validate a volume and resolve its replica URIs, one lookup per replica.
///
/// A replica the control plane no longer knows keeps an empty URI; any other
/// lookup failure fails the whole volume.
pub async fn resolve_volume<F, Fut>(wire: &WireVolume, mut replica_uri: F) -> Result<Option<Volume>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let Some(checked) = wire.check()? else {
        return Ok(None);
    };

    let mut uris = HashMap::new();
    for id in checked.replica_ids() {
        match replica_uri(id.to_string()).await {
            Ok(uri) => {
                uris.insert(id.to_string(), uri);
            }
            Err(e) if e.is_not_found() => {
                warn!(uuid = %checked.uuid(), replica = %id, "replica not found, uri left empty");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Some(checked.to_volume(&uris)))
}

// =============================================================================
// Replica
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireReplica {
    pub node: String,
    pub pool: String,
    pub share: String,
    pub size: i64,
    pub state: String,
    pub thin: bool,
    pub uri: String,
    pub uuid: String,
}

// =============================================================================
// Pool
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WirePool {
    pub id: String,
    pub spec: Option<WirePoolSpec>,
    pub state: Option<WirePoolState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WirePoolSpec {
    pub disks: Vec<String>,
    pub id: String,
    pub labels: Option<BTreeMap<String, String>>,
    pub node: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WirePoolState {
    pub capacity: i64,
    pub disks: Vec<String>,
    pub id: String,
    pub node: String,
    pub status: String,
    pub used: i64,
}

impl WirePool {
    pub fn to_pool(&self) -> Pool {
        let spec = self.spec.clone().unwrap_or_default();
        let state = self.state.clone().unwrap_or_default();
        let name = [&self.id, &spec.id, &state.id]
            .into_iter()
            .find(|id| !id.is_empty())
            .cloned()
            .unwrap_or_default();
        let node = if spec.node.is_empty() {
            state.node.clone()
        } else {
            spec.node.clone()
        };

        Pool {
            name,
            spec: PoolSpec {
                node,
                disks: spec.disks.clone(),
            },
            status: PoolStatus::new(state.capacity, state.used, state.disks, state.status, ""),
        }
    }
}

// =============================================================================
// Node
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireNode {
    pub id: String,
    pub spec: Option<WireNodeSpec>,
    pub state: Option<WireNodeState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireNodeSpec {
    #[serde(rename = "grpcEndpoint")]
    pub grpc_endpoint: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireNodeState {
    #[serde(rename = "grpcEndpoint")]
    pub grpc_endpoint: String,
    pub id: String,
    pub status: String,
}

impl WireNode {
    pub fn to_node(&self) -> Node {
        let spec = self.spec.clone().unwrap_or_default();
        let state = self.state.clone().unwrap_or_default();
        let name = [&self.id, &spec.id, &state.id]
            .into_iter()
            .find(|id| !id.is_empty())
            .cloned()
            .unwrap_or_default();

        Node {
            name,
            spec: NodeSpec {
                id: spec.id,
                grpc_endpoint: spec.grpc_endpoint,
            },
            state: NodeState {
                id: state.id,
                grpc_endpoint: state.grpc_endpoint,
                status: state.status,
            },
        }
    }
}
