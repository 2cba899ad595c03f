//! MayastorVolume CRD
//!
//! The volume resource published by the CRD-based control plane (moac).
//! The operator owns the status; the query layer only reads it and patches
//! `spec.replicaCount`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// MayastorVolume CRD
// =============================================================================

/// A Mayastor volume, named by its UUID
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openebs.io",
    version = "v1alpha1",
    kind = "MayastorVolume",
    plural = "mayastorvolumes",
    shortname = "msv",
    status = "MayastorVolumeStatus",
    printcolumn = r#"{"name": "Targets", "type": "string", "jsonPath": ".status.targetNodes"}"#,
    printcolumn = r#"{"name": "Size", "type": "integer", "jsonPath": ".status.size"}"#,
    printcolumn = r#"{"name": "State", "type": "string", "jsonPath": ".status.state"}"#,
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MayastorVolumeSpec {
    pub replica_count: i64,

    #[serde(default)]
    pub preferred_nodes: Vec<String>,

    #[serde(default)]
    pub required_nodes: Vec<String>,

    #[serde(default)]
    pub required_bytes: i64,

    #[serde(default)]
    pub limit_bytes: i64,

    #[serde(default)]
    pub protocol: String,

    /// Keep a replica on the nexus node
    #[serde(default)]
    pub local: bool,
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MayastorVolumeStatus {
    #[serde(default)]
    pub size: i64,

    /// pending, healthy, degraded, faulted or offline
    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub reason: String,

    /// Nodes the volume is published on
    #[serde(default)]
    pub target_nodes: Vec<String>,

    #[serde(default)]
    pub nexus: MsvNexus,

    #[serde(default)]
    pub replicas: Vec<MsvReplica>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MsvNexus {
    #[serde(default)]
    pub node: String,

    #[serde(default)]
    pub device_uri: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub children: Vec<MsvNexusChild>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MsvNexusChild {
    #[serde(default)]
    pub uri: String,

    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MsvReplica {
    #[serde(default)]
    pub node: String,

    #[serde(default)]
    pub pool: String,

    #[serde(default)]
    pub uri: String,

    #[serde(default)]
    pub offline: bool,
}
