//! MayastorPool CRD

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A storage pool created on one node's disks
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openebs.io",
    version = "v1alpha1",
    kind = "MayastorPool",
    plural = "mayastorpools",
    shortname = "msp",
    status = "MayastorPoolStatus",
    printcolumn = r#"{"name": "Node", "type": "string", "jsonPath": ".spec.node"}"#,
    printcolumn = r#"{"name": "State", "type": "string", "jsonPath": ".status.state"}"#,
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MayastorPoolSpec {
    pub node: String,

    #[serde(default)]
    pub disks: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MayastorPoolStatus {
    #[serde(default)]
    pub capacity: i64,

    #[serde(default)]
    pub used: i64,

    #[serde(default)]
    pub disks: Vec<String>,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub reason: String,
}
