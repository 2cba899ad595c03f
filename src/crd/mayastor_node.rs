//! MayastorNode CRD
//!
//! Registered by each storage node's data plane. The status is a bare
//! string (online, offline) rather than a structure.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "openebs.io",
    version = "v1alpha1",
    kind = "MayastorNode",
    plural = "mayastornodes",
    shortname = "msn",
    status = "String",
    printcolumn = r#"{"name": "State", "type": "string", "jsonPath": ".status"}"#,
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MayastorNodeSpec {
    /// Address of the node's gRPC service, `ip:port`
    #[serde(default)]
    pub grpc_endpoint: String,
}
