//! Mayastor Control Plane Query Layer
//!
//! A version-independent view of a Mayastor cluster's volumes, pools and
//! nodes for end-to-end test suites. Two control plane generations are
//! supported behind one interface: the legacy CRD-based control plane and
//! the REST control plane (reached directly or through the kubectl plugin).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                           ControlPlaneClient                                 │
//! │        version resolution (once) · adapter binding (once) · gRPC flag        │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │   VolumeDirectory · PoolDirectory · NodeDirectory · StateVocabulary          │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                             Wire Adapters                                    │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │      CRD        │  │   REST/OpenAPI  │  │     kubectl plugin          │  │
//! │  │ (MayastorVolume)│  │   (port 30011)  │  │   (subprocess, -ojson)      │  │
//! │  └─────────────────┘  └────────┬────────┘  └─────────────┬───────────────┘  │
//! │                                └──── Failover Query ─────┘                   │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │           Storage node gRPC (port 10124)  ·  Reconciliation helpers          │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controlplane`]: client handle, configuration, version resolution,
//!   failover and the wire adapters
//! - [`domain`]: canonical records, state vocabularies and traits
//! - [`crd`]: Custom Resource Definitions of the CRD control plane
//! - [`cluster`]: Kubernetes node enumeration and component probing
//! - [`grpc`]: storage node gRPC client
//! - [`reconcile`]: poll-until-converged helpers
//! - [`error`]: Error types and handling

pub mod cluster;
pub mod controlplane;
pub mod crd;
pub mod domain;
pub mod error;
pub mod grpc;
pub mod reconcile;

// Re-export commonly used types
pub use controlplane::{
    BackendFactory, ControlPlaneClient, ControlPlaneConfig, CrdControlPlane, PluginControlPlane,
    RestClientKind, RestControlPlane, VersionRegistry,
};

pub use domain::model::{
    Nexus, NexusChild, Node, NodeLocation, Pool, Replica, Volume, VolumeNodes, NEXUS_LOCAL_SCHEME,
};

pub use domain::ports::{
    ComponentProbe, ControlPlane, ControlPlaneBackend, NodeAddressProvider, NodeDirectory,
    PoolDirectory, VolumeDirectory,
};

pub use domain::vocabulary::{ControlPlaneVersion, StateVocabulary};

pub use error::{Error, Result};

pub use grpc::{Gathered, StorageNodeClient};

pub use reconcile::{Observation, PollSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
