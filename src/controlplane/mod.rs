//! Control Plane Query Module
//!
//! Resolves which Mayastor control plane generation is deployed and
//! answers volume, pool and node queries through the matching adapter,
//! failing over across cluster nodes.

pub mod backends;
pub mod client;
pub mod config;
pub mod failover;
pub mod version;

pub use backends::{BackendFactory, CrdControlPlane, PluginControlPlane, RestControlPlane};
pub use client::ControlPlaneClient;
pub use config::*;
pub use version::{detect_version, VersionRegistry};
