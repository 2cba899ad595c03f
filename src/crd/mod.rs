//! Custom Resource Definitions of the CRD-based control plane
//!
//! This module contains the resources the legacy (moac) control plane
//! publishes in its namespace:
//! - MayastorVolume: volume spec and nexus/replica status
//! - MayastorPool: pool spec and capacity status
//! - MayastorNode: storage node registration

pub mod mayastor_node;
pub mod mayastor_pool;
pub mod mayastor_volume;

pub use mayastor_node::*;
pub use mayastor_pool::*;
pub use mayastor_volume::*;
