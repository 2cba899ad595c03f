//! Storage node data plane access over gRPC
//!
//! Per-node inventories (pools, replicas, nexuses, NVMe controllers) and
//! fault injection, read directly from each storage node rather than
//! through the control plane.

pub mod client;
pub mod proto;

pub use client::{gather, Gathered, StorageNodeClient};
