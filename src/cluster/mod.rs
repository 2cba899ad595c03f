//! Kubernetes-backed collaborators
//!
//! Node enumeration for failover candidate lists and component probing
//! for control plane version detection.

pub mod components;
pub mod nodes;

pub use components::*;
pub use nodes::*;
