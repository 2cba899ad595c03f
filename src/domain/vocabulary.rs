//! State vocabularies
//!
//! The two control-plane generations spell the same resource states
//! differently ("healthy" vs "Online", "CHILD_FAULTED" vs "Faulted").
//! Callers compare observed states only through these accessors, reached
//! from the resolved [`ControlPlaneVersion`].

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Control Plane Version
// =============================================================================

/// The control-plane generation deployed in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlPlaneVersion {
    /// moac with MayastorVolume/MayastorPool/MayastorNode custom resources
    Crd,
    /// core agent behind the REST API
    Rest,
}

impl ControlPlaneVersion {
    pub fn version(&self) -> &'static str {
        match self {
            ControlPlaneVersion::Crd => "0.8.2",
            ControlPlaneVersion::Rest => "1.0.0",
        }
    }

    pub fn major_version(&self) -> u32 {
        match self {
            ControlPlaneVersion::Crd => 0,
            ControlPlaneVersion::Rest => 1,
        }
    }

    pub fn vocabulary(&self) -> &'static StateVocabulary {
        match self {
            ControlPlaneVersion::Crd => &CRD_VOCABULARY,
            ControlPlaneVersion::Rest => &REST_VOCABULARY,
        }
    }
}

impl fmt::Display for ControlPlaneVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlPlaneVersion::Crd => write!(f, "crd ({})", self.version()),
            ControlPlaneVersion::Rest => write!(f, "rest ({})", self.version()),
        }
    }
}

// =============================================================================
// State Vocabulary
// =============================================================================

/// State names used by one control-plane generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateVocabulary {
    volume_healthy: &'static str,
    volume_degraded: &'static str,
    volume_faulted: &'static str,
    child_unknown: &'static str,
    child_online: &'static str,
    child_degraded: &'static str,
    child_faulted: &'static str,
    nexus_unknown: &'static str,
    nexus_online: &'static str,
    nexus_degraded: &'static str,
    nexus_faulted: &'static str,
    pool_online: &'static str,
    /// Indexed by the gRPC `PoolState` enum value
    pool_grpc_states: [&'static str; 4],
    pool_grpc_fallback: &'static str,
    node_online: &'static str,
    node_offline: &'static str,
    node_unknown: &'static str,
}

/// Legacy CRD control plane (moac)
pub const CRD_VOCABULARY: StateVocabulary = StateVocabulary {
    volume_healthy: "healthy",
    volume_degraded: "degraded",
    volume_faulted: "faulted",
    child_unknown: "CHILD_UNKNOWN",
    child_online: "CHILD_ONLINE",
    child_degraded: "CHILD_DEGRADED",
    child_faulted: "CHILD_FAULTED",
    nexus_unknown: "NEXUS_UNKNOWN",
    nexus_online: "NEXUS_ONLINE",
    nexus_degraded: "NEXUS_DEGRADED",
    nexus_faulted: "NEXUS_FAULTED",
    pool_online: "online",
    pool_grpc_states: ["pending", "online", "degraded", "faulted"],
    pool_grpc_fallback: "offline",
    node_online: "online",
    node_offline: "offline",
    node_unknown: "unknown",
};

/// REST control plane (core agent), shared by the OpenAPI and plugin clients
pub const REST_VOCABULARY: StateVocabulary = StateVocabulary {
    volume_healthy: "Online",
    volume_degraded: "Degraded",
    volume_faulted: "Faulted",
    child_unknown: "Unknown",
    child_online: "Online",
    child_degraded: "Degraded",
    child_faulted: "Faulted",
    nexus_unknown: "Unknown",
    nexus_online: "Online",
    nexus_degraded: "Degraded",
    nexus_faulted: "Faulted",
    pool_online: "Online",
    pool_grpc_states: ["Pending", "Online", "Degraded", "Faulted"],
    pool_grpc_fallback: "Unknown",
    node_online: "Online",
    node_offline: "Offline",
    node_unknown: "Unknown",
};

impl StateVocabulary {
    pub fn vol_state_healthy(&self) -> &'static str {
        self.volume_healthy
    }

    pub fn vol_state_degraded(&self) -> &'static str {
        self.volume_degraded
    }

    pub fn vol_state_faulted(&self) -> &'static str {
        self.volume_faulted
    }

    pub fn child_state_unknown(&self) -> &'static str {
        self.child_unknown
    }

    pub fn child_state_online(&self) -> &'static str {
        self.child_online
    }

    pub fn child_state_degraded(&self) -> &'static str {
        self.child_degraded
    }

    pub fn child_state_faulted(&self) -> &'static str {
        self.child_faulted
    }

    pub fn nexus_state_unknown(&self) -> &'static str {
        self.nexus_unknown
    }

    pub fn nexus_state_online(&self) -> &'static str {
        self.nexus_online
    }

    pub fn nexus_state_degraded(&self) -> &'static str {
        self.nexus_degraded
    }

    pub fn nexus_state_faulted(&self) -> &'static str {
        self.nexus_faulted
    }

    pub fn pool_state_online(&self) -> &'static str {
        self.pool_online
    }

    pub fn node_state_online(&self) -> &'static str {
        self.node_online
    }

    pub fn node_state_offline(&self) -> &'static str {
        self.node_offline
    }

    pub fn node_state_unknown(&self) -> &'static str {
        self.node_unknown
    }

    /// A node that has never reported a status
    pub fn node_state_empty(&self) -> &'static str {
        ""
    }

    /// Translate a gRPC `PoolState` value into this generation's pool state name
    pub fn pool_grpc_state_to_crd_state(&self, state: i32) -> &'static str {
        usize::try_from(state)
            .ok()
            .and_then(|idx| self.pool_grpc_states.get(idx).copied())
            .unwrap_or(self.pool_grpc_fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_metadata() {
        assert_eq!(ControlPlaneVersion::Crd.version(), "0.8.2");
        assert_eq!(ControlPlaneVersion::Crd.major_version(), 0);
        assert_eq!(ControlPlaneVersion::Rest.version(), "1.0.0");
        assert_eq!(ControlPlaneVersion::Rest.major_version(), 1);
        assert_eq!(ControlPlaneVersion::Rest.vocabulary(), &REST_VOCABULARY);
        assert_eq!(ControlPlaneVersion::Crd.to_string(), "crd (0.8.2)");
    }

    #[test]
    fn test_vocabularies_differ() {
        assert_eq!(CRD_VOCABULARY.vol_state_healthy(), "healthy");
        assert_eq!(REST_VOCABULARY.vol_state_healthy(), "Online");
        assert_eq!(CRD_VOCABULARY.vol_state_faulted(), "faulted");
        assert_eq!(REST_VOCABULARY.vol_state_faulted(), "Faulted");
        assert_eq!(CRD_VOCABULARY.child_state_faulted(), "CHILD_FAULTED");
        assert_eq!(REST_VOCABULARY.child_state_faulted(), "Faulted");
        assert_eq!(REST_VOCABULARY.node_state_empty(), "");
    }

    #[test]
    fn test_pool_grpc_mapping() {
        assert_eq!(CRD_VOCABULARY.pool_grpc_state_to_crd_state(0), "pending");
        assert_eq!(CRD_VOCABULARY.pool_grpc_state_to_crd_state(1), "online");
        assert_eq!(CRD_VOCABULARY.pool_grpc_state_to_crd_state(3), "faulted");
        assert_eq!(CRD_VOCABULARY.pool_grpc_state_to_crd_state(7), "offline");
        assert_eq!(REST_VOCABULARY.pool_grpc_state_to_crd_state(2), "Degraded");
        assert_eq!(REST_VOCABULARY.pool_grpc_state_to_crd_state(-1), "Unknown");
    }
}
