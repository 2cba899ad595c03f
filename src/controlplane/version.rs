//! Control plane version resolution
//!
//! The two generations cannot be told apart by a single universal probe,
//! so the deployed one is recognised by the presence of a well-known
//! component. Resolution happens once; the answer is pinned for the rest
//! of the process even if the cluster changes underneath.

use crate::controlplane::config::ComponentCandidate;
use crate::domain::ports::ComponentProbe;
use crate::domain::vocabulary::ControlPlaneVersion;
use crate::error::{Error, Result};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Probe the candidates in order, the first component present wins
pub async fn detect_version(
    probe: &dyn ComponentProbe,
    namespace: &str,
    candidates: &[ComponentCandidate],
) -> Result<ControlPlaneVersion> {
    for candidate in candidates {
        debug!(namespace, component = %candidate.name, "probing control plane component");
        if probe.component_exists(namespace, &candidate.name).await? {
            info!(
                "Detected control plane {} from component {}/{}",
                candidate.version, namespace, candidate.name
            );
            return Ok(candidate.version);
        }
    }

    Err(Error::ControlPlaneAbsent {
        namespace: namespace.to_string(),
    })
}

// =============================================================================
// Version Registry
// =============================================================================

/// Write-once holder of the resolved control plane version
#[derive(Debug, Default)]
pub struct VersionRegistry {
    resolved: OnceCell<ControlPlaneVersion>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that never probes
    pub fn pinned(version: ControlPlaneVersion) -> Self {
        Self {
            resolved: OnceCell::new_with(Some(version)),
        }
    }

    /// The resolved version, if resolution has already happened
    pub fn get(&self) -> Option<ControlPlaneVersion> {
        self.resolved.get().copied()
    }

    /// Resolve on first call, later calls return the pinned value.
    ///
    /// A failed detection leaves the registry unresolved.
    pub async fn check_and_set(
        &self,
        probe: &dyn ComponentProbe,
        namespace: &str,
        candidates: &[ComponentCandidate],
    ) -> Result<ControlPlaneVersion> {
        self.resolved
            .get_or_try_init(|| detect_version(probe, namespace, candidates))
            .await
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProbe {
        present: Mutex<BTreeSet<String>>,
        calls: AtomicUsize,
    }

    impl FakeProbe {
        fn with(names: &[&str]) -> Self {
            let probe = Self::default();
            probe.set(names);
            probe
        }

        fn set(&self, names: &[&str]) {
            let mut present = self.present.lock().unwrap();
            present.clear();
            present.extend(names.iter().map(|n| n.to_string()));
        }
    }

    #[async_trait]
    impl ComponentProbe for FakeProbe {
        async fn component_exists(&self, _namespace: &str, name: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.present.lock().unwrap().contains(name))
        }
    }

    fn candidates() -> Vec<ComponentCandidate> {
        vec![
            ComponentCandidate::new("core-agent", ControlPlaneVersion::Rest),
            ComponentCandidate::new("moac", ControlPlaneVersion::Crd),
        ]
    }

    #[tokio::test]
    async fn test_detect_rest_first() {
        let probe = FakeProbe::with(&["core-agent", "moac"]);
        let version = detect_version(&probe, "mayastor", &candidates()).await.unwrap();
        assert_eq!(version, ControlPlaneVersion::Rest);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detect_crd() {
        let probe = FakeProbe::with(&["moac"]);
        let version = detect_version(&probe, "mayastor", &candidates()).await.unwrap();
        assert_eq!(version, ControlPlaneVersion::Crd);
    }

    #[tokio::test]
    async fn test_absent_components() {
        let probe = FakeProbe::with(&["csi-controller"]);
        let err = detect_version(&probe, "mayastor", &candidates())
            .await
            .unwrap_err();
        assert_matches!(err, Error::ControlPlaneAbsent { .. });
        assert!(err
            .to_string()
            .contains("restful control plane components are absent"));
    }

    #[tokio::test]
    async fn test_version_is_pinned() {
        let registry = VersionRegistry::new();
        assert_eq!(registry.get(), None);

        let probe = FakeProbe::with(&["core-agent"]);
        let first = registry
            .check_and_set(&probe, "mayastor", &candidates())
            .await
            .unwrap();
        assert_eq!(first, ControlPlaneVersion::Rest);

        // the cluster changes, the answer does not
        probe.set(&["moac"]);
        let second = registry
            .check_and_set(&probe, "mayastor", &candidates())
            .await
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(registry.get(), Some(ControlPlaneVersion::Rest));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_detection_leaves_registry_unresolved() {
        let registry = VersionRegistry::new();
        let probe = FakeProbe::with(&[]);
        let err = registry
            .check_and_set(&probe, "mayastor", &candidates())
            .await
            .unwrap_err();
        assert_matches!(err, Error::ControlPlaneAbsent { .. });
        assert_eq!(registry.get(), None);
    }

    #[tokio::test]
    async fn test_pinned_registry_skips_probe() {
        let registry = VersionRegistry::pinned(ControlPlaneVersion::Crd);
        let probe = FakeProbe::with(&["core-agent"]);
        let version = registry
            .check_and_set(&probe, "mayastor", &candidates())
            .await
            .unwrap();
        assert_eq!(version, ControlPlaneVersion::Crd);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }
}
