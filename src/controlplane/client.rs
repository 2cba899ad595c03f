//! Control plane client handle
//!
//! The one object test code holds. It resolves the deployed control plane
//! generation on first use, binds the matching adapter, and hands the same
//! adapter to every caller afterwards. The resolved version, the adapter
//! and the gRPC reachability flag are each written once.

use crate::cluster::{KubeComponentProbe, KubeNodeAddressProvider};
use crate::controlplane::backends::BackendFactory;
use crate::controlplane::config::ControlPlaneConfig;
use crate::controlplane::version::VersionRegistry;
use crate::domain::ports::{ComponentProbe, ControlPlane, NodeAddressProvider};
use crate::domain::vocabulary::{ControlPlaneVersion, StateVocabulary};
use crate::error::Result;
use crate::grpc::StorageNodeClient;
use kube::Client;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Handle on the cluster's control plane and storage nodes
pub struct ControlPlaneClient {
    config: ControlPlaneConfig,
    kube: Option<Client>,
    probe: Arc<dyn ComponentProbe>,
    nodes: Arc<dyn NodeAddressProvider>,
    registry: VersionRegistry,
    backend: OnceCell<Arc<dyn ControlPlane>>,
    grpc: StorageNodeClient,
    grpc_reachable: OnceCell<bool>,
}

impl ControlPlaneClient {
    /// Connect using the ambient kubeconfig or in-cluster credentials
    pub async fn connect(config: ControlPlaneConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::try_default().await?;
        info!("Connected to Kubernetes API, Mayastor namespace {}", config.namespace);

        let probe = Arc::new(KubeComponentProbe::new(client.clone()));
        let nodes = Arc::new(KubeNodeAddressProvider::new(
            client.clone(),
            &config.storage_node_label,
            &config.control_node_label,
        ));
        Ok(Self::new(config, Some(client), probe, nodes))
    }

    /// Build a handle from explicit collaborators
    pub fn new(
        config: ControlPlaneConfig,
        kube: Option<Client>,
        probe: Arc<dyn ComponentProbe>,
        nodes: Arc<dyn NodeAddressProvider>,
    ) -> Self {
        let grpc = StorageNodeClient::new(config.grpc.clone());
        Self {
            config,
            kube,
            probe,
            nodes,
            registry: VersionRegistry::new(),
            backend: OnceCell::new(),
            grpc,
            grpc_reachable: OnceCell::new(),
        }
    }

    /// Skip detection and use the given generation
    pub fn with_version(mut self, version: ControlPlaneVersion) -> Self {
        self.registry = VersionRegistry::pinned(version);
        self
    }

    pub fn config(&self) -> &ControlPlaneConfig {
        &self.config
    }

    pub fn nodes(&self) -> &Arc<dyn NodeAddressProvider> {
        &self.nodes
    }

    pub fn grpc(&self) -> &StorageNodeClient {
        &self.grpc
    }

    /// The resolved version, if resolution has already happened
    pub fn resolved_version(&self) -> Option<ControlPlaneVersion> {
        self.registry.get()
    }

    /// Detect the deployed generation once, later calls return it unchanged
    pub async fn check_and_set_control_plane(&self) -> Result<ControlPlaneVersion> {
        self.registry
            .check_and_set(
                self.probe.as_ref(),
                &self.config.namespace,
                &self.config.components,
            )
            .await
    }

    /// The adapter bound to the deployed generation
    pub async fn control_plane(&self) -> Result<Arc<dyn ControlPlane>> {
        self.backend
            .get_or_try_init(|| async move {
                let version = self.check_and_set_control_plane().await?;
                BackendFactory::create(version, &self.config, self.kube.clone(), self.nodes.clone())
            })
            .await
            .cloned()
    }

    pub async fn vocabulary(&self) -> Result<&'static StateVocabulary> {
        Ok(self.check_and_set_control_plane().await?.vocabulary())
    }

    /// Whether every storage node answered over gRPC, probed on first call
    pub async fn can_connect_grpc(&self) -> bool {
        *self
            .grpc_reachable
            .get_or_init(|| async move {
                match self.nodes.storage_node_addresses().await {
                    Ok(addresses) => self.grpc.can_connect(&addresses).await,
                    Err(e) => {
                        warn!(error = %e, "cannot enumerate storage nodes for the gRPC probe");
                        false
                    }
                }
            })
            .await
    }
}
