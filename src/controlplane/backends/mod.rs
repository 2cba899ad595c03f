//! Control Plane Wire Adapters
//!
//! Provides adapters for the two control-plane generations:
//! - CRD: MayastorVolume/Pool/Node custom resources (moac)
//! - REST: the core agent's OpenAPI service, over HTTP or through the
//!   kubectl plugin

pub mod crd;
pub mod plugin;
pub mod rest;
pub mod wire;

pub use crd::*;
pub use plugin::*;
pub use rest::*;

use crate::controlplane::config::{ControlPlaneConfig, RestClientKind};
use crate::domain::ports::{ControlPlane, NodeAddressProvider};
use crate::domain::vocabulary::ControlPlaneVersion;
use crate::error::{Error, Result};
use kube::Client;
use std::sync::Arc;
use tracing::info;

/// Factory for creating control plane adapters
pub struct BackendFactory;

impl BackendFactory {
    /// Create the adapter serving a resolved control-plane generation
    pub fn create(
        version: ControlPlaneVersion,
        config: &ControlPlaneConfig,
        kube: Option<Client>,
        nodes: Arc<dyn NodeAddressProvider>,
    ) -> Result<Arc<dyn ControlPlane>> {
        let backend: Arc<dyn ControlPlane> = match (version, config.rest.client) {
            (ControlPlaneVersion::Crd, _) => {
                let client = kube.ok_or_else(|| {
                    Error::Configuration(
                        "the CRD control plane needs Kubernetes API access".into(),
                    )
                })?;
                Arc::new(CrdControlPlane::new(client, config.namespace.clone()))
            }
            (ControlPlaneVersion::Rest, RestClientKind::OpenApi) => {
                Arc::new(RestControlPlane::new(config.rest.clone(), nodes)?)
            }
            (ControlPlaneVersion::Rest, RestClientKind::Plugin) => Arc::new(
                PluginControlPlane::new(config.plugin.clone(), config.rest.clone(), nodes)?,
            ),
        };

        info!("Using {} control plane adapter for {}", backend.backend_name(), version);
        Ok(backend)
    }
}
