//! Control plane component probing

use crate::domain::ports::ComponentProbe;
use crate::error::Result;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use kube::api::Api;
use kube::Client;
use tracing::debug;

/// Looks a component up as a Deployment, then as a StatefulSet
pub struct KubeComponentProbe {
    client: Client,
}

impl KubeComponentProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ComponentProbe for KubeComponentProbe {
    async fn component_exists(&self, namespace: &str, name: &str) -> Result<bool> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        if deployments.get_opt(name).await?.is_some() {
            debug!(namespace, name, "found component deployment");
            return Ok(true);
        }

        let statefulsets: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        if statefulsets.get_opt(name).await?.is_some() {
            debug!(namespace, name, "found component statefulset");
            return Ok(true);
        }

        Ok(false)
    }
}

/// A fixed set of component names, for clusters reached without
/// Kubernetes access
#[derive(Debug, Clone, Default)]
pub struct StaticComponentProbe {
    present: Vec<String>,
}

impl StaticComponentProbe {
    pub fn new(present: Vec<String>) -> Self {
        Self { present }
    }
}

#[async_trait]
impl ComponentProbe for StaticComponentProbe {
    async fn component_exists(&self, _namespace: &str, name: &str) -> Result<bool> {
        Ok(self.present.iter().any(|p| p == name))
    }
}
