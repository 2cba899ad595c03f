//! Storage node gRPC client
//!
//! Unary calls against the `mayastor.Mayastor` service every storage node
//! exposes. Each call dials the node, is bounded by the configured
//! deadline, and reports a missed deadline as the terse
//! [`Error::DeadlineExceeded`] rather than the full transport status.
//!
//! Multi-node helpers gather per-node inventories: every node is asked,
//! successes are kept, and failures are reported together.

use crate::controlplane::config::{GrpcConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::grpc::proto::{
    FaultNexusChildRequest, ListNexusV2Reply, ListNvmeControllersResponse, ListPoolsReply,
    ListReplicasReply, MayastorInfoResponse, NexusV2, Null, NvmeController, Pool, Replica,
};
use backoff::ExponentialBackoffBuilder;
use std::future::Future;
use std::time::Duration;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info, warn};

const LIST_POOLS: &str = "/mayastor.Mayastor/ListPools";
const LIST_REPLICAS: &str = "/mayastor.Mayastor/ListReplicas";
const LIST_NEXUS_V2: &str = "/mayastor.Mayastor/ListNexusV2";
const FAULT_NEXUS_CHILD: &str = "/mayastor.Mayastor/FaultNexusChild";
const LIST_NVME_CONTROLLERS: &str = "/mayastor.Mayastor/ListNvmeControllers";
const GET_MAYASTOR_INFO: &str = "/mayastor.Mayastor/GetMayastorInfo";

// =============================================================================
// Gathered Results
// =============================================================================

/// Items collected from several nodes plus the per-node failures
#[derive(Debug, Default)]
pub struct Gathered<T> {
    pub items: Vec<T>,
    pub errors: Vec<Error>,
}

impl<T> Gathered<T> {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// All items, or one error naming every node that failed
    pub fn into_result(self, operation: &str) -> Result<Vec<T>> {
        if self.errors.is_empty() {
            return Ok(self.items);
        }
        Err(Error::Aggregate {
            operation: operation.to_string(),
            errors: self
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(";"),
        })
    }
}

/// Run `op` against every address in turn
pub async fn gather<T, F, Fut>(addresses: &[String], mut op: F) -> Gathered<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut gathered = Gathered {
        items: Vec::new(),
        errors: Vec::new(),
    };
    for address in addresses {
        match op(address.clone()).await {
            Ok(mut items) => gathered.items.append(&mut items),
            Err(e) => {
                debug!(address = %address, error = %e, "node did not answer");
                gathered.errors.push(e);
            }
        }
    }
    gathered
}

// =============================================================================
// Storage Node Client
// =============================================================================

/// Client for the storage node gRPC service
#[derive(Debug, Clone)]
pub struct StorageNodeClient {
    config: GrpcConfig,
}

impl StorageNodeClient {
    pub fn new(config: GrpcConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GrpcConfig {
        &self.config
    }

    fn map_status(operation: &str, address: &str, status: tonic::Status) -> Error {
        if status.code() == tonic::Code::DeadlineExceeded {
            Error::DeadlineExceeded {
                operation: operation.to_string(),
                address: address.to_string(),
            }
        } else {
            Error::Grpc {
                operation: operation.to_string(),
                address: address.to_string(),
                status,
            }
        }
    }

    async fn connect(&self, address: &str) -> Result<Channel> {
        let endpoint = Endpoint::from_shared(format!("http://{}:{}", address, self.config.port))?
            .connect_timeout(self.config.deadline())
            .timeout(self.config.deadline());
        Ok(endpoint.connect().await?)
    }

    async fn call<Req, Resp>(&self, address: &str, path: &'static str, message: Req) -> Result<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let name = path.rsplit('/').next().unwrap_or(path);
        let exchange = async {
            let channel = self.connect(address).await?;
            let mut grpc = tonic::client::Grpc::new(channel);
            grpc.ready().await?;

            let mut request = tonic::Request::new(message);
            request.set_timeout(self.config.deadline());
            let codec: ProstCodec<Req, Resp> = ProstCodec::default();
            grpc.unary(request, PathAndQuery::from_static(path), codec)
                .await
                .map(tonic::Response::into_inner)
                .map_err(|status| Self::map_status(name, address, status))
        };

        match tokio::time::timeout(self.config.deadline(), exchange).await {
            Ok(result) => result,
            Err(_) => Err(Error::DeadlineExceeded {
                operation: name.to_string(),
                address: address.to_string(),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Per-node calls
    // -------------------------------------------------------------------------

    /// Pools of one node, retried with backoff while the node misses its
    /// deadline
    pub async fn list_pools(&self, address: &str) -> Result<Vec<Pool>> {
        let retry = &self.config.retry;
        if retry.max_elapsed_secs == 0 {
            return self.list_pools_once(address).await;
        }

        backoff::future::retry(retry_policy(retry), || async move {
            self.list_pools_once(address).await.map_err(|e| match e {
                Error::DeadlineExceeded { .. } => {
                    warn!(address, "ListPools missed its deadline, backing off");
                    backoff::Error::transient(e)
                }
                other => backoff::Error::permanent(other),
            })
        })
        .await
    }

    async fn list_pools_once(&self, address: &str) -> Result<Vec<Pool>> {
        let reply: ListPoolsReply = self.call(address, LIST_POOLS, Null {}).await?;
        Ok(reply.pools)
    }

    /// One pool of one node, not-found when the node does not host it
    pub async fn get_pool(&self, name: &str, address: &str) -> Result<Pool> {
        self.list_pools(address)
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::not_found("pool", name))
    }

    pub async fn list_replicas(&self, address: &str) -> Result<Vec<Replica>> {
        let reply: ListReplicasReply = self
            .call(address, LIST_REPLICAS, Null {})
            .await?;
        Ok(reply.replicas)
    }

    pub async fn list_nexuses(&self, address: &str) -> Result<Vec<NexusV2>> {
        let reply: ListNexusV2Reply = self
            .call(address, LIST_NEXUS_V2, Null {})
            .await?;
        Ok(reply.nexus_list)
    }

    /// Mark one child of a nexus as faulted
    pub async fn fault_nexus_child(&self, address: &str, uuid: &str, uri: &str) -> Result<()> {
        info!("Faulting child {} of nexus {} on {}", uri, uuid, address);
        let request = FaultNexusChildRequest {
            uuid: uuid.to_string(),
            uri: uri.to_string(),
        };
        let _: Null = self
            .call(address, FAULT_NEXUS_CHILD, request)
            .await?;
        Ok(())
    }

    pub async fn list_nvme_controllers(&self, address: &str) -> Result<Vec<NvmeController>> {
        let reply: ListNvmeControllersResponse = self
            .call(address, LIST_NVME_CONTROLLERS, Null {})
            .await?;
        Ok(reply.controllers)
    }

    pub async fn get_mayastor_info(&self, address: &str) -> Result<MayastorInfoResponse> {
        self.call(address, GET_MAYASTOR_INFO, Null {})
            .await
    }

    // -------------------------------------------------------------------------
    // Multi-node gathering
    // -------------------------------------------------------------------------

    pub async fn gather_pools(&self, addresses: &[String]) -> Gathered<Pool> {
        gather(addresses, |address| async move { self.list_pools(&address).await }).await
    }

    /// Replicas of every node, ordered by pool
    pub async fn gather_replicas(&self, addresses: &[String]) -> Gathered<Replica> {
        let mut gathered =
            gather(addresses, |address| async move { self.list_replicas(&address).await }).await;
        gathered.items.sort_by(|a, b| a.pool.cmp(&b.pool));
        gathered
    }

    pub async fn gather_nexuses(&self, addresses: &[String]) -> Gathered<NexusV2> {
        gather(addresses, |address| async move { self.list_nexuses(&address).await }).await
    }

    pub async fn gather_nvme_controllers(&self, addresses: &[String]) -> Gathered<NvmeController> {
        gather(addresses, |address| async move {
            self.list_nvme_controllers(&address).await
        })
        .await
    }

    /// True when every address answers GetMayastorInfo
    pub async fn can_connect(&self, addresses: &[String]) -> bool {
        if addresses.is_empty() {
            return false;
        }
        for address in addresses {
            if let Err(e) = self.get_mayastor_info(address).await {
                warn!(address = %address, error = %e, "storage node unreachable over gRPC");
                return false;
            }
        }
        true
    }
}

fn retry_policy(retry: &RetryConfig) -> backoff::ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_secs(retry.initial_interval_secs))
        .with_multiplier(retry.multiplier)
        .with_randomization_factor(0.0)
        .with_max_interval(Duration::from_secs(retry.max_interval_secs))
        .with_max_elapsed_time(Some(Duration::from_secs(retry.max_elapsed_secs)))
        .build()
}
