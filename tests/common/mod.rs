//! In-process stand-in for the control plane REST service

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use mayastor_cp_query::cluster::StaticNodeAddresses;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Address with nothing listening on the mock's port
pub const DEAD_NODE: &str = "127.0.0.2";
pub const LIVE_NODE: &str = "127.0.0.1";

/// Pool name the mock answers with HTTP 408
pub const SLOW_POOL: &str = "slow";

#[derive(Default)]
pub struct MockState {
    pub volumes: Mutex<BTreeMap<String, Value>>,
    pub replicas: BTreeMap<String, Value>,
    pub pools: Vec<Value>,
    pub nodes: Vec<Value>,
    pub replica_counts: Mutex<Vec<(String, u32)>>,
}

type Shared = Arc<MockState>;

async fn list_volumes(State(state): State<Shared>) -> Json<Value> {
    let volumes = state.volumes.lock().unwrap();
    Json(Value::Array(volumes.values().cloned().collect()))
}

async fn get_volume(
    State(state): State<Shared>,
    Path(uuid): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let volumes = state.volumes.lock().unwrap();
    volumes.get(&uuid).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_volume(State(state): State<Shared>, Path(uuid): Path<String>) -> StatusCode {
    match state.volumes.lock().unwrap().remove(&uuid) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn set_replica_count(
    State(state): State<Shared>,
    Path((uuid, count)): Path<(String, u32)>,
) -> StatusCode {
    if !state.volumes.lock().unwrap().contains_key(&uuid) {
        return StatusCode::NOT_FOUND;
    }
    state.replica_counts.lock().unwrap().push((uuid, count));
    StatusCode::OK
}

async fn get_replica(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    state.replicas.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn list_pools(State(state): State<Shared>) -> Json<Value> {
    // Paginated shape, the adapter accepts both
    Json(json!({ "entries": state.pools }))
}

async fn get_pool(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    if id == SLOW_POOL {
        return Err(StatusCode::REQUEST_TIMEOUT);
    }
    state
        .pools
        .iter()
        .find(|p| p["id"] == id.as_str())
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn list_nodes(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(state.nodes.clone()))
}

/// Serve `state` on an ephemeral port of the loopback address, returning
/// the port
pub async fn serve(state: Shared) -> u16 {
    let app = Router::new()
        .route("/v0/volumes", get(list_volumes))
        .route("/v0/volumes/:uuid", get(get_volume).delete(delete_volume))
        .route("/v0/volumes/:uuid/replica_count/:count", put(set_replica_count))
        .route("/v0/replicas/:id", get(get_replica))
        .route("/v0/pools", get(list_pools))
        .route("/v0/pools/:id", get(get_pool))
        .route("/v0/nodes", get(list_nodes))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind((LIVE_NODE, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

/// The dead node first, so every query exercises failover
pub fn node_addresses() -> Arc<StaticNodeAddresses> {
    Arc::new(StaticNodeAddresses::new(vec![
        DEAD_NODE.to_string(),
        LIVE_NODE.to_string(),
    ]))
}

// =============================================================================
// Fixtures
// =============================================================================

/// A published two-replica volume, healthy
pub fn volume(uuid: &str) -> Value {
    json!({
        "spec": {
            "num_replicas": 2,
            "size": 1073741824,
            "status": "Created",
            "target": { "protocol": "nvmf", "node": "node-1" },
            "uuid": uuid
        },
        "state": {
            "target": {
                "children": [
                    { "state": "Online", "uri": "bdev:///r1?uuid=r1" },
                    { "state": "Online", "uri": "nvmf://10.0.0.2:8420/nqn.2019-05.io.openebs:r2" }
                ],
                "deviceUri": format!("nvmf://10.0.0.1:8420/nqn.2019-05.io.openebs:{}", uuid),
                "node": "node-1",
                "rebuilds": 0,
                "protocol": "nvmf",
                "size": 1073741824,
                "state": "Online",
                "uuid": uuid
            },
            "size": 1073741824,
            "status": "Online",
            "uuid": uuid,
            "replica_topology": {
                "r1": { "node": "node-1", "pool": "pool-1", "state": "Online" },
                "r2": { "node": "node-2", "pool": "pool-2", "state": "Online" }
            }
        }
    })
}

/// A volume the control plane has accepted but not yet created
pub fn creating_volume(uuid: &str) -> Value {
    json!({
        "spec": { "num_replicas": 1, "size": 1048576, "status": "Creating", "uuid": uuid },
        "state": { "size": 0, "status": "Online", "uuid": uuid }
    })
}

pub fn replica(id: &str, pool: &str) -> Value {
    json!({
        "node": "node-1",
        "pool": pool,
        "share": "none",
        "size": 1073741824,
        "state": "Online",
        "thin": false,
        "uri": format!("bdev:///{}?uuid={}", id, id),
        "uuid": id
    })
}

pub fn pool(id: &str, node: &str, status: &str) -> Value {
    json!({
        "id": id,
        "spec": { "disks": ["/dev/sdb"], "id": id, "node": node, "status": "Created" },
        "state": {
            "capacity": 10737418240_i64,
            "disks": ["aio:///dev/sdb"],
            "id": id,
            "node": node,
            "status": status,
            "used": 2147483648_i64
        }
    })
}

pub fn node(id: &str, address: &str) -> Value {
    json!({
        "id": id,
        "spec": { "grpcEndpoint": format!("{}:10124", address), "id": id },
        "state": { "grpcEndpoint": format!("{}:10124", address), "id": id, "status": "Online" }
    })
}

/// Volume `vol-1` with replica `r1` known and `r2` gone, two pools, two nodes
pub fn cluster() -> Shared {
    let mut volumes = BTreeMap::new();
    volumes.insert("vol-1".to_string(), volume("vol-1"));
    volumes.insert("vol-new".to_string(), creating_volume("vol-new"));

    let mut replicas = BTreeMap::new();
    replicas.insert("r1".to_string(), replica("r1", "pool-1"));

    Arc::new(MockState {
        volumes: Mutex::new(volumes),
        replicas,
        pools: vec![
            pool("pool-1", "node-1", "Online"),
            pool("pool-2", "node-2", "Online"),
        ],
        nodes: vec![node("node-1", "10.0.0.1"), node("node-2", "10.0.0.2")],
        replica_counts: Mutex::new(Vec::new()),
    })
}
