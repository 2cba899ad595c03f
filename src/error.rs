//! Error types for the Mayastor control-plane query layer
//!
//! Every backend (CRD, REST, CLI plugin) and the storage-node gRPC client
//! report failures through the one [`Error`] enum. Callers distinguish the
//! outcomes that matter to them through [`Error::is_not_found`],
//! [`Error::is_timeout`] and [`Error::is_transient`] instead of inspecting
//! message text.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the query layer
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{operation} is not supported by the {backend} control plane")]
    Unsupported { operation: String, backend: String },

    // =========================================================================
    // Cluster Discovery Errors
    // =========================================================================
    #[error("mayastor nodes not found")]
    NodesNotFound,

    #[error("restful control plane components are absent in namespace {namespace}")]
    ControlPlaneAbsent { namespace: String },

    #[error("node {node} lacks expected fields: {missing}")]
    NodeFields { node: String, missing: String },

    // =========================================================================
    // Resource Errors
    // =========================================================================
    #[error("{kind} {name} not found")]
    NotFound { kind: String, name: String },

    #[error("{kind} {name}: state not defined, got status=\"{state}\"")]
    StateNotDefined {
        kind: String,
        name: String,
        state: String,
    },

    #[error("volume {uuid}: invalid replica count {count}")]
    InvalidReplicaCount { uuid: String, count: i64 },

    #[error("volume {uuid}: nexus has no children")]
    MissingNexusChildren { uuid: String },

    #[error("{operation}: empty response from {target}")]
    EmptyResponse { operation: String, target: String },

    #[error("not all {kind} are healthy: {names}")]
    Unhealthy { kind: String, names: String },

    // =========================================================================
    // Convergence Errors
    // =========================================================================
    #[error("{what}: not reached within {}, last observed: {last}", humantime::format_duration(*.timeout))]
    ConvergenceTimeout {
        what: String,
        timeout: Duration,
        last: String,
    },

    #[error("{what}: unexpected state persisted, last observed: {last}")]
    UnexpectedState { what: String, last: String },

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("HTTP {status} from {url}: {body}")]
    Http { url: String, status: u16, body: String },

    #[error("request to {url} timed out, statusCode=408")]
    RequestTimeout { url: String },

    #[error("plugin command `{command}` failed: {output}")]
    Plugin { command: String, output: String },

    #[error("{operation} on {address}: context deadline exceeded")]
    DeadlineExceeded { operation: String, address: String },

    #[error("{operation} on {address} failed: {status}")]
    Grpc {
        operation: String,
        address: String,
        status: tonic::Status,
    },

    #[error("gRPC transport error: {0}")]
    GrpcTransport(#[from] tonic::transport::Error),

    #[error("{operation} failed on some nodes: {errors}")]
    Aggregate { operation: String, errors: String },

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] of the given kind
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// The resource is absent (expected after a delete, for example)
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Http { status, .. } => *status == 404,
            Error::Kube(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }

    /// The request did not complete in time
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::RequestTimeout { .. } | Error::DeadlineExceeded { .. } => true,
            Error::Http { status, .. } => *status == 408,
            Error::Reqwest(e) => e.is_timeout(),
            Error::Grpc { status, .. } => status.code() == tonic::Code::DeadlineExceeded,
            _ => false,
        }
    }

    /// Check if this error is transient, ie a later attempt may succeed
    pub fn is_transient(&self) -> bool {
        if self.is_timeout() {
            return true;
        }
        match self {
            Error::Reqwest(e) => e.is_connect() || e.is_request(),
            Error::Http { status, .. } => *status >= 500,
            Error::Grpc { status, .. } => matches!(
                status.code(),
                tonic::Code::Unavailable | tonic::Code::Aborted | tonic::Code::ResourceExhausted
            ),
            Error::Kube(kube::Error::Api(response)) => response.code >= 500,
            Error::Kube(kube::Error::Service(_)) | Error::Kube(kube::Error::HyperError(_)) => true,
            Error::Plugin { output, .. } => PLUGIN_TRANSPORT_FAILURES
                .iter()
                .any(|pattern| output.contains(pattern)),
            Error::GrpcTransport(_) | Error::Aggregate { .. } | Error::NodesNotFound => true,
            _ => false,
        }
    }
}

/// Plugin output when the REST endpoint could not be reached or did not answer
const PLUGIN_TRANSPORT_FAILURES: [&str; 4] = [
    "Connection refused",
    "error sending request",
    "Request Timeout",
    "request timed out",
];

/// Result type alias for the query layer
pub type Result<T> = std::result::Result<T, Error>;
