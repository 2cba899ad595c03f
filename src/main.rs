//! Mayastor Control Plane Query CLI
//!
//! Resolves the deployed Mayastor control plane and prints what it
//! reports, as JSON. Useful for inspecting a cluster under test with the
//! same code paths the test suites use.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mayastor_cp_query::cluster::{StaticComponentProbe, StaticNodeAddresses};
use mayastor_cp_query::reconcile::{self, PollSettings};
use mayastor_cp_query::{
    ControlPlaneBackend, ControlPlaneClient, ControlPlaneConfig, ControlPlaneVersion,
    NodeAddressProvider, NodeDirectory, PoolDirectory, RestClientKind, VolumeDirectory,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Query the Mayastor control plane of a cluster under test
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (YAML)
    #[arg(long, env = "MAYASTOR_CP_CONFIG")]
    config: Option<PathBuf>,

    /// Mayastor namespace
    #[arg(long, env = "MAYASTOR_NAMESPACE")]
    namespace: Option<String>,

    /// Skip detection and use this control plane generation
    #[arg(long, env = "MAYASTOR_CONTROL_PLANE", value_enum)]
    control_plane: Option<VersionArg>,

    /// REST client flavour
    #[arg(long, env = "MAYASTOR_REST_CLIENT", value_enum)]
    rest_client: Option<ClientArg>,

    /// Node addresses to query instead of the Kubernetes node list
    #[arg(long, env = "MAYASTOR_NODES", value_delimiter = ',')]
    nodes: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the resolved control plane generation
    Version,
    /// List volumes, or show one
    Volumes { uuid: Option<String> },
    /// List pools
    Pools,
    /// List Mayastor nodes
    Nodes,
    /// List the nexuses of every storage node over gRPC
    Nexuses,
    /// Wait for a volume to reach a state (healthy by default)
    WaitVolume {
        uuid: String,

        /// Target state, spelled as the control plane reports it
        #[arg(long)]
        state: Option<String>,

        #[arg(long, default_value = "2m")]
        timeout: humantime::Duration,

        #[arg(long, default_value = "5s")]
        interval: humantime::Duration,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum VersionArg {
    Crd,
    Rest,
}

impl From<VersionArg> for ControlPlaneVersion {
    fn from(arg: VersionArg) -> Self {
        match arg {
            VersionArg::Crd => ControlPlaneVersion::Crd,
            VersionArg::Rest => ControlPlaneVersion::Rest,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ClientArg {
    Openapi,
    Plugin,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    let config = load_config(&args)?;
    info!("Starting {} {}", mayastor_cp_query::NAME, mayastor_cp_query::VERSION);
    info!("  Namespace: {}", config.namespace);

    let client = build_client(&args, config).await?;

    match &args.command {
        Command::Version => {
            let version = client.check_and_set_control_plane().await?;
            let backend = client.control_plane().await?;
            print_json(&json!({
                "controlPlane": version,
                "version": version.version(),
                "majorVersion": version.major_version(),
                "backend": backend.backend_name(),
                "grpcReachable": client.can_connect_grpc().await,
            }))?;
        }
        Command::Volumes { uuid: Some(uuid) } => {
            let backend = client.control_plane().await?;
            match backend.get_volume(uuid).await? {
                Some(volume) => print_json(&volume)?,
                None => print_json(&json!({ "name": uuid, "pending": true }))?,
            }
        }
        Command::Volumes { uuid: None } => {
            let backend = client.control_plane().await?;
            print_json(&backend.list_volumes().await?)?;
        }
        Command::Pools => {
            let backend = client.control_plane().await?;
            print_json(&backend.list_pools().await?)?;
        }
        Command::Nodes => {
            let backend = client.control_plane().await?;
            print_json(&backend.list_nodes().await?)?;
        }
        Command::Nexuses => {
            let addresses = client.nodes().storage_node_addresses().await?;
            let mut report = Vec::new();
            for address in &addresses {
                match client.grpc().list_nexuses(address).await {
                    Ok(nexuses) => report.extend(nexuses.iter().map(|n| {
                        json!({
                            "node": address,
                            "uuid": n.uuid,
                            "state": format!("{:?}", n.state()),
                            "deviceUri": n.device_uri,
                            "rebuilds": n.rebuilds,
                            "children": n.children.iter().map(|c| json!({
                                "uri": c.uri,
                                "state": format!("{:?}", c.state()),
                                "rebuildProgress": c.rebuild_progress,
                            })).collect::<Vec<_>>(),
                        })
                    })),
                    Err(e) => warn!(address = %address, error = %e, "cannot list nexuses"),
                }
            }
            print_json(&report)?;
        }
        Command::WaitVolume {
            uuid,
            state,
            timeout,
            interval,
        } => {
            let backend = client.control_plane().await?;
            let settings = PollSettings::new((*timeout).into(), (*interval).into());
            let target = match state {
                Some(state) => state.clone(),
                None => backend.vocabulary().vol_state_healthy().to_string(),
            };
            reconcile::wait_for_volume_state(backend.as_ref(), uuid, &target, &settings).await?;
            print_json(&json!({ "name": uuid, "state": target }))?;
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<ControlPlaneConfig> {
    let mut config = match &args.config {
        Some(path) => ControlPlaneConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ControlPlaneConfig::default(),
    };
    if let Some(namespace) = &args.namespace {
        config.namespace = namespace.clone();
    }
    match args.rest_client {
        Some(ClientArg::Openapi) => config.rest.client = RestClientKind::OpenApi,
        Some(ClientArg::Plugin) => config.rest.client = RestClientKind::Plugin,
        None => {}
    }
    config.validate()?;
    Ok(config)
}

async fn build_client(args: &Args, config: ControlPlaneConfig) -> anyhow::Result<ControlPlaneClient> {
    if args.nodes.is_empty() {
        let client = ControlPlaneClient::connect(config).await?;
        return Ok(match args.control_plane {
            Some(version) => client.with_version(version.into()),
            None => client,
        });
    }

    // Without Kubernetes access the generation cannot be probed
    let Some(version) = args.control_plane else {
        bail!("--control-plane is required together with --nodes");
    };
    let kube = match kube::Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "no Kubernetes access, CRD queries unavailable");
            None
        }
    };
    let nodes = Arc::new(StaticNodeAddresses::new(args.nodes.clone()));
    let probe = Arc::new(StaticComponentProbe::default());
    Ok(ControlPlaneClient::new(config, kube, probe, nodes).with_version(version.into()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "kube=info", "tower=warn", "h2=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Logs go to stderr, stdout carries the JSON report
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
