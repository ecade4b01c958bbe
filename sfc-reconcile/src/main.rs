//! sfcctl: reconcile OpenStack networking-sfc resources to a declared state.
//!
//! Each invocation handles one resource:
//! - Resolves the names of referenced ports, port pairs, groups and classifiers
//! - Reads the live resource by name
//! - Creates, updates or deletes it (or reports what it would do with --check)
//! - Prints the outcome as JSON or a table and exits non-zero on failure

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sfc_reconcile::config::DEFAULT_TIMEOUT_SECS;
use sfc_reconcile::output::{failure_json, result_json, result_table};
use sfc_reconcile::{
    ApplyResult, CloudConfig, DesiredState, NeutronStore, ResourceKind, SfcReconciler,
    TargetState,
};

/// Reconcile OpenStack networking-sfc resources
#[derive(Parser, Debug)]
#[command(name = "sfcctl", version, about)]
struct Cli {
    /// Neutron endpoint (e.g., https://controller:9696)
    #[arg(long, env = "OS_NETWORK_ENDPOINT")]
    endpoint: Option<String>,

    /// Keystone token sent as X-Auth-Token
    #[arg(long, env = "OS_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Only report whether a change would be made
    #[arg(long)]
    check: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

// Options shared by every resource kind
#[derive(Args, Debug)]
struct Common {
    /// Resource name, used to find an existing resource
    #[arg(short, long)]
    name: Option<String>,

    /// Description
    #[arg(long)]
    description: Option<String>,

    /// Desired state: present or absent
    #[arg(long, default_value = "present")]
    state: TargetState,
}

impl Common {
    fn into_desired(self) -> (TargetState, DesiredState) {
        let mut desired = match self.name {
            Some(name) => DesiredState::named(name),
            None => DesiredState::new(),
        };
        desired.set("description", self.description);
        (self.state, desired)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ensure a flow classifier is present or absent
    FlowClassifier {
        #[command(flatten)]
        common: Common,

        /// L2 ethertype
        #[arg(long, value_parser = ["IPv4", "IPv6"])]
        ethertype: Option<String>,

        /// IP protocol name (e.g., tcp)
        #[arg(long)]
        protocol: Option<String>,

        /// Minimum source protocol port
        #[arg(long)]
        source_port_range_min: Option<u16>,

        /// Maximum source protocol port
        #[arg(long)]
        source_port_range_max: Option<u16>,

        /// Minimum destination protocol port
        #[arg(long)]
        destination_port_range_min: Option<u16>,

        /// Maximum destination protocol port
        #[arg(long)]
        destination_port_range_max: Option<u16>,

        /// Source IPv4 or IPv6 prefix
        #[arg(long)]
        source_ip_prefix: Option<String>,

        /// Destination IPv4 or IPv6 prefix
        #[arg(long)]
        destination_ip_prefix: Option<String>,

        /// Neutron source port (name or ID)
        #[arg(long)]
        logical_source_port: Option<String>,

        /// Neutron destination port (name or ID)
        #[arg(long)]
        logical_destination_port: Option<String>,

        /// L7 parameter (repeatable)
        #[arg(long = "l7-parameter", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        l7_parameters: Vec<(String, Value)>,
    },

    /// Ensure a port pair is present or absent
    PortPair {
        #[command(flatten)]
        common: Common,

        /// Ingress port (name or ID)
        #[arg(long)]
        ingress: Option<String>,

        /// Egress port (name or ID)
        #[arg(long)]
        egress: Option<String>,

        /// Service function parameter, e.g. correlation=nsh (repeatable)
        #[arg(long = "service-function-parameter", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        service_function_parameters: Vec<(String, Value)>,
    },

    /// Ensure a port pair group is present or absent
    PortPairGroup {
        #[command(flatten)]
        common: Common,

        /// Port pairs (names or IDs, repeatable or comma separated)
        #[arg(long = "port-pair", value_delimiter = ',')]
        port_pairs: Vec<String>,

        /// Port pair group parameter (repeatable)
        #[arg(long = "port-pair-group-parameter", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        port_pair_group_parameters: Vec<(String, Value)>,
    },

    /// Ensure a port chain is present or absent
    PortChain {
        #[command(flatten)]
        common: Common,

        /// Port pair groups in chain order (names or IDs)
        #[arg(long = "port-pair-group", value_delimiter = ',')]
        port_pair_groups: Vec<String>,

        /// Flow classifiers (names or IDs)
        #[arg(long = "flow-classifier", value_delimiter = ',')]
        flow_classifiers: Vec<String>,

        /// Data-plane chain path ID
        #[arg(long)]
        chain_id: Option<u32>,

        /// Chain parameter, e.g. correlation=mpls (repeatable)
        #[arg(long = "chain-parameter", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        chain_parameters: Vec<(String, Value)>,
    },
}

impl Commands {
    fn into_desired(self) -> (ResourceKind, TargetState, DesiredState) {
        match self {
            Commands::FlowClassifier {
                common,
                ethertype,
                protocol,
                source_port_range_min,
                source_port_range_max,
                destination_port_range_min,
                destination_port_range_max,
                source_ip_prefix,
                destination_ip_prefix,
                logical_source_port,
                logical_destination_port,
                l7_parameters,
            } => {
                let (state, mut desired) = common.into_desired();
                desired.set("ethertype", ethertype);
                desired.set("protocol", protocol);
                desired.set("source_port_range_min", source_port_range_min);
                desired.set("source_port_range_max", source_port_range_max);
                desired.set("destination_port_range_min", destination_port_range_min);
                desired.set("destination_port_range_max", destination_port_range_max);
                desired.set("source_ip_prefix", source_ip_prefix);
                desired.set("destination_ip_prefix", destination_ip_prefix);
                desired.set("logical_source_port", logical_source_port);
                desired.set("logical_destination_port", logical_destination_port);
                desired.set("l7_parameters", dict(l7_parameters));
                (ResourceKind::FlowClassifier, state, desired)
            }
            Commands::PortPair {
                common,
                ingress,
                egress,
                service_function_parameters,
            } => {
                let (state, mut desired) = common.into_desired();
                desired.set("ingress", ingress);
                desired.set("egress", egress);
                desired.set(
                    "service_function_parameters",
                    dict(service_function_parameters),
                );
                (ResourceKind::PortPair, state, desired)
            }
            Commands::PortPairGroup {
                common,
                port_pairs,
                port_pair_group_parameters,
            } => {
                let (state, mut desired) = common.into_desired();
                desired.set("port_pairs", list(port_pairs));
                desired.set(
                    "port_pair_group_parameters",
                    dict(port_pair_group_parameters),
                );
                (ResourceKind::PortPairGroup, state, desired)
            }
            Commands::PortChain {
                common,
                port_pair_groups,
                flow_classifiers,
                chain_id,
                chain_parameters,
            } => {
                let (state, mut desired) = common.into_desired();
                desired.set("port_pair_groups", list(port_pair_groups));
                desired.set("flow_classifiers", list(flow_classifiers));
                desired.set("chain_id", chain_id);
                desired.set("chain_parameters", dict(chain_parameters));
                (ResourceKind::PortChain, state, desired)
            }
        }
    }
}

/// Parse `KEY=VALUE`; the value is JSON when it parses as JSON, else a string.
fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn dict(pairs: Vec<(String, Value)>) -> Option<Value> {
    if pairs.is_empty() {
        return None;
    }
    Some(Value::Object(pairs.into_iter().collect::<Map<_, _>>()))
}

fn list(items: Vec<String>) -> Option<Vec<String>> {
    let items: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

async fn run(cli: Cli) -> Result<(ResourceKind, ApplyResult)> {
    let config = CloudConfig::new(cli.endpoint.as_deref(), cli.token, cli.timeout)?;
    let store = NeutronStore::new(&config)
        .map_err(|e| anyhow!("failed to set up Neutron client: {e}"))?;
    let reconciler = SfcReconciler::new(Arc::new(store));

    let (kind, target, desired) = cli.command.into_desired();
    let result = reconciler.apply(kind, &desired, target, cli.check).await?;
    Ok((kind, result))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only the result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sfcctl=info,sfc_reconcile=info,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let output = cli.output;

    match run(cli).await {
        Ok((kind, result)) => {
            match output {
                OutputFormat::Json => println!("{}", result_json(kind, &result)),
                OutputFormat::Table => println!("{}", result_table(&result)),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            match output {
                OutputFormat::Json => println!("{}", failure_json(&e.to_string())),
                OutputFormat::Table => eprintln!("error: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}
