//! # CLI Interface
//!
//! Defines the command-line argument structure for `kasgate-node` using
//! `clap` derive. Every `run` option can also come from the environment,
//! which is how the gateway is normally configured in a container.

use clap::{Parser, Subcommand, ValueEnum};

use crate::logging::LogFormat;

/// KasGate payment gateway.
///
/// Serves a small HTTP API that validates Kaspa addresses, reports
/// balances and UTXOs, and builds, signs and broadcasts payments through a
/// Kaspa REST indexer. Exposes Prometheus metrics on a separate port.
#[derive(Parser, Debug)]
#[command(
    name = "kasgate-node",
    about = "KasGate Kaspa payment gateway",
    version,
    propagate_version = true
)]
pub struct KasGateCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway.
    Run(RunArgs),
    /// Derive the address of a private key, or generate a fresh key.
    Address(AddressArgs),
    /// Print version information and exit.
    Version,
}

/// Networks the gateway can be bound to.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Simnet,
    Devnet,
}

impl From<Network> for kasgate_protocol::address::Prefix {
    fn from(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::Mainnet,
            Network::Testnet => Self::Testnet,
            Network::Simnet => Self::Simnet,
            Network::Devnet => Self::Devnet,
        }
    }
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the HTTP API.
    #[arg(long, env = "KASGATE_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "KASGATE_METRICS_PORT", default_value_t = 9100)]
    pub metrics_port: u16,

    /// Base URL of the Kaspa REST indexer.
    #[arg(long, env = "KASGATE_API_URL", default_value = kasgate_protocol::config::DEFAULT_INDEXER_URL)]
    pub api_url: String,

    /// Network whose addresses the gateway accepts.
    #[arg(long, env = "KASGATE_NETWORK", value_enum, default_value_t = Network::Mainnet)]
    pub network: Network,

    /// Per-request timeout towards the indexer, in seconds.
    #[arg(long, env = "KASGATE_UPSTREAM_TIMEOUT_SECS", default_value_t = 15)]
    pub upstream_timeout_secs: u64,

    /// Hex-encoded private key used when a send request carries none.
    ///
    /// **Never pass this flag on a shared machine**: use the environment
    /// variable from a secret store instead.
    #[arg(long, env = "KASGATE_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Log output format.
    #[arg(long, env = "KASGATE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default log directive when `RUST_LOG` is not set.
    #[arg(long, default_value = "kasgate_node=info,kasgate_protocol=info,tower_http=info")]
    pub log_level: String,
}

/// Arguments for the `address` subcommand.
#[derive(Parser, Debug)]
pub struct AddressArgs {
    /// Hex-encoded private key. A new key is generated when omitted.
    #[arg(long, env = "KASGATE_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Network prefix to render the address for.
    #[arg(long, value_enum, default_value_t = Network::Mainnet)]
    pub network: Network,
}
