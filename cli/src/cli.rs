//! # CLI Interface
//!
//! Defines the command-line argument structure for `tickcast` using `clap`
//! derive. Connection flags are global and fall back to `TICKCAST_*`
//! environment variables.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt;
use std::time::Duration;

use tickcast_client::config::{
    RestConfig, RpcConfig, DEFAULT_LEAD_TICKS, DEFAULT_REST_URL, DEFAULT_RPC_ADDRESS,
};

use crate::logging::LogFormat;

/// Tick-synchronized transfers from the command line.
///
/// Builds and signs a transfer locally, broadcasts it through the archive's
/// REST or binary RPC interface, and follows it until it is included in its
/// target tick or the tick passes without it.
#[derive(Parser, Debug)]
#[command(
    name = "tickcast",
    about = "Tick-synchronized ledger transfers",
    version,
    propagate_version = true
)]
pub struct TickcastCli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Which archive interface to talk to.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// JSON over HTTP.
    Rest,
    /// Length-prefixed frames over TCP.
    Rpc,
}

/// Endpoint selection, shared by every subcommand.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Archive interface.
    #[arg(long, global = true, value_enum, env = "TICKCAST_TRANSPORT", default_value_t = TransportKind::Rest)]
    pub transport: TransportKind,

    /// REST archive base URL.
    #[arg(long, global = true, env = "TICKCAST_REST_URL", default_value = DEFAULT_REST_URL)]
    pub rest_url: String,

    /// RPC archive address (`host:port`).
    #[arg(long, global = true, env = "TICKCAST_RPC_ADDRESS", default_value = DEFAULT_RPC_ADDRESS)]
    pub rpc_address: String,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "TICKCAST_TIMEOUT_SECS", default_value_t = 5)]
    pub timeout_secs: u64,

    /// Log output format.
    #[arg(long, global = true, value_enum, env = "TICKCAST_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl ConnectionArgs {
    pub fn rest_config(&self) -> RestConfig {
        RestConfig {
            base_url: self.rest_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            address: self.rpc_address.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the identity that belongs to a seed.
    Identity(SeedArgs),
    /// Print the archive status as JSON.
    Status,
    /// Print the network's latest tick.
    LatestTick,
    /// Print the transactions confirmed in a tick as JSON.
    TickTransactions(TickTransactionsArgs),
    /// Look up one archived transaction by ID (REST only).
    Transaction(TransactionArgs),
    /// Sign, broadcast and follow a transfer.
    Send(SendArgs),
    /// Print version information and exit.
    Version,
}

/// Where the secret seed comes from.
#[derive(Args)]
pub struct SeedArgs {
    /// 55-letter lowercase seed. Prefer the environment variable; flags end
    /// up in shell history.
    #[arg(long, env = "TICKCAST_SEED", hide_env_values = true)]
    pub seed: String,
}

impl fmt::Debug for SeedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SeedArgs(<redacted>)")
    }
}

/// Arguments for `tick-transactions`.
#[derive(Args, Debug)]
pub struct TickTransactionsArgs {
    /// Tick number.
    pub tick: u32,

    /// Include non-transfer transactions (contract calls and the like).
    #[arg(long)]
    pub all: bool,
}

/// Arguments for `transaction`.
#[derive(Args, Debug)]
pub struct TransactionArgs {
    /// 60-letter lowercase transaction ID.
    pub tx_id: String,
}

/// Arguments for `send`.
#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub seed: SeedArgs,

    /// Destination identity (60 uppercase letters).
    #[arg(long)]
    pub dest: String,

    /// Amount in the ledger's smallest unit.
    #[arg(long)]
    pub amount: i64,

    /// Ticks between the current tick and the target tick.
    #[arg(long, env = "TICKCAST_LEAD_TICKS", default_value_t = DEFAULT_LEAD_TICKS)]
    pub lead_ticks: u32,

    /// Seconds between two inclusion polls.
    #[arg(long, env = "TICKCAST_POLL_INTERVAL_SECS", default_value_t = 2)]
    pub poll_interval_secs: u64,

    /// Print Prometheus metrics to stderr when the submission ends.
    #[arg(long)]
    pub print_metrics: bool,
}
