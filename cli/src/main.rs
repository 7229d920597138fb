// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # tickcast
//!
//! Entry point for the `tickcast` binary. Parses CLI arguments, initializes
//! logging, builds the selected transport and runs one command.
//!
//! - `identity`         : derive the identity of a seed
//! - `status`           : archive status
//! - `latest-tick`      : the network's latest tick
//! - `tick-transactions`: transactions confirmed in a tick
//! - `transaction`      : one archived transaction (REST only)
//! - `send`             : sign, broadcast and follow a transfer
//! - `version`          : print build version information

mod cli;
mod logging;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use tickcast_client::config::{PollPolicy, SubmissionConfig, DEFAULT_LEAD_TICKS};
use tickcast_client::metrics::SubmissionMetrics;
use tickcast_client::submission::cancel_pair;
use tickcast_client::{
    BroadcastRegistry, Orchestrator, Outcome, RestTransport, RpcTransport, SourceAccount,
    SubmissionReport, Transport,
};

use cli::{Commands, ConnectionArgs, TickcastCli, TransportKind};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TickcastCli::parse();

    match cli.command {
        Commands::Version => {
            print_version();
            Ok(())
        }
        command => {
            logging::init_logging("tickcast=info,tickcast_client=info", cli.connection.log_format);
            run(command, &cli.connection).await
        }
    }
}

async fn run(command: Commands, connection: &ConnectionArgs) -> Result<()> {
    match command {
        Commands::Identity(args) => {
            let account = SourceAccount::from_seed(&args.seed).context("invalid seed")?;
            println!("{}", account.identity());
            Ok(())
        }
        Commands::Status => {
            let status = build_transport(connection)?
                .fetch_status()
                .await
                .context("failed to fetch archive status")?;
            print_json(&status)
        }
        Commands::LatestTick => {
            let tick = build_transport(connection)?
                .fetch_latest_tick()
                .await
                .context("failed to fetch latest tick")?;
            println!("{tick}");
            Ok(())
        }
        Commands::TickTransactions(args) => {
            let set = build_transport(connection)?
                .fetch_tick_transactions(args.tick, !args.all)
                .await
                .with_context(|| format!("failed to fetch transactions of tick {}", args.tick))?;
            print_json(&set)
        }
        Commands::Transaction(args) => {
            if connection.transport != TransportKind::Rest {
                bail!("transaction lookup is only available over REST");
            }
            let rest = RestTransport::new(connection.rest_config())
                .context("failed to build REST client")?;
            let record = rest
                .fetch_transaction(&args.tx_id)
                .await
                .with_context(|| format!("failed to fetch transaction {}", args.tx_id))?;
            print_json(&record)
        }
        Commands::Send(args) => send(connection, args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn build_transport(connection: &ConnectionArgs) -> Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match connection.transport {
        TransportKind::Rest => Arc::new(
            RestTransport::new(connection.rest_config()).context("failed to build REST client")?,
        ),
        TransportKind::Rpc => Arc::new(RpcTransport::new(connection.rpc_config())),
    };
    tracing::info!(
        transport = transport.name(),
        endpoint = transport.endpoint(),
        "archive transport ready"
    );
    Ok(transport)
}

/// Runs one submission to a terminal outcome. Ctrl+C or SIGTERM cancels it.
async fn send(connection: &ConnectionArgs, args: cli::SendArgs) -> Result<()> {
    let account = SourceAccount::from_seed(&args.seed.seed).context("invalid seed")?;
    let transport = build_transport(connection)?;
    let metrics = SubmissionMetrics::new().context("failed to register metrics")?;
    let config = SubmissionConfig {
        lead_ticks: args.lead_ticks,
        poll: PollPolicy {
            interval: Duration::from_secs(args.poll_interval_secs),
            ..PollPolicy::default()
        },
        ..SubmissionConfig::default()
    };
    tracing::info!(
        source = %account.identity(),
        destination = %args.dest,
        amount = args.amount,
        lead_ticks = config.lead_ticks,
        "submitting transfer"
    );

    let orchestrator = Orchestrator::new(
        transport,
        Arc::new(BroadcastRegistry::new()),
        account,
        config,
    )
    .with_metrics(metrics.clone());

    let (handle, cancel) = cancel_pair();
    let interrupt = tokio::spawn(async move {
        shutdown_signal().await;
        tracing::warn!("interrupt received, cancelling submission");
        handle.cancel();
    });
    let report = orchestrator.submit(&args.dest, args.amount, &cancel).await;
    interrupt.abort();

    print_json(&ReportView::from(&report))?;
    if args.print_metrics {
        eprintln!("{}", metrics.encode().context("failed to encode metrics")?);
    }

    match report.outcome {
        Outcome::Included { .. } => Ok(()),
        Outcome::Abandoned { tx_id, target_tick } => Err(anyhow!(
            "transaction {tx_id} was not included; tick {target_tick} passed without it"
        )),
        Outcome::Failed(error) => Err(anyhow::Error::new(error).context("submission failed")),
        Outcome::Cancelled => bail!("submission cancelled"),
    }
}

/// What `send` prints on stdout.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportView {
    id: String,
    outcome: &'static str,
    tx_id: Option<String>,
    target_tick: Option<u32>,
    peers_broadcasted: Option<u32>,
    states: Vec<String>,
}

impl From<&SubmissionReport> for ReportView {
    fn from(report: &SubmissionReport) -> Self {
        Self {
            id: report.id.to_string(),
            outcome: report.outcome.label(),
            tx_id: report.tx_id.map(|id| id.to_string()),
            target_tick: report.target_tick,
            peers_broadcasted: report.receipt.map(|r| r.peers_broadcasted),
            states: report.states.iter().map(ToString::to_string).collect(),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("tickcast    {}", env!("CARGO_PKG_VERSION"));
    println!("lead ticks  {}", DEFAULT_LEAD_TICKS);
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed, that signal is never reported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
