//! Shared fixtures for the integration tests.
//!
//! - JSON fixtures in the archive's REST shape, plus converters into the
//!   binary RPC message types, so both adapters can be fed the same data.
//! - A one-shot RPC server over a real TCP socket.
//! - [`ScriptedTransport`], an in-memory archive for driving submissions.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use tickcast_client::archive::{
    SkippedTickRange, Status, TickInfo, TickTransaction, TickTransactionSet, TransactionRecord,
};
use tickcast_client::transaction::{TickNumber, Transaction};
use tickcast_client::transport::rpc::wire::{
    read_frame, write_frame, Reply, Request, WireEpochIntervals, WireInterval, WireSkippedTicks,
    WireStatus, WireTickInfo, WireTickTransaction, WireTickTransactions, WireTransaction,
};
use tickcast_client::transport::{BroadcastReceipt, Transport, TransportError};

pub const SEED: &str = "jvhbyzjinlyutyuhsweuxiwootqoevjqwqmdhjeohrytxjxidpbcfyg";
pub const OTHER_SEED: &str = "bqrymxwutdlkxvxeycdsfpmvoqiopkuvlmxfbqhrwzsgqnbtyajcoew";

pub fn status_json() -> Value {
    serde_json::from_str(include_str!("../fixtures/status.json")).expect("status fixture")
}

pub fn tick_transactions_json() -> Value {
    serde_json::from_str(include_str!("../fixtures/tick_transactions.json"))
        .expect("tick transactions fixture")
}

// ---------------------------------------------------------------------------
// REST JSON -> RPC wire
// ---------------------------------------------------------------------------

fn u32_of(value: &Value) -> u32 {
    value.as_u64().expect("integer") as u32
}

fn epoch_map(value: &Value) -> std::collections::HashMap<u32, u32> {
    value
        .as_object()
        .expect("object")
        .iter()
        .map(|(epoch, tick)| (epoch.parse().expect("decimal epoch"), u32_of(tick)))
        .collect()
}

pub fn wire_status(json: &Value) -> WireStatus {
    WireStatus {
        last_processed_tick: WireTickInfo {
            tick_number: u32_of(&json["lastProcessedTick"]["tickNumber"]),
            epoch: u32_of(&json["lastProcessedTick"]["epoch"]),
        },
        last_processed_ticks_per_epoch: epoch_map(&json["lastProcessedTicksPerEpoch"]),
        skipped_ticks: json["skippedTicks"]
            .as_array()
            .expect("array")
            .iter()
            .map(|r| WireSkippedTicks {
                start_tick: u32_of(&r["startTick"]),
                end_tick: u32_of(&r["endTick"]),
            })
            .collect(),
        processed_tick_intervals_per_epoch: json["processedTickIntervalsPerEpoch"]
            .as_array()
            .expect("array")
            .iter()
            .map(|e| WireEpochIntervals {
                epoch: u32_of(&e["epoch"]),
                intervals: e["intervals"]
                    .as_array()
                    .expect("array")
                    .iter()
                    .map(|i| WireInterval {
                        initial_processed_tick: u32_of(&i["initialProcessedTick"]),
                        last_processed_tick: u32_of(&i["lastProcessedTick"]),
                    })
                    .collect(),
            })
            .collect(),
        empty_ticks_per_epoch: epoch_map(&json["emptyTicksPerEpoch"]),
    }
}

pub fn wire_tick_transactions(json: &Value) -> WireTickTransactions {
    let text = |v: &Value| v.as_str().expect("string").to_string();
    WireTickTransactions {
        transactions: json["transactions"]
            .as_array()
            .expect("array")
            .iter()
            .map(|entry| {
                let tx = &entry["transaction"];
                WireTickTransaction {
                    transaction: WireTransaction {
                        source_id: text(&tx["sourceId"]),
                        dest_id: text(&tx["destId"]),
                        amount: text(&tx["amount"]).parse().expect("decimal amount"),
                        tick_number: u32_of(&tx["tickNumber"]),
                        input_type: u32_of(&tx["inputType"]),
                        input_size: u32_of(&tx["inputSize"]),
                        input_hex: text(&tx["inputHex"]),
                        signature_hex: text(&tx["signatureHex"]),
                        tx_id: text(&tx["txId"]),
                    },
                    timestamp: text(&entry["timestamp"]).parse().expect("decimal timestamp"),
                    money_flew: entry["moneyFlew"].as_bool().expect("bool"),
                }
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// RPC fixture server
// ---------------------------------------------------------------------------

/// Serve one reply per accepted connection, in order, and hand back the
/// requests that were received.
pub async fn serve_rpc(replies: Vec<Reply>) -> (String, JoinHandle<Vec<Request>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr").to_string();
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for reply in replies {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let request: Request = read_frame(&mut stream).await.expect("request frame");
            seen.push(request);
            write_frame(&mut stream, &reply).await.expect("reply frame");
        }
        seen
    });
    (address, handle)
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// An in-memory archive.
///
/// - `fetch_latest_tick` returns `latest_tick`.
/// - Each `fetch_status` pops the next scripted last-processed tick; the
///   final value repeats forever.
/// - Every operation fails with its queued errors first, then succeeds.
/// - When `includes` is set, a broadcast transaction shows up in its target
///   tick's transaction list.
pub struct ScriptedTransport {
    pub latest_tick: AtomicU32,
    progress: Mutex<VecDeque<TickNumber>>,
    skipped: Vec<SkippedTickRange>,
    includes: bool,
    broadcast_failures: Mutex<VecDeque<TransportError>>,
    latest_tick_failures: Mutex<VecDeque<TransportError>>,
    status_failures: Mutex<VecDeque<TransportError>>,
    tick_transactions_failures: Mutex<VecDeque<TransportError>>,
    broadcasts: Mutex<Vec<Transaction>>,
    pub broadcast_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub latest_tick_calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(latest_tick: TickNumber, progress: impl IntoIterator<Item = TickNumber>) -> Self {
        Self {
            latest_tick: AtomicU32::new(latest_tick),
            progress: Mutex::new(progress.into_iter().collect()),
            skipped: Vec::new(),
            includes: true,
            broadcast_failures: Mutex::new(VecDeque::new()),
            latest_tick_failures: Mutex::new(VecDeque::new()),
            status_failures: Mutex::new(VecDeque::new()),
            tick_transactions_failures: Mutex::new(VecDeque::new()),
            broadcasts: Mutex::new(Vec::new()),
            broadcast_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            latest_tick_calls: AtomicUsize::new(0),
        }
    }

    /// Never list broadcast transactions in any tick.
    pub fn dropping_transactions(mut self) -> Self {
        self.includes = false;
        self
    }

    /// Report `start..=end` as skipped.
    pub fn skipping(mut self, start_tick: TickNumber, end_tick: TickNumber) -> Self {
        self.skipped.push(SkippedTickRange {
            start_tick,
            end_tick,
        });
        self
    }

    /// Fail the next broadcasts with these errors.
    pub fn failing_broadcasts(self, errors: impl IntoIterator<Item = TransportError>) -> Self {
        self.broadcast_failures.lock().unwrap().extend(errors);
        self
    }

    /// Fail the next latest-tick lookups with these errors.
    pub fn failing_latest_tick(self, errors: impl IntoIterator<Item = TransportError>) -> Self {
        self.latest_tick_failures.lock().unwrap().extend(errors);
        self
    }

    /// Fail the next status polls with these errors. A failed poll does not
    /// consume scripted progress.
    pub fn failing_status(self, errors: impl IntoIterator<Item = TransportError>) -> Self {
        self.status_failures.lock().unwrap().extend(errors);
        self
    }

    /// Fail the next tick transaction lookups with these errors.
    pub fn failing_tick_transactions(
        self,
        errors: impl IntoIterator<Item = TransportError>,
    ) -> Self {
        self.tick_transactions_failures.lock().unwrap().extend(errors);
        self
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcast_calls.load(Ordering::SeqCst)
    }

    pub fn broadcast_ticks(&self) -> Vec<TickNumber> {
        self.broadcasts.lock().unwrap().iter().map(|tx| tx.tick()).collect()
    }

    fn next_progress(&self) -> TickNumber {
        let mut progress = self.progress.lock().unwrap();
        if progress.len() > 1 {
            progress.pop_front().unwrap_or_default()
        } else {
            progress.front().copied().unwrap_or_default()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn endpoint(&self) -> &str {
        "memory"
    }

    async fn fetch_status(&self) -> Result<Status, TransportError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.status_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        let last = self.next_progress();
        Ok(Status {
            last_processed_tick: TickInfo {
                tick_number: last,
                epoch: 118,
            },
            last_processed_ticks_per_epoch: BTreeMap::from([(118, last)]),
            skipped_ticks: self.skipped.clone(),
            processed_tick_intervals_per_epoch: Vec::new(),
            empty_ticks_per_epoch: BTreeMap::new(),
        })
    }

    async fn fetch_latest_tick(&self) -> Result<TickNumber, TransportError> {
        self.latest_tick_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.latest_tick_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(self.latest_tick.load(Ordering::SeqCst))
    }

    async fn fetch_tick_transactions(
        &self,
        tick: TickNumber,
        _transfers_only: bool,
    ) -> Result<TickTransactionSet, TransportError> {
        if let Some(error) = self.tick_transactions_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        if !self.includes {
            return Ok(TickTransactionSet::empty(tick));
        }
        let transactions = self
            .broadcasts
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| tx.tick() == tick)
            .map(|tx| TickTransaction {
                transaction: TransactionRecord::from(tx),
                timestamp: Utc::now(),
                money_flew: true,
            })
            .collect();
        Ok(TickTransactionSet { tick, transactions })
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<BroadcastReceipt, TransportError> {
        self.broadcast_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.broadcast_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.broadcasts.lock().unwrap().push(tx.clone());
        Ok(BroadcastReceipt {
            peers_broadcasted: 3,
        })
    }
}

pub fn unreachable(operation: &'static str) -> TransportError {
    TransportError::Unreachable {
        operation,
        endpoint: "memory".into(),
        source: Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
    }
}

pub fn malformed(operation: &'static str) -> TransportError {
    TransportError::protocol(operation, "memory", "unexpected reply")
}

pub fn remote(operation: &'static str, code: u16) -> TransportError {
    TransportError::Remote {
        operation,
        endpoint: "memory".into(),
        code,
        body: format!("status {code}"),
    }
}
