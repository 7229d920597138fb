//! Binary RPC archive client.
//!
//! Each call opens a TCP connection, writes one [`wire::Request`] frame and
//! reads one [`wire::Reply`] frame. The whole exchange (connect included)
//! runs under the configured timeout; dropping the future closes the socket.

pub mod wire;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::convert::{hex_field, timestamp_millis, u16_field};
use super::error::operation;
use super::{BroadcastReceipt, Transport, TransportError};
use crate::archive::{
    EpochIntervals, ProcessedTickInterval, SkippedTickRange, Status, TickInfo, TickTransaction,
    TickTransactionSet, TransactionRecord,
};
use crate::config::RpcConfig;
use crate::transaction::{TickNumber, Transaction};
use wire::{read_frame, write_frame, FrameError, Reply, Request};

/// Archive client over length-prefixed bincode frames.
#[derive(Debug, Clone)]
pub struct RpcTransport {
    config: RpcConfig,
}

impl RpcTransport {
    pub fn new(config: RpcConfig) -> Self {
        Self { config }
    }

    async fn call(&self, op: &'static str, request: Request) -> Result<Reply, TransportError> {
        let address = self.config.address.as_str();
        debug!(operation = op, address, "sending request");

        let exchange = async {
            let mut stream = TcpStream::connect(address)
                .await
                .map_err(|e| self.frame_error(op, FrameError::Io(e)))?;
            write_frame(&mut stream, &request)
                .await
                .map_err(|e| self.frame_error(op, e))?;
            read_frame::<_, Reply>(&mut stream)
                .await
                .map_err(|e| self.frame_error(op, e))
        };

        let reply = timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| TransportError::TimedOut {
                operation: op,
                endpoint: self.config.address.clone(),
                timeout: self.config.timeout,
            })??;
        debug!(operation = op, reply = reply.kind(), "received reply");

        match reply {
            Reply::Error(error) => Err(TransportError::Remote {
                operation: op,
                endpoint: self.config.address.clone(),
                code: error.code,
                body: error.message,
            }),
            other => Ok(other),
        }
    }

    fn frame_error(&self, op: &'static str, error: FrameError) -> TransportError {
        let endpoint = self.config.address.clone();
        match error {
            FrameError::Io(e) => TransportError::Unreachable {
                operation: op,
                endpoint,
                source: Box::new(e),
            },
            other => TransportError::Protocol {
                operation: op,
                endpoint,
                detail: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    fn unexpected(&self, op: &'static str, reply: &Reply) -> TransportError {
        TransportError::protocol(
            op,
            &self.config.address,
            format!("unexpected {} reply", reply.kind()),
        )
    }
}

fn status_from_wire(status: wire::WireStatus) -> Status {
    Status {
        last_processed_tick: TickInfo {
            tick_number: status.last_processed_tick.tick_number,
            epoch: status.last_processed_tick.epoch,
        },
        last_processed_ticks_per_epoch: status.last_processed_ticks_per_epoch.into_iter().collect(),
        skipped_ticks: status
            .skipped_ticks
            .into_iter()
            .map(|r| SkippedTickRange {
                start_tick: r.start_tick,
                end_tick: r.end_tick,
            })
            .collect(),
        processed_tick_intervals_per_epoch: status
            .processed_tick_intervals_per_epoch
            .into_iter()
            .map(|e| EpochIntervals {
                epoch: e.epoch,
                intervals: e
                    .intervals
                    .into_iter()
                    .map(|i| ProcessedTickInterval {
                        initial_processed_tick: i.initial_processed_tick,
                        last_processed_tick: i.last_processed_tick,
                    })
                    .collect(),
            })
            .collect(),
        empty_ticks_per_epoch: status.empty_ticks_per_epoch.into_iter().collect(),
    }
}

fn set_from_wire(
    tick: TickNumber,
    reply: wire::WireTickTransactions,
) -> Result<TickTransactionSet, String> {
    let transactions = reply
        .transactions
        .into_iter()
        .map(|entry| {
            let tx = entry.transaction;
            Ok(TickTransaction {
                transaction: TransactionRecord {
                    input_type: u16_field("inputType", tx.input_type)?,
                    input_size: u16_field("inputSize", tx.input_size)?,
                    input: hex_field("inputHex", &tx.input_hex)?,
                    signature: hex_field("signatureHex", &tx.signature_hex)?,
                    source_id: tx.source_id,
                    dest_id: tx.dest_id,
                    amount: tx.amount,
                    tick_number: tx.tick_number,
                    tx_id: tx.tx_id,
                },
                timestamp: timestamp_millis(entry.timestamp)?,
                money_flew: entry.money_flew,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(TickTransactionSet { tick, transactions })
}

#[async_trait]
impl Transport for RpcTransport {
    fn name(&self) -> &'static str {
        "rpc"
    }

    fn endpoint(&self) -> &str {
        &self.config.address
    }

    async fn fetch_status(&self) -> Result<Status, TransportError> {
        let op = operation::FETCH_STATUS;
        match self.call(op, Request::GetStatus).await? {
            Reply::Status(status) => Ok(status_from_wire(status)),
            other => Err(self.unexpected(op, &other)),
        }
    }

    async fn fetch_latest_tick(&self) -> Result<TickNumber, TransportError> {
        let op = operation::FETCH_LATEST_TICK;
        match self.call(op, Request::GetLatestTick).await? {
            Reply::LatestTick { latest_tick } => Ok(latest_tick),
            other => Err(self.unexpected(op, &other)),
        }
    }

    async fn fetch_tick_transactions(
        &self,
        tick: TickNumber,
        transfers_only: bool,
    ) -> Result<TickTransactionSet, TransportError> {
        let op = operation::FETCH_TICK_TRANSACTIONS;
        let request = Request::GetTickTransactionsV2 {
            tick_number: tick,
            approved_only: false,
            transfers_only,
        };
        match self.call(op, request).await? {
            Reply::TickTransactions(reply) => set_from_wire(tick, reply)
                .map_err(|detail| TransportError::protocol(op, &self.config.address, detail)),
            other => Err(self.unexpected(op, &other)),
        }
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<BroadcastReceipt, TransportError> {
        let op = operation::BROADCAST;
        let encoded = tx.to_base64();
        let request = Request::BroadcastTransaction {
            encoded: encoded.clone(),
        };
        match self.call(op, request).await? {
            Reply::Broadcast(reply)
                if !reply.encoded_transaction.is_empty()
                    && reply.encoded_transaction != encoded =>
            {
                Err(TransportError::protocol(
                    op,
                    &self.config.address,
                    "archive echoed a different encoded transaction",
                ))
            }
            Reply::Broadcast(reply) => Ok(BroadcastReceipt {
                peers_broadcasted: reply.peers_broadcasted,
            }),
            other => Err(self.unexpected(op, &other)),
        }
    }
}
