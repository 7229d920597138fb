//! JSON/HTTP archive client.
//!
//! | Operation                 | Request                                        |
//! |---------------------------|------------------------------------------------|
//! | `fetch_status`            | `GET  /v1/status`                              |
//! | `fetch_latest_tick`       | `GET  /v1/latestTick`                          |
//! | `fetch_tick_transactions` | `GET  /v2/ticks/{tick}/transactions?transfers=`|
//! | `broadcast`               | `POST /v1/broadcast-transaction`               |
//! | `fetch_transaction`       | `GET  /v1/transactions/{txId}`                 |
//!
//! The JSON interface sends 64-bit integers and timestamps as decimal
//! strings and keys epoch maps by decimal strings; the DTOs below mirror
//! that exactly and are converted to [`crate::archive`] types before they
//! leave this module.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::convert::{decimal_field, hex_field, timestamp_millis, u16_field};
use super::error::operation;
use super::{BroadcastReceipt, Transport, TransportError};
use crate::archive::{
    EpochIntervals, ProcessedTickInterval, SkippedTickRange, Status, TickInfo, TickTransaction,
    TickTransactionSet, TransactionRecord,
};
use crate::config::RestConfig;
use crate::transaction::{TickNumber, Transaction};

// ---------------------------------------------------------------------------
// Wire DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusDto {
    last_processed_tick: TickInfoDto,
    #[serde(default)]
    last_processed_ticks_per_epoch: HashMap<String, u32>,
    #[serde(default)]
    skipped_ticks: Vec<SkippedTicksDto>,
    #[serde(default)]
    processed_tick_intervals_per_epoch: Vec<EpochIntervalsDto>,
    #[serde(default)]
    empty_ticks_per_epoch: HashMap<String, u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickInfoDto {
    tick_number: u32,
    epoch: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkippedTicksDto {
    start_tick: u32,
    end_tick: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpochIntervalsDto {
    epoch: u32,
    #[serde(default)]
    intervals: Vec<IntervalDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntervalDto {
    initial_processed_tick: u32,
    last_processed_tick: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestTickDto {
    latest_tick: u32,
}

#[derive(Debug, Deserialize)]
struct TickTransactionsDto {
    #[serde(default)]
    transactions: Vec<TickTransactionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickTransactionDto {
    transaction: TransactionDto,
    timestamp: String,
    #[serde(default)]
    money_flew: bool,
}

#[derive(Debug, Deserialize)]
struct TransactionEnvelopeDto {
    transaction: TransactionDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionDto {
    source_id: String,
    dest_id: String,
    amount: String,
    tick_number: u32,
    #[serde(default)]
    input_type: u32,
    #[serde(default)]
    input_size: u32,
    #[serde(default)]
    input_hex: String,
    #[serde(default)]
    signature_hex: String,
    tx_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastRequestDto<'a> {
    encoded_transaction: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastResponseDto {
    peers_broadcasted: u32,
    /// Echo of the submitted encoding; empty when the archive omits it.
    #[serde(default)]
    encoded_transaction: String,
}

fn epoch_map(field: &str, map: HashMap<String, u32>) -> Result<BTreeMap<u32, u32>, String> {
    map.into_iter()
        .map(|(epoch, value)| Ok((decimal_field(field, &epoch)?, value)))
        .collect()
}

impl StatusDto {
    fn into_status(self) -> Result<Status, String> {
        Ok(Status {
            last_processed_tick: TickInfo {
                tick_number: self.last_processed_tick.tick_number,
                epoch: self.last_processed_tick.epoch,
            },
            last_processed_ticks_per_epoch: epoch_map(
                "lastProcessedTicksPerEpoch",
                self.last_processed_ticks_per_epoch,
            )?,
            skipped_ticks: self
                .skipped_ticks
                .into_iter()
                .map(|r| SkippedTickRange {
                    start_tick: r.start_tick,
                    end_tick: r.end_tick,
                })
                .collect(),
            processed_tick_intervals_per_epoch: self
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
            empty_ticks_per_epoch: epoch_map("emptyTicksPerEpoch", self.empty_ticks_per_epoch)?,
        })
    }
}

impl TransactionDto {
    fn into_record(self) -> Result<TransactionRecord, String> {
        Ok(TransactionRecord {
            amount: decimal_field("amount", &self.amount)?,
            input_type: u16_field("inputType", self.input_type)?,
            input_size: u16_field("inputSize", self.input_size)?,
            input: hex_field("inputHex", &self.input_hex)?,
            signature: hex_field("signatureHex", &self.signature_hex)?,
            source_id: self.source_id,
            dest_id: self.dest_id,
            tick_number: self.tick_number,
            tx_id: self.tx_id,
        })
    }
}

impl TickTransactionsDto {
    fn into_set(self, tick: TickNumber) -> Result<TickTransactionSet, String> {
        let transactions = self
            .transactions
            .into_iter()
            .map(|entry| {
                Ok(TickTransaction {
                    timestamp: timestamp_millis(decimal_field("timestamp", &entry.timestamp)?)?,
                    money_flew: entry.money_flew,
                    transaction: entry.transaction.into_record()?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        Ok(TickTransactionSet { tick, transactions })
    }
}

// ---------------------------------------------------------------------------
// RestTransport
// ---------------------------------------------------------------------------

/// Archive client over JSON/HTTP.
#[derive(Debug, Clone)]
pub struct RestTransport {
    config: RestConfig,
    client: reqwest::Client,
}

impl RestTransport {
    /// Build a client with the configured timeout.
    pub fn new(config: RestConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Unreachable {
                operation: "build_client",
                endpoint: config.base_url.clone(),
                source: Box::new(e),
            })?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Look up a single archived transaction by ID.
    pub async fn fetch_transaction(&self, tx_id: &str) -> Result<TransactionRecord, TransportError> {
        let op = operation::FETCH_TRANSACTION;
        let url = self.url(&format!("/v1/transactions/{tx_id}"));
        let envelope: TransactionEnvelopeDto = self.execute(op, &url, self.client.get(&url)).await?;
        envelope
            .transaction
            .into_record()
            .map_err(|detail| TransportError::protocol(op, &url, detail))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        op: &'static str,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TransportError> {
        debug!(operation = op, url, "sending request");
        let response = request
            .send()
            .await
            .map_err(|e| self.request_error(op, url, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.request_error(op, url, e))?;
        debug!(operation = op, status = status.as_u16(), bytes = body.len(), "received response");

        if !status.is_success() {
            return Err(TransportError::Remote {
                operation: op,
                endpoint: url.to_string(),
                code: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Protocol {
            operation: op,
            endpoint: url.to_string(),
            detail: e.to_string(),
            source: Some(Box::new(e)),
        })
    }

    fn request_error(&self, op: &'static str, url: &str, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::TimedOut {
                operation: op,
                endpoint: url.to_string(),
                timeout: self.config.timeout,
            }
        } else if error.is_decode() {
            TransportError::Protocol {
                operation: op,
                endpoint: url.to_string(),
                detail: error.to_string(),
                source: Some(Box::new(error)),
            }
        } else {
            TransportError::Unreachable {
                operation: op,
                endpoint: url.to_string(),
                source: Box::new(error),
            }
        }
    }
}

#[async_trait]
impl Transport for RestTransport {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn endpoint(&self) -> &str {
        &self.config.base_url
    }

    async fn fetch_status(&self) -> Result<Status, TransportError> {
        let op = operation::FETCH_STATUS;
        let url = self.url("/v1/status");
        let dto: StatusDto = self.execute(op, &url, self.client.get(&url)).await?;
        dto.into_status()
            .map_err(|detail| TransportError::protocol(op, &url, detail))
    }

    async fn fetch_latest_tick(&self) -> Result<TickNumber, TransportError> {
        let url = self.url("/v1/latestTick");
        let dto: LatestTickDto = self
            .execute(operation::FETCH_LATEST_TICK, &url, self.client.get(&url))
            .await?;
        Ok(dto.latest_tick)
    }

    async fn fetch_tick_transactions(
        &self,
        tick: TickNumber,
        transfers_only: bool,
    ) -> Result<TickTransactionSet, TransportError> {
        let op = operation::FETCH_TICK_TRANSACTIONS;
        let url = self.url(&format!("/v2/ticks/{tick}/transactions"));
        let request = self
            .client
            .get(&url)
            .query(&[("transfers", transfers_only)]);
        let dto: TickTransactionsDto = self.execute(op, &url, request).await?;
        dto.into_set(tick)
            .map_err(|detail| TransportError::protocol(op, &url, detail))
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<BroadcastReceipt, TransportError> {
        let url = self.url("/v1/broadcast-transaction");
        let encoded = tx.to_base64();
        let request = self.client.post(&url).json(&BroadcastRequestDto {
            encoded_transaction: &encoded,
        });
        let dto: BroadcastResponseDto = self.execute(operation::BROADCAST, &url, request).await?;
        if !dto.encoded_transaction.is_empty() && dto.encoded_transaction != encoded {
            return Err(TransportError::protocol(
                operation::BROADCAST,
                &url,
                "archive echoed a different encoded transaction",
            ));
        }
        Ok(BroadcastReceipt {
            peers_broadcasted: dto.peers_broadcasted,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
