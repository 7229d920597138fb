//! RPC message types and framing.
//!
//! ```text
//! +----------------+---------------------------+
//! | len: u32 (BE)  | bincode(Request | Reply)  |
//! +----------------+---------------------------+
//! ```
//!
//! One request and one reply per connection. Frames above
//! [`MAX_RPC_FRAME_SIZE`] are refused in both directions. The message types
//! are public so archive-side code (and test fixtures) can speak the same
//! protocol.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::MAX_RPC_FRAME_SIZE;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Client → archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    GetStatus,
    GetLatestTick,
    GetTickTransactionsV2 {
        tick_number: u32,
        approved_only: bool,
        transfers_only: bool,
    },
    BroadcastTransaction {
        /// Standard base64 of the signed encoding.
        encoded: String,
    },
}

/// Archive → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    Status(WireStatus),
    LatestTick { latest_tick: u32 },
    TickTransactions(WireTickTransactions),
    Broadcast(WireBroadcast),
    Error(WireError),
}

impl Reply {
    /// Variant name, for protocol error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "Status",
            Self::LatestTick { .. } => "LatestTick",
            Self::TickTransactions(_) => "TickTransactions",
            Self::Broadcast(_) => "Broadcast",
            Self::Error(_) => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTickInfo {
    pub tick_number: u32,
    pub epoch: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSkippedTicks {
    pub start_tick: u32,
    pub end_tick: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireInterval {
    pub initial_processed_tick: u32,
    pub last_processed_tick: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEpochIntervals {
    pub epoch: u32,
    pub intervals: Vec<WireInterval>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireStatus {
    pub last_processed_tick: WireTickInfo,
    pub last_processed_ticks_per_epoch: HashMap<u32, u32>,
    pub skipped_ticks: Vec<WireSkippedTicks>,
    pub processed_tick_intervals_per_epoch: Vec<WireEpochIntervals>,
    pub empty_ticks_per_epoch: HashMap<u32, u32>,
}

/// Transaction fields as the archive stores them. Input and signature
/// travel as hex, integers at their native widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransaction {
    pub source_id: String,
    pub dest_id: String,
    pub amount: i64,
    pub tick_number: u32,
    pub input_type: u32,
    pub input_size: u32,
    pub input_hex: String,
    pub signature_hex: String,
    pub tx_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTickTransaction {
    pub transaction: WireTransaction,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub money_flew: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTickTransactions {
    pub transactions: Vec<WireTickTransaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBroadcast {
    pub peers_broadcasted: u32,
    pub encoded_transaction: String,
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// A frame could not be written or read.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The socket failed or closed early.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The declared or encoded length exceeds the frame limit.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    TooLarge { len: usize, max: usize },

    /// The body is not a valid message.
    #[error("invalid frame body: {0}")]
    Encoding(#[from] bincode::Error),
}

/// Serialize `message` and write it as one length-prefixed frame.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = bincode::serialize(message)?;
    if body.len() > MAX_RPC_FRAME_SIZE {
        return Err(FrameError::TooLarge {
            len: body.len(),
            max: MAX_RPC_FRAME_SIZE,
        });
    }
    // Fits: MAX_RPC_FRAME_SIZE < u32::MAX.
    writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame and deserialize it.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, FrameError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix).await?;
    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_RPC_FRAME_SIZE {
        return Err(FrameError::TooLarge {
            len,
            max: MAX_RPC_FRAME_SIZE,
        });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(bincode::deserialize(&body)?)
}
