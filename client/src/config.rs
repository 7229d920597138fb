//! # Client Configuration & Constants
//!
//! Every fixed parameter of the wire format and every tunable default of the
//! submission flow lives here. Endpoints, seeds and lead ticks are never
//! process-wide state: they are passed into the transports and the
//! orchestrator at construction time via the structs in this module.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Identity & Seed Format
// ---------------------------------------------------------------------------

/// Length of an identity string: 56 characters of public key plus a
/// 4-character checksum.
pub const IDENTITY_LENGTH: usize = 60;

/// Number of characters that encode the 32-byte public key.
pub const IDENTITY_BODY_LENGTH: usize = 56;

/// Number of base-26 digits per 64-bit limb of the public key.
pub const IDENTITY_LIMB_DIGITS: usize = 14;

/// Length of a secret seed. Lowercase `a`..=`z` only.
pub const SEED_LENGTH: usize = 55;

/// Public key, sub-seed and digest length in bytes.
pub const KEY_LENGTH: usize = 32;

/// Signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Context string for sub-seed derivation. Changing it changes every
/// derived identity.
pub const SUBSEED_DERIVATION_CONTEXT: &str = "tickcast 2026-01-01 subseed v1";

// ---------------------------------------------------------------------------
// Transaction Layout
// ---------------------------------------------------------------------------

/// Maximum length of a transaction's input payload.
pub const MAX_INPUT_SIZE: usize = 1024;

/// Size of the fixed header: two public keys, amount, tick, input type and
/// input size.
pub const TRANSACTION_HEADER_SIZE: usize = KEY_LENGTH * 2 + 8 + 4 + 2 + 2;

/// Input type of a plain value transfer.
pub const INPUT_TYPE_TRANSFER: u16 = 0;

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Default REST archiver base URL.
pub const DEFAULT_REST_URL: &str = "https://testapi.qubic.org";

/// Default binary RPC archiver address.
pub const DEFAULT_RPC_ADDRESS: &str = "213.170.135.5:8003";

/// Per-request timeout applied by both transports.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single RPC frame. Anything larger is a protocol error.
pub const MAX_RPC_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// REST transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// Base URL without a trailing slash, e.g. `https://testapi.qubic.org`.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REST_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Binary RPC transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    /// `host:port` of the archive RPC listener.
    pub address: String,
    /// Timeout covering connect, request and reply.
    pub timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_RPC_ADDRESS.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Submission Defaults
// ---------------------------------------------------------------------------

/// Default number of ticks between the current tick and the target tick.
///
/// Too small and the broadcast arrives after the tick is sealed, which loses
/// the transaction silently.
pub const DEFAULT_LEAD_TICKS: u32 = 10;

/// Remote status codes considered transient (rate limiting, gateway errors).
pub const DEFAULT_TRANSIENT_CODES: [u16; 4] = [429, 502, 503, 504];

/// How many consecutive ticks the orchestrator probes when the preferred
/// (source, tick) slot is already reserved by another submission.
pub const MAX_SLOT_PROBES: u32 = 16;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Ceiling for any single delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Backoff to wait after the given (1-based) failed attempt.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
            multiplier: 2,
        }
    }
}

/// Fixed-interval polling for inclusion, bounded twice: by attempts and by
/// wall-clock deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two polls.
    pub interval: Duration,
    /// Maximum number of polls.
    pub max_attempts: u32,
    /// Maximum total time spent in `AwaitingInclusion`.
    pub deadline: Duration,
    /// Consecutive transport failures tolerated before the poll gives up.
    pub max_consecutive_failures: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 120,
            deadline: Duration::from_secs(300),
            max_consecutive_failures: 5,
        }
    }
}

/// Everything the orchestrator needs besides the transport and the keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionConfig {
    /// Safety margin added to the current tick.
    pub lead_ticks: u32,
    /// Retry policy for `broadcast`.
    pub broadcast_retry: RetryPolicy,
    /// Retry policy for the initial latest-tick lookup.
    pub tick_lookup_retry: RetryPolicy,
    /// Inclusion polling policy.
    pub poll: PollPolicy,
    /// Remote codes that are retried instead of failing the submission.
    pub transient_codes: Vec<u16>,
}

impl SubmissionConfig {
    /// Returns `true` if the remote code belongs to the transient allowlist.
    pub fn is_transient_code(&self, code: u16) -> bool {
        self.transient_codes.contains(&code)
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            lead_ticks: DEFAULT_LEAD_TICKS,
            broadcast_retry: RetryPolicy::default(),
            tick_lookup_retry: RetryPolicy::default(),
            poll: PollPolicy::default(),
            transient_codes: DEFAULT_TRANSIENT_CODES.to_vec(),
        }
    }
}
