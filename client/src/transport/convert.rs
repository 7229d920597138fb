//! Field conversions shared by both adapters when normalizing replies.
//!
//! Each helper returns a human-readable detail string on failure; the
//! adapter wraps it in a [`super::TransportError::Protocol`].

use chrono::{DateTime, TimeZone, Utc};

/// Decode a hex field. An empty string is an empty payload.
pub(crate) fn hex_field(field: &str, value: &str) -> Result<Vec<u8>, String> {
    hex::decode(value).map_err(|e| format!("{field}: invalid hex: {e}"))
}

/// Narrow a 32-bit wire integer to the 16-bit domain field.
pub(crate) fn u16_field(field: &str, value: u32) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("{field}: {value} does not fit in 16 bits"))
}

/// Parse a decimal string carrying an integer, as the JSON interface sends
/// 64-bit values.
pub(crate) fn decimal_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{field}: {value:?} is not a decimal integer"))
}

/// Milliseconds since the Unix epoch.
pub(crate) fn timestamp_millis(value: u64) -> Result<DateTime<Utc>, String> {
    i64::try_from(value)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .ok_or_else(|| format!("timestamp: {value} is out of range"))
}
