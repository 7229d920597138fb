//! Transport failure taxonomy.
//!
//! Every variant carries the operation name and the endpoint it targeted so
//! a log line or an error chain is self-describing. Underlying causes stay
//! reachable through [`std::error::Error::source`].

use std::time::Duration;
use thiserror::Error;

/// Boxed cause kept on transport errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Operation names used in error context and log fields.
pub mod operation {
    pub const FETCH_STATUS: &str = "fetch_status";
    pub const FETCH_LATEST_TICK: &str = "fetch_latest_tick";
    pub const FETCH_TICK_TRANSACTIONS: &str = "fetch_tick_transactions";
    pub const FETCH_TRANSACTION: &str = "fetch_transaction";
    pub const BROADCAST: &str = "broadcast";
}

/// A remote call failed.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint could not be reached or the connection broke mid-call.
    #[error("{operation} via {endpoint}: connection failed")]
    Unreachable {
        operation: &'static str,
        endpoint: String,
        #[source]
        source: BoxError,
    },

    /// No complete reply within the configured timeout.
    #[error("{operation} via {endpoint}: timed out after {timeout:?}")]
    TimedOut {
        operation: &'static str,
        endpoint: String,
        timeout: Duration,
    },

    /// The reply arrived but could not be understood.
    #[error("{operation} via {endpoint}: malformed response: {detail}")]
    Protocol {
        operation: &'static str,
        endpoint: String,
        detail: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The remote answered with a non-success code.
    #[error("{operation} via {endpoint}: remote error {code}: {body}")]
    Remote {
        operation: &'static str,
        endpoint: String,
        code: u16,
        body: String,
    },
}

impl TransportError {
    /// Build a [`TransportError::Protocol`] without an underlying cause.
    pub fn protocol(operation: &'static str, endpoint: &str, detail: impl Into<String>) -> Self {
        Self::Protocol {
            operation,
            endpoint: endpoint.to_string(),
            detail: detail.into(),
            source: None,
        }
    }

    /// Connection and timeout failures. Protocol and remote errors are
    /// never retryable at this level; remote codes are judged by the caller
    /// against its transient allowlist.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::TimedOut { .. })
    }

    /// The remote code, for [`TransportError::Remote`].
    pub fn remote_code(&self) -> Option<u16> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Unreachable { operation, .. }
            | Self::TimedOut { operation, .. }
            | Self::Protocol { operation, .. }
            | Self::Remote { operation, .. } => operation,
        }
    }

    /// The endpoint the failed call targeted.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Unreachable { endpoint, .. }
            | Self::TimedOut { endpoint, .. }
            | Self::Protocol { endpoint, .. }
            | Self::Remote { endpoint, .. } => endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn only_connection_failures_are_retryable() {
        let unreachable = TransportError::Unreachable {
            operation: operation::BROADCAST,
            endpoint: "127.0.0.1:1".into(),
            source: "refused".into(),
        };
        let timed_out = TransportError::TimedOut {
            operation: operation::FETCH_STATUS,
            endpoint: "x".into(),
            timeout: Duration::from_secs(1),
        };
        let remote = TransportError::Remote {
            operation: operation::BROADCAST,
            endpoint: "x".into(),
            code: 503,
            body: "busy".into(),
        };
        assert!(unreachable.is_retryable());
        assert!(timed_out.is_retryable());
        assert!(!remote.is_retryable());
        assert!(!TransportError::protocol(operation::FETCH_STATUS, "x", "bad json").is_retryable());
    }

    #[test]
    fn message_carries_context_and_body() {
        let err = TransportError::Remote {
            operation: operation::FETCH_TICK_TRANSACTIONS,
            endpoint: "https://archive.example".into(),
            code: 404,
            body: "tick not found".into(),
        };
        let text = err.to_string();
        assert!(text.contains("fetch_tick_transactions"));
        assert!(text.contains("https://archive.example"));
        assert!(text.contains("404"));
        assert!(text.contains("tick not found"));
        assert_eq!(err.remote_code(), Some(404));
    }

    #[test]
    fn cause_is_preserved() {
        let err = TransportError::Unreachable {
            operation: operation::BROADCAST,
            endpoint: "x".into(),
            source: "connection refused".into(),
        };
        assert_eq!(err.source().map(|s| s.to_string()), Some("connection refused".into()));
        assert_eq!(err.operation(), "broadcast");
        assert_eq!(err.endpoint(), "x");
    }
}
