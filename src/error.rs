//! Error types for session commands
//!
//! Synchronous command failures return these errors at the call site;
//! asynchronous outcomes (connect refusals, lost connections, the disconnect
//! watchdog) surface through the event stream instead. Nothing here is fatal:
//! every failure leaves the controller in a well-defined state and a later
//! `connect` must work.

use crate::session::state::ConnectionState;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the session command surface.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Transport-level connection failure. Surfaced, never retried
    /// automatically; the consumer decides whether to try again.
    #[error("Connection failed")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Subscribe or publish rejected by the transport.
    #[error("Protocol operation failed")]
    Protocol(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Command issued in a state that cannot accept it.
    #[error("Not connected - current state: {state}")]
    NotConnected { state: ConnectionState },

    /// `connect` issued while a connection already exists or is being set up.
    #[error("Connection attempt already in progress - current state: {state}")]
    AlreadyConnecting { state: ConnectionState },

    /// Publish or subscribe called with an empty topic.
    #[error("Topic must not be empty")]
    EmptyTopic,

    /// The disconnect watchdog expired before the transport confirmed.
    #[error("Disconnect not confirmed within {0:?}")]
    DisconnectTimeout(Duration),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            SessionError::Connection("refused".to_string().into()),
            SessionError::Protocol("rejected".to_string().into()),
            SessionError::NotConnected {
                state: ConnectionState::Disconnected,
            },
            SessionError::AlreadyConnecting {
                state: ConnectionState::Connecting,
            },
            SessionError::EmptyTopic,
            SessionError::DisconnectTimeout(Duration::from_secs(5)),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }

    #[test]
    fn test_not_connected_names_state() {
        let error = SessionError::NotConnected {
            state: ConnectionState::Connecting,
        };
        assert!(error.to_string().contains("connecting"));
    }

    #[test]
    fn test_connection_error_keeps_source() {
        use std::error::Error;

        let error = SessionError::Connection("broker unreachable".to_string().into());
        let source = error.source().expect("source must be preserved");
        assert_eq!(source.to_string(), "broker unreachable");
    }
}
