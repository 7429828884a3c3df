//! Typed events flowing from the session to the consumer
//!
//! Events are immutable once constructed; ownership moves from the producer
//! (the transport's event-loop task or the command surface) through the
//! channel to the dispatch loop. Timestamps are taken at construction so a
//! paused dispatch loop does not skew message times.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One entry in the ordered event stream delivered to the consumer sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Broker acknowledged the connection attempt. `result_code` 0 is
    /// success; any other value is the broker's refusal code.
    Connected { result_code: u8 },
    /// Connection ended. `requested` distinguishes a consumer-initiated
    /// disconnect from a broker- or network-initiated one.
    Disconnected { result_code: u8, requested: bool },
    /// Inbound message on a subscribed topic.
    MessageReceived {
        topic: String,
        payload: String,
        received_at: DateTime<Utc>,
    },
    /// A command was handed to the transport successfully.
    CommandAck { description: String },
    /// A command or the session itself failed asynchronously.
    CommandFailed { description: String, cause: String },
}

impl SessionEvent {
    /// Inbound message event, stamped now. Payloads are decoded lossily so
    /// binary payloads still render instead of poisoning the stream.
    pub fn message(topic: impl Into<String>, payload: &[u8]) -> Self {
        SessionEvent::MessageReceived {
            topic: topic.into(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            received_at: Utc::now(),
        }
    }

    pub fn ack(description: impl Into<String>) -> Self {
        SessionEvent::CommandAck {
            description: description.into(),
        }
    }

    pub fn failed(description: impl Into<String>, cause: impl ToString) -> Self {
        SessionEvent::CommandFailed {
            description: description.into(),
            cause: cause.to_string(),
        }
    }

    /// Whether this event ends the connection (success or failure).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionEvent::Disconnected { .. } | SessionEvent::Connected { result_code: 1.. }
        )
    }
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::Connected { result_code: 0 } => write!(f, "connected (rc=0)"),
            SessionEvent::Connected { result_code } => {
                write!(f, "connection failed (rc={result_code})")
            }
            SessionEvent::Disconnected {
                result_code,
                requested: true,
            } => write!(f, "disconnected (rc={result_code})"),
            SessionEvent::Disconnected { result_code, .. } => {
                write!(f, "connection lost (rc={result_code})")
            }
            SessionEvent::MessageReceived { topic, payload, .. } => {
                write!(f, "{topic} -> {payload}")
            }
            SessionEvent::CommandAck { description } => f.write_str(description),
            SessionEvent::CommandFailed { description, cause } => {
                write!(f, "{description} failed: {cause}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_decodes_utf8() {
        let event = SessionEvent::message("sensors/temp", b"21.5");
        match event {
            SessionEvent::MessageReceived { topic, payload, .. } => {
                assert_eq!(topic, "sensors/temp");
                assert_eq!(payload, "21.5");
            }
            other => panic!("expected MessageReceived, got {other:?}"),
        }
    }

    #[test]
    fn test_message_decodes_invalid_utf8_lossily() {
        let event = SessionEvent::message("bin", &[0x66, 0xff, 0x6f]);
        match event {
            SessionEvent::MessageReceived { payload, .. } => {
                assert!(payload.contains('\u{fffd}'));
                assert!(payload.starts_with('f'));
            }
            other => panic!("expected MessageReceived, got {other:?}"),
        }
    }

    #[test]
    fn test_terminal_events() {
        assert!(SessionEvent::Disconnected {
            result_code: 0,
            requested: true
        }
        .is_terminal());
        assert!(SessionEvent::Connected { result_code: 4 }.is_terminal());
        assert!(!SessionEvent::Connected { result_code: 0 }.is_terminal());
        assert!(!SessionEvent::ack("subscribed a/b").is_terminal());
    }

    #[test]
    fn test_display_matches_event_meaning() {
        assert_eq!(
            SessionEvent::Connected { result_code: 0 }.to_string(),
            "connected (rc=0)"
        );
        assert_eq!(
            SessionEvent::Connected { result_code: 5 }.to_string(),
            "connection failed (rc=5)"
        );
        assert_eq!(
            SessionEvent::Disconnected {
                result_code: 0,
                requested: false
            }
            .to_string(),
            "connection lost (rc=0)"
        );
        assert_eq!(
            SessionEvent::failed("publish sensors/temp", "not connected").to_string(),
            "publish sensors/temp failed: not connected"
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_string(&SessionEvent::ack("published a")).unwrap();
        assert!(json.contains(r#""kind":"command_ack""#));
        assert!(json.contains(r#""description":"published a""#));

        let json = serde_json::to_string(&SessionEvent::Connected { result_code: 0 }).unwrap();
        assert!(json.contains(r#""kind":"connected""#));
    }
}
