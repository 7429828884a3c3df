//! Connection lifecycle state machine
//!
//! Exactly one `ConnectionState` exists per session, owned by the
//! controller and mutated only on the dispatch side. Commands and drained
//! events are the only transition sources; the pure functions here decide
//! the transitions so they can be tested without a transport.

use crate::session::events::SessionEvent;

/// Lifecycle state of the broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection; only `connect` is accepted
    Disconnected,
    /// `connect` issued, waiting for the broker's acknowledgment
    Connecting,
    /// Acknowledged by the broker; full command surface available
    Connected,
    /// `disconnect` issued, waiting for the transport's confirmation
    Disconnecting,
}

impl ConnectionState {
    /// Whether a `connect` command is accepted in this state.
    pub fn can_connect(&self) -> bool {
        matches!(self, ConnectionState::Disconnected)
    }

    /// Whether publish/subscribe/unsubscribe commands are accepted.
    pub fn can_operate(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Whether a `disconnect` command is accepted in this state.
    pub fn can_disconnect(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// Next state after draining one event from the channel.
///
/// Message and command-outcome events never move the state machine; only
/// connection acknowledgments and disconnect notifications do.
pub fn transition_on_event(current: ConnectionState, event: &SessionEvent) -> ConnectionState {
    match event {
        SessionEvent::Connected { result_code } => {
            if *result_code == 0 {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            }
        }
        SessionEvent::Disconnected { .. } => ConnectionState::Disconnected,
        SessionEvent::MessageReceived { .. }
        | SessionEvent::CommandAck { .. }
        | SessionEvent::CommandFailed { .. } => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_acceptance_per_state() {
        assert!(ConnectionState::Disconnected.can_connect());
        assert!(!ConnectionState::Disconnected.can_operate());
        assert!(!ConnectionState::Disconnected.can_disconnect());

        assert!(!ConnectionState::Connecting.can_connect());
        assert!(!ConnectionState::Connecting.can_operate());
        assert!(!ConnectionState::Connecting.can_disconnect());

        assert!(!ConnectionState::Connected.can_connect());
        assert!(ConnectionState::Connected.can_operate());
        assert!(ConnectionState::Connected.can_disconnect());

        assert!(!ConnectionState::Disconnecting.can_connect());
        assert!(!ConnectionState::Disconnecting.can_operate());
        assert!(!ConnectionState::Disconnecting.can_disconnect());
    }

    #[test]
    fn test_connack_success_transitions_to_connected() {
        let next = transition_on_event(
            ConnectionState::Connecting,
            &SessionEvent::Connected { result_code: 0 },
        );
        assert_eq!(next, ConnectionState::Connected);
    }

    #[test]
    fn test_connack_failure_transitions_to_disconnected() {
        for code in [1u8, 2, 3, 4, 5] {
            let next = transition_on_event(
                ConnectionState::Connecting,
                &SessionEvent::Connected { result_code: code },
            );
            assert_eq!(next, ConnectionState::Disconnected, "rc={code}");
        }
    }

    #[test]
    fn test_disconnect_event_is_terminal_from_any_state() {
        let event = SessionEvent::Disconnected {
            result_code: 0,
            requested: false,
        };
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Disconnecting,
        ] {
            assert_eq!(
                transition_on_event(state, &event),
                ConnectionState::Disconnected
            );
        }
    }

    #[test]
    fn test_messages_and_acks_do_not_move_the_machine() {
        let message = SessionEvent::message("sensors/temp", b"21.5");
        let ack = SessionEvent::ack("subscribed sensors/#");
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Disconnecting,
        ] {
            assert_eq!(transition_on_event(state, &message), state);
            assert_eq!(transition_on_event(state, &ack), state);
        }
    }

    #[test]
    fn test_display_is_lowercase() {
        assert_eq!(ConnectionState::Disconnecting.to_string(), "disconnecting");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }
}
