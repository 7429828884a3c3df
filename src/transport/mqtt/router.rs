//! Pure routing of protocol events onto the session event stream
//!
//! Each polled protocol event maps to at most one [`SessionEvent`]. Keeping
//! the mapping pure means the network task body stays a trivial
//! poll-route-enqueue loop, and the routing decisions are testable with
//! hand-built packets.

use super::connection::connack_code;
use crate::session::events::SessionEvent;
use rumqttc::{ConnectionError, Event, Packet};
use tracing::{debug, trace};

/// Translate a successfully polled protocol event.
///
/// Returns `None` for infrastructure traffic (ping, acks for in-flight
/// QoS handshakes, outgoing echoes) that the consumer never sees.
pub fn route_incoming(event: &Event) -> Option<SessionEvent> {
    match event {
        Event::Incoming(packet) => match packet {
            Packet::ConnAck(ack) => Some(SessionEvent::Connected {
                result_code: connack_code(ack.code),
            }),
            Packet::Publish(publish) => {
                Some(SessionEvent::message(publish.topic.clone(), &publish.payload))
            }
            Packet::Disconnect => Some(SessionEvent::Disconnected {
                result_code: 0,
                requested: false,
            }),
            Packet::SubAck(ack) => {
                debug!(pkid = ack.pkid, "subscription acknowledged by broker");
                None
            }
            Packet::UnsubAck(ack) => {
                debug!(pkid = ack.pkid, "unsubscription acknowledged by broker");
                None
            }
            other => {
                trace!("ignoring protocol event: {other:?}");
                None
            }
        },
        Event::Outgoing(outgoing) => {
            trace!("outgoing: {outgoing:?}");
            None
        }
    }
}

/// Translate a poll failure into the session event ending the connection.
///
/// A refused CONNACK is reported as a failed connection attempt with the
/// broker's code; everything else is an unsolicited connection loss.
pub fn route_connection_error(error: &ConnectionError) -> SessionEvent {
    match error {
        ConnectionError::ConnectionRefused(code) => SessionEvent::Connected {
            result_code: connack_code(*code),
        },
        _ => SessionEvent::Disconnected {
            result_code: 1,
            requested: false,
        },
    }
}
