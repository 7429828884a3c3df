//! Transport layer for broker communication
//!
//! This module provides the transport abstraction and the MQTT
//! implementation. The trait is the seam between the session controller and
//! the protocol library: it enables dependency injection and testing with a
//! mock transport instead of a live broker.

use crate::config::QosLevel;
use crate::session::events::SessionEvent;
use tokio::sync::mpsc;

pub mod mqtt;

/// Transport abstraction over a pub/sub protocol client.
///
/// Implementations own the protocol runtime's network task. Inbound
/// protocol events must be translated into [`SessionEvent`]s and pushed
/// through the registered sender; that enqueue is the only work allowed on
/// the network side. All operations are enqueue-to-send: they return once
/// the protocol client accepted the request, not when the broker
/// acknowledged it.
#[async_trait::async_trait]
pub trait Transport: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Register the producer end of the event channel. Must be called
    /// before `connect`; the transport holds exactly one sender.
    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<SessionEvent>);

    /// Start the connection attempt and the network task. Fails on a
    /// malformed address or when a live network task already exists; the
    /// broker's verdict arrives later as a `Connected` event.
    async fn connect(&mut self) -> Result<(), Self::Error>;

    /// Tear down the connection. Idempotent; a no-op when not connected.
    async fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Subscribe to a topic filter.
    async fn subscribe(&mut self, filter: &str, qos: QosLevel) -> Result<(), Self::Error>;

    /// Remove a topic filter subscription.
    async fn unsubscribe(&mut self, filter: &str) -> Result<(), Self::Error>;

    /// Publish a payload to a topic.
    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QosLevel,
    ) -> Result<(), Self::Error>;
}

/// Type alias for the MQTT transport
pub type MqttTransport = mqtt::MqttTransport;
