//! MQTT implementation of the transport seam
//!
//! Split into focused sub-modules separating pure decisions from I/O:
//!
//! - [`connection`] - option building and protocol-code mapping
//! - [`router`] - pure translation of protocol events to session events
//! - [`client`] - the rumqttc client and the spawned network task

pub mod client;
pub mod connection;
pub mod router;

// Re-export public types for convenience
pub use client::MqttTransport;
pub use connection::MqttError;
