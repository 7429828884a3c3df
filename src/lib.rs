//! Client-side MQTT session manager
//!
//! This crate manages one logical broker session for a consumer-facing
//! application: it establishes the connection, maintains subscriptions,
//! publishes messages, and bridges asynchronously received messages and
//! connection-state changes to the consumer without blocking the network
//! task or losing messages during bursts.
//!
//! # Architecture
//!
//! - [`transport`] - adapter over the protocol client; its network task
//!   only translates protocol events and enqueues them
//! - [`session`] - the connection state machine, the command surface and
//!   the dispatch loop draining the event channel
//! - [`sink`] - the consumer seam receiving the ordered event stream
//!
//! The event channel is the sole synchronization boundary between the
//! network task and the consumer side; commands are rejected, not queued,
//! when the connection state cannot accept them, and a lost connection is
//! reported but never retried automatically.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mqtt_session::config::{QosLevel, SessionConfig};
//! use mqtt_session::session::{ConnectionState, SessionController};
//! use mqtt_session::sink::LogSink;
//! use mqtt_session::transport::MqttTransport;
//!
//! # tokio_test::block_on(async {
//! let config = SessionConfig::new("localhost");
//! let transport = MqttTransport::new(config.clone());
//! let mut session = SessionController::new(transport, config);
//! let mut sink = LogSink;
//!
//! session.connect().await?;
//! while session.state() == ConnectionState::Connecting {
//!     session.dispatch_next(&mut sink).await;
//! }
//!
//! session.subscribe("sensors/#", QosLevel::AtLeastOnce).await?;
//! session.publish("sensors/temp", b"21.5", QosLevel::AtMostOnce).await?;
//!
//! session.disconnect().await?;
//! session.run_until_disconnected(&mut sink).await;
//! # Ok::<(), mqtt_session::error::SessionError>(())
//! # });
//! ```

pub mod config;
pub mod error;
pub mod observability;
pub mod session;
pub mod sink;
pub mod testing;
pub mod transport;

// Re-export the session surface
pub use config::{QosLevel, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use session::{ConnectionState, SessionController, SessionEvent};
pub use sink::{EventSink, LogSink};
pub use transport::{MqttTransport, Transport};
