//! Session core: state machine, event stream and controller
//!
//! The module is split into three focused sub-modules:
//!
//! - [`state`] - the connection lifecycle state machine (pure)
//! - [`events`] - the typed events delivered to the consumer
//! - [`controller`] - the command surface and the dispatch loop
//!
//! # Usage
//!
//! ```rust,no_run
//! use mqtt_session::config::SessionConfig;
//! use mqtt_session::session::SessionController;
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
//! session.dispatch_next(&mut sink).await;
//! # Ok::<(), mqtt_session::error::SessionError>(())
//! # });
//! ```

pub mod controller;
pub mod events;
pub mod state;

// Re-export public types for convenience
pub use controller::SessionController;
pub use events::SessionEvent;
pub use state::ConnectionState;
