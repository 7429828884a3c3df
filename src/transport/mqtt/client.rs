//! Impure I/O for the MQTT transport
//!
//! Owns the rumqttc client and the spawned network task. The task is the
//! "network thread" of the session model: it polls the protocol event loop,
//! routes each event through the pure router and pushes at most one session
//! event per cycle through an unbounded, non-blocking send. It never touches
//! consumer-side state and never blocks on consumer-side work.

use super::connection::{configure_mqtt_options, to_protocol_qos, MqttError};
use super::router;
use crate::config::{QosLevel, SessionConfig};
use crate::session::events::SessionEvent;
use crate::transport::Transport;
use rumqttc::AsyncClient;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// MQTT-backed transport adapter.
///
/// Construction is cheap and performs no I/O; the underlying protocol
/// client exists from `connect` until `disconnect` (or connection loss).
/// One adapter never runs two protocol clients at once.
pub struct MqttTransport {
    config: SessionConfig,
    events_tx: Option<mpsc::UnboundedSender<SessionEvent>>,
    client: Option<AsyncClient>,
    network_task: Option<JoinHandle<()>>,
    shutdown_tx: Option<watch::Sender<bool>>,
}

impl MqttTransport {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            events_tx: None,
            client: None,
            network_task: None,
            shutdown_tx: None,
        }
    }

    /// Run the network side: poll, route, enqueue.
    ///
    /// Exits on shutdown signal, on a terminal event, on poll failure, or
    /// when the receiving side of the channel is gone. No reconnection is
    /// attempted; a lost connection ends the task.
    async fn network_loop(
        mut event_loop: rumqttc::EventLoop,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        let _ = events_tx.send(SessionEvent::Disconnected {
                            result_code: 0,
                            requested: true,
                        });
                        break;
                    }
                }
                polled = event_loop.poll() => match polled {
                    Ok(event) => {
                        if let Some(session_event) = router::route_incoming(&event) {
                            let terminal = session_event.is_terminal();
                            if events_tx.send(session_event).is_err() {
                                debug!("event channel closed, stopping network task");
                                break;
                            }
                            if terminal {
                                break;
                            }
                        }
                    }
                    Err(err) => {
                        error!("MQTT event loop error: {err}");
                        let _ = events_tx.send(router::route_connection_error(&err));
                        break;
                    }
                }
            }
        }
        debug!("MQTT network task stopped");
    }
}

#[async_trait::async_trait]
impl Transport for MqttTransport {
    type Error = MqttError;

    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<SessionEvent>) {
        self.events_tx = Some(sender);
    }

    async fn connect(&mut self) -> Result<(), Self::Error> {
        if let Some(task) = &self.network_task {
            if !task.is_finished() {
                return Err(MqttError::AlreadyRunning);
            }
        }
        // A finished task is a dead previous connection; clear its leftovers.
        self.network_task = None;
        self.client = None;
        self.shutdown_tx = None;

        let events_tx = self.events_tx.clone().ok_or(MqttError::NoEventSender)?;
        let options = configure_mqtt_options(&self.config)?;

        let (client, event_loop) = AsyncClient::new(options, 10);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            host = %self.config.broker_host,
            port = self.config.port,
            "starting MQTT network task"
        );
        let task = tokio::spawn(Self::network_loop(event_loop, events_tx, shutdown_rx));

        self.client = Some(client);
        self.shutdown_tx = Some(shutdown_tx);
        self.network_task = Some(task);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }

        // Best effort; the request channel may already be gone if the
        // network task exited first.
        if let Some(client) = self.client.take() {
            let _ = client.disconnect().await;
        }

        if let Some(task) = self.network_task.take() {
            let abort = task.abort_handle();
            match tokio::time::timeout(Duration::from_secs(2), task).await {
                Ok(Ok(())) => debug!("network task shut down gracefully"),
                Ok(Err(e)) if !e.is_cancelled() => {
                    warn!("network task ended with error: {e}");
                }
                Err(_) => {
                    warn!("network task did not stop in time, aborting");
                    abort.abort();
                }
                _ => {}
            }
        }

        Ok(())
    }

    async fn subscribe(&mut self, filter: &str, qos: QosLevel) -> Result<(), Self::Error> {
        let client = self.client.as_ref().ok_or(MqttError::NotStarted)?;
        client.subscribe(filter, to_protocol_qos(qos)).await?;
        Ok(())
    }

    async fn unsubscribe(&mut self, filter: &str) -> Result<(), Self::Error> {
        let client = self.client.as_ref().ok_or(MqttError::NotStarted)?;
        client.unsubscribe(filter).await?;
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QosLevel,
    ) -> Result<(), Self::Error> {
        let client = self.client.as_ref().ok_or(MqttError::NotStarted)?;
        client
            .publish(topic, to_protocol_qos(qos), false, payload.to_vec())
            .await?;
        Ok(())
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        // No async in Drop; signal the task and abort it. Consumers wanting
        // a clean DISCONNECT on the wire call disconnect() explicitly.
        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(true);
        }
        if let Some(task) = self.network_task.take() {
            task.abort();
        }
    }
}
