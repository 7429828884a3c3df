//! Session controller: command surface and dispatch loop
//!
//! The controller is the aggregate root of one broker session. It owns the
//! connection state machine, the ordered subscription set, the transport
//! handle and the consuming end of the event channel. Commands run on the
//! consumer side and call into the transport synchronously; everything the
//! network produces arrives through the channel and is applied here, so no
//! state is shared across the thread boundary.

use crate::config::{QosLevel, SessionConfig};
use crate::error::{SessionError, SessionResult};
use crate::session::events::SessionEvent;
use crate::session::state::{transition_on_event, ConnectionState};
use crate::sink::EventSink;
use crate::transport::Transport;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub struct SessionController<T: Transport> {
    config: SessionConfig,
    transport: T,
    state: ConnectionState,
    subscriptions: BTreeMap<String, QosLevel>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    disconnect_deadline: Option<Instant>,
}

impl<T: Transport> SessionController<T> {
    /// Create a session around a transport. Builds the event channel and
    /// hands the producer end to the transport; no I/O happens until
    /// `connect`.
    pub fn new(mut transport: T, config: SessionConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        transport.set_event_sender(events_tx.clone());
        Self {
            config,
            transport,
            state: ConnectionState::Disconnected,
            subscriptions: BTreeMap::new(),
            events_tx,
            events_rx,
            disconnect_deadline: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Active subscriptions, ordered by topic filter.
    pub fn subscriptions(&self) -> &BTreeMap<String, QosLevel> {
        &self.subscriptions
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a connection attempt. The broker's verdict arrives later as a
    /// `Connected` event; a synchronous transport failure (malformed
    /// address, second client instance) returns here and leaves the
    /// session `Disconnected`.
    pub async fn connect(&mut self) -> SessionResult<()> {
        if !self.state.can_connect() {
            return Err(SessionError::AlreadyConnecting { state: self.state });
        }
        self.state = ConnectionState::Connecting;
        info!(
            host = %self.config.broker_host,
            port = self.config.port,
            "connecting to broker"
        );
        if let Err(e) = self.transport.connect().await {
            self.state = ConnectionState::Disconnected;
            return Err(SessionError::Connection(Box::new(e)));
        }
        Ok(())
    }

    /// Request a disconnect and arm the watchdog. The terminal event
    /// arrives through the channel, or the watchdog forces the state after
    /// the configured timeout.
    pub async fn disconnect(&mut self) -> SessionResult<()> {
        if !self.state.can_disconnect() {
            return Err(SessionError::NotConnected { state: self.state });
        }
        self.state = ConnectionState::Disconnecting;
        self.disconnect_deadline = Some(Instant::now() + self.config.disconnect_timeout());
        if let Err(e) = self.transport.disconnect().await {
            // The transport could not even start the teardown; fall back to
            // a local one so the session stays usable for a later connect.
            self.teardown();
            return Err(SessionError::Connection(Box::new(e)));
        }
        Ok(())
    }

    /// Subscribe to a topic filter. Re-subscribing an existing filter
    /// updates its QoS in place.
    pub async fn subscribe(&mut self, filter: &str, qos: QosLevel) -> SessionResult<()> {
        self.ensure_operational()?;
        if filter.is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        self.transport
            .subscribe(filter, qos)
            .await
            .map_err(|e| SessionError::Protocol(Box::new(e)))?;
        self.subscriptions.insert(filter.to_string(), qos);
        self.push_event(SessionEvent::ack(format!("subscribed {filter}")));
        Ok(())
    }

    /// Remove a topic filter subscription.
    pub async fn unsubscribe(&mut self, filter: &str) -> SessionResult<()> {
        self.ensure_operational()?;
        if filter.is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        self.transport
            .unsubscribe(filter)
            .await
            .map_err(|e| SessionError::Protocol(Box::new(e)))?;
        self.subscriptions.remove(filter);
        self.push_event(SessionEvent::ack(format!("unsubscribed {filter}")));
        Ok(())
    }

    /// Publish a payload. Returns at enqueue-to-send; broker-side delivery
    /// tracking, when the QoS calls for it, stays inside the transport.
    pub async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QosLevel,
    ) -> SessionResult<()> {
        self.ensure_operational()?;
        if topic.is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        self.transport
            .publish(topic, payload, qos)
            .await
            .map_err(|e| SessionError::Protocol(Box::new(e)))?;
        self.push_event(SessionEvent::ack(format!("published {topic}")));
        Ok(())
    }

    /// Drain every queued event, in arrival order, forwarding each to the
    /// sink. Non-blocking; this is the polling dispatch mode, and a single
    /// call delivers a whole burst that accumulated while the caller was
    /// busy elsewhere.
    pub fn pump<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.apply(&event) {
                sink.deliver(&event);
                delivered += 1;
            }
        }
        if self.watchdog_expired() {
            delivered += self.fire_watchdog(sink);
        }
        delivered
    }

    /// Await the next event (or the disconnect watchdog, whichever fires
    /// first), then drain the rest of the queue. Cancel-safe, so callers
    /// can `select!` it against a shutdown signal. Returns the number of
    /// events forwarded to the sink.
    pub async fn dispatch_next<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let event = match self.disconnect_deadline {
            Some(deadline) => {
                tokio::select! {
                    event = self.events_rx.recv() => event,
                    _ = tokio::time::sleep_until(deadline) => {
                        let fired = self.fire_watchdog(sink);
                        return fired + self.pump(sink);
                    }
                }
            }
            None => self.events_rx.recv().await,
        };

        let mut delivered = 0;
        if let Some(event) = event {
            if self.apply(&event) {
                sink.deliver(&event);
                delivered += 1;
            }
        }
        delivered + self.pump(sink)
    }

    /// Keep dispatching until the session reaches `Disconnected`. Intended
    /// for teardown: call after `disconnect()` (or once a terminal event is
    /// expected) to flush the stream; the watchdog guarantees progress.
    pub async fn run_until_disconnected<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let mut delivered = 0;
        while self.state != ConnectionState::Disconnected {
            delivered += self.dispatch_next(sink).await;
        }
        delivered
    }

    fn ensure_operational(&self) -> SessionResult<()> {
        if self.state.can_operate() {
            Ok(())
        } else {
            Err(SessionError::NotConnected { state: self.state })
        }
    }

    fn push_event(&self, event: SessionEvent) {
        // Cannot fail: the receiving end lives in self.
        let _ = self.events_tx.send(event);
    }

    /// Apply one drained event to the state machine. Returns whether the
    /// event is forwarded to the sink; a terminal event arriving after the
    /// session already reached `Disconnected` (a late transport
    /// notification behind the watchdog) is dropped so the consumer sees
    /// exactly one end-of-session notification.
    fn apply(&mut self, event: &SessionEvent) -> bool {
        if event.is_terminal() && self.state == ConnectionState::Disconnected {
            debug!("dropping late terminal event: {event}");
            return false;
        }
        let next = transition_on_event(self.state, event);
        if next != self.state {
            debug!(from = %self.state, to = %next, "connection state change");
            self.state = next;
            if next == ConnectionState::Disconnected {
                self.teardown();
            }
        }
        true
    }

    fn watchdog_expired(&self) -> bool {
        self.state == ConnectionState::Disconnecting
            && self
                .disconnect_deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn fire_watchdog<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        warn!("disconnect watchdog expired, forcing local disconnect");
        let timeout = self.config.disconnect_timeout();
        self.teardown();
        let event = SessionEvent::failed("disconnect", SessionError::DisconnectTimeout(timeout));
        sink.deliver(&event);
        1
    }

    /// Session teardown: terminal state, subscriptions gone, watchdog off.
    fn teardown(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.subscriptions.clear();
        self.disconnect_deadline = None;
    }
}
