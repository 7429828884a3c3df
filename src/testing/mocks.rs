//! Mock implementations for testing
//!
//! `MockTransport` stands in for the MQTT adapter: it records every command
//! the controller issues and lets tests play the network side by emitting
//! events through a [`MockHandle`], exactly the way the real network task
//! would. `RecordingSink` captures the dispatched stream for assertions.

use crate::config::QosLevel;
use crate::session::events::SessionEvent;
use crate::sink::EventSink;
use crate::transport::Transport;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

/// Error type produced by the mock transport's scripted failures.
#[derive(Debug, Error)]
#[error("mock transport failure: {0}")]
pub struct MockTransportError(pub &'static str);

#[derive(Debug, Default)]
struct MockInner {
    sender: Mutex<Option<mpsc::UnboundedSender<SessionEvent>>>,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    subscribes: Mutex<Vec<(String, QosLevel)>>,
    unsubscribes: Mutex<Vec<String>>,
    publishes: Mutex<Vec<(String, Vec<u8>, QosLevel)>>,
    fail_connect: bool,
    fail_operations: bool,
}

/// Mock transport for testing
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose `connect` fails synchronously.
    pub fn failing_connect() -> Self {
        Self {
            inner: Arc::new(MockInner {
                fail_connect: true,
                ..Default::default()
            }),
        }
    }

    /// Transport whose subscribe/unsubscribe/publish are rejected.
    pub fn failing_operations() -> Self {
        Self {
            inner: Arc::new(MockInner {
                fail_operations: true,
                ..Default::default()
            }),
        }
    }

    /// Handle for driving the mock from the test after the transport moved
    /// into the controller.
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            inner: self.inner.clone(),
        }
    }
}

/// Test-side view of a [`MockTransport`]: emits events into the session's
/// channel and exposes the recorded command history.
#[derive(Debug, Clone)]
pub struct MockHandle {
    inner: Arc<MockInner>,
}

impl MockHandle {
    /// Play the network side: push an event as the transport's event-loop
    /// task would.
    pub fn emit(&self, event: SessionEvent) {
        if let Some(sender) = &*self.inner.sender.lock().unwrap() {
            let _ = sender.send(event);
        }
    }

    pub fn connect_calls(&self) -> usize {
        self.inner.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.inner.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.inner.subscribes.lock().unwrap().len()
    }

    pub fn subscribed_filters(&self) -> Vec<(String, QosLevel)> {
        self.inner.subscribes.lock().unwrap().clone()
    }

    pub fn unsubscribed_filters(&self) -> Vec<String> {
        self.inner.unsubscribes.lock().unwrap().clone()
    }

    pub fn publish_calls(&self) -> Vec<(String, Vec<u8>, QosLevel)> {
        self.inner.publishes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    type Error = MockTransportError;

    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<SessionEvent>) {
        *self.inner.sender.lock().unwrap() = Some(sender);
    }

    async fn connect(&mut self) -> Result<(), Self::Error> {
        self.inner.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_connect {
            return Err(MockTransportError("connect refused"));
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.inner.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&mut self, filter: &str, qos: QosLevel) -> Result<(), Self::Error> {
        if self.inner.fail_operations {
            return Err(MockTransportError("subscribe rejected"));
        }
        self.inner
            .subscribes
            .lock()
            .unwrap()
            .push((filter.to_string(), qos));
        Ok(())
    }

    async fn unsubscribe(&mut self, filter: &str) -> Result<(), Self::Error> {
        if self.inner.fail_operations {
            return Err(MockTransportError("unsubscribe rejected"));
        }
        self.inner
            .unsubscribes
            .lock()
            .unwrap()
            .push(filter.to_string());
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QosLevel,
    ) -> Result<(), Self::Error> {
        if self.inner.fail_operations {
            return Err(MockTransportError("publish rejected"));
        }
        self.inner
            .publishes
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_vec(), qos));
        Ok(())
    }
}

/// Sink that records every delivered event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SessionEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn deliver(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_commands() {
        let mut transport = MockTransport::new();
        let handle = transport.handle();

        transport.connect().await.unwrap();
        transport
            .subscribe("a/#", QosLevel::AtLeastOnce)
            .await
            .unwrap();
        transport
            .publish("a/b", b"x", QosLevel::AtMostOnce)
            .await
            .unwrap();
        transport.disconnect().await.unwrap();

        assert_eq!(handle.connect_calls(), 1);
        assert_eq!(
            handle.subscribed_filters(),
            vec![("a/#".to_string(), QosLevel::AtLeastOnce)]
        );
        assert_eq!(
            handle.publish_calls(),
            vec![("a/b".to_string(), b"x".to_vec(), QosLevel::AtMostOnce)]
        );
        assert_eq!(handle.disconnect_calls(), 1);
    }

    #[tokio::test]
    async fn test_emit_reaches_registered_sender() {
        let mut transport = MockTransport::new();
        let handle = transport.handle();
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.set_event_sender(tx);

        handle.emit(SessionEvent::Connected { result_code: 0 });
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::Connected { result_code: 0 })
        );
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let mut failing = MockTransport::failing_connect();
        assert!(failing.connect().await.is_err());

        let mut rejecting = MockTransport::failing_operations();
        assert!(rejecting
            .subscribe("a", QosLevel::AtMostOnce)
            .await
            .is_err());
        assert!(rejecting.publish("a", b"x", QosLevel::AtMostOnce).await.is_err());
    }
}
