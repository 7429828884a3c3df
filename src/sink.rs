//! Consumer sink for the session event stream
//!
//! Anything that accepts an ordered stream of events can be a sink: a
//! status line, a log, a message pane. Sinks run on the dispatch side only;
//! the network task can never call into one.

use crate::session::events::SessionEvent;
use tracing::{info, warn};

/// Receiver of dispatched session events, in arrival order.
pub trait EventSink {
    fn deliver(&mut self, event: &SessionEvent);
}

/// Sink that appends every event to the structured log.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn deliver(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::CommandFailed { .. } => warn!(target: "session", "{event}"),
            _ => info!(target: "session", "{event}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sink_accepts_all_variants() {
        let mut sink = LogSink;
        sink.deliver(&SessionEvent::Connected { result_code: 0 });
        sink.deliver(&SessionEvent::message("a/b", b"x"));
        sink.deliver(&SessionEvent::failed("disconnect", "timed out"));
    }
}
