//! # Recording Sink
//!
//! [`RecordingSink`] keeps every emitted [`Event`] in memory so tests can assert on
//! the exact timeline of a run.
//!
//! ```rust
//! use lazy_arbiter::mock::RecordingSink;
//! use lazy_arbiter::{AdmissionController, ArbiterConfig, Operation, Request};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() {
//!     let sink = RecordingSink::new();
//!     let config = ArbiterConfig { read_time: 2, ..Default::default() };
//!     let controller = AdmissionController::new(config, Arc::new(sink.clone())).unwrap();
//!
//!     let report = controller.run(vec![Request::new(1, 1, Operation::Read, 0)]).await.unwrap();
//!     assert_eq!(report.finished_at, 2);
//!     assert_eq!(sink.terminal_events().len(), 1);
//! }
//! ```

use crate::event::{Event, EventKind, EventSink};
use crate::request::Ticket;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// An [`EventSink`] that stores events in emission order. Clones share storage.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events emitted so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events belonging to one request, in emission order.
    pub fn timeline(&self, ticket: Ticket) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.ticket() == Some(ticket))
            .collect()
    }

    pub fn terminal_events(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.is_terminal())
            .collect()
    }

    /// The single terminal event of `ticket`, if it has one.
    pub fn terminal_for(&self, ticket: Ticket) -> Option<Event> {
        self.timeline(ticket)
            .into_iter()
            .find(|e| e.kind.is_terminal())
    }

    pub fn idle_at(&self) -> Option<u64> {
        self.events()
            .into_iter()
            .find(|e| e.kind == EventKind::Idle)
            .map(|e| e.at)
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
