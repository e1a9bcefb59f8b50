//! # Events
//!
//! The engine never formats text. Every state change of a request is reported as a
//! structured [`Event`] to an [`EventSink`], and the application decides how to
//! present it.
//!
//! Terminal events ([`EventKind::Completed`], [`EventKind::Declined`],
//! [`EventKind::Cancelled`]) are emitted exactly once per request.

use crate::clock::LogicalTime;
use crate::request::{DeclineReason, Operation, ResourceId, Ticket, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// Something that happened at logical time `at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub at: LogicalTime,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A request entered the system; `at` is its arrival time.
    Requested {
        ticket: Ticket,
        user: UserId,
        resource: ResourceId,
        op: Operation,
    },
    /// The request was admitted and now competes for the lock.
    TakenUp { ticket: Ticket, user: UserId },
    /// A DELETE removed the resource. Always followed by `Completed`.
    Deleted {
        ticket: Ticket,
        user: UserId,
        resource: ResourceId,
    },
    Completed { ticket: Ticket, user: UserId },
    Declined {
        ticket: Ticket,
        user: UserId,
        reason: DeclineReason,
    },
    Cancelled { ticket: Ticket, user: UserId },
    /// Every request is resolved; the run is over.
    Idle,
}

impl EventKind {
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            EventKind::Requested { ticket, .. }
            | EventKind::TakenUp { ticket, .. }
            | EventKind::Deleted { ticket, .. }
            | EventKind::Completed { ticket, .. }
            | EventKind::Declined { ticket, .. }
            | EventKind::Cancelled { ticket, .. } => Some(*ticket),
            EventKind::Idle => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::Completed { .. } | EventKind::Declined { .. } | EventKind::Cancelled { .. }
        )
    }
}

/// Destination for engine events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

#[async_trait]
impl EventSink for mpsc::Sender<Event> {
    async fn emit(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(event = ?e.0, "Event receiver closed; dropping event");
        }
    }
}
