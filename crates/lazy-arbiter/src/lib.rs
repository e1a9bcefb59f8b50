//! # LAZY Arbiter
//!
//! A concurrent arbitration engine for access to a fixed set of resources
//! ("files"). Users issue timestamped READ, WRITE and DELETE requests; the engine
//! enforces readers-writer-delete exclusion per resource, cancels requests whose
//! patience runs out before they get the lock, and invalidates a resource for good
//! once it has been deleted.
//!
//! ## Architecture Overview
//!
//! The engine is built bottom-up from small, independently testable pieces:
//!
//! 1. **Time** ([`Clock`]) - one logical counter drives arrivals and deadlines.
//! 2. **Exclusion** ([`ResourceLock`], [`ResourceTable`]) - per-resource state with
//!    wake-on-release waiting. No lock spans more than one resource.
//! 3. **Patience** ([`PatienceTimer`]) - races an acquisition against a deadline.
//! 4. **Dispatch** ([`RequestDispatcher`]) - walks one request through its lifecycle.
//! 5. **Admission** ([`AdmissionController`]) - spawns a task per request and
//!    reports when everything is resolved.
//!
//! The engine does not parse input and does not format output. Requests come in as
//! [`Request`] values and every state change goes out as an [`Event`] through an
//! [`EventSink`].
//!
//! ## Concurrency Model
//!
//! - One Tokio task per request plus one clock-driver task.
//! - Requests on different resources never contend.
//! - Requests on the same resource are ordered only by the exclusion rules; there
//!   is no FIFO guarantee.
//! - Once a request runs it always completes.
//!
//! ## Example
//!
//! ```rust
//! use lazy_arbiter::mock::RecordingSink;
//! use lazy_arbiter::{AdmissionController, ArbiterConfig, DeclineReason, Operation, Outcome, Request, Ticket};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() {
//!     let sink = RecordingSink::new();
//!     let config = ArbiterConfig { delete_time: 1, patience: 5, ..Default::default() };
//!     let controller = AdmissionController::new(config, Arc::new(sink.clone())).unwrap();
//!
//!     let report = controller
//!         .run(vec![
//!             Request::new(1, 1, Operation::Delete, 0),
//!             Request::new(2, 1, Operation::Read, 1),
//!         ])
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(report.outcome(Ticket(0)), Some(Outcome::Completed));
//!     assert_eq!(report.outcome(Ticket(1)), Some(Outcome::Declined(DeclineReason::Deleted)));
//! }
//! ```
//!
//! ## Testing
//!
//! Run tests under paused Tokio time (`#[tokio::test(start_paused = true)]`) and the
//! clock driver ticks deterministically. See the [`mock`] module for a sink that
//! records events.

pub mod admission;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod lock;
pub mod mock;
pub mod patience;
pub mod request;
pub mod table;

// Re-export core types for convenience
pub use admission::{AdmissionController, RunReport};
pub use clock::{Clock, ClockDriver, LogicalTime};
pub use config::ArbiterConfig;
pub use dispatcher::RequestDispatcher;
pub use error::{ConfigError, EngineError, TransitionError};
pub use event::{Event, EventKind, EventSink};
pub use lock::{Acquire, LockPolicy, LockSnapshot, ResourceLock};
pub use patience::PatienceTimer;
pub use request::{
    DeclineReason, Operation, Outcome, Request, RequestState, ResourceId, Ticket, UnknownOperation,
    UserId,
};
pub use table::ResourceTable;
