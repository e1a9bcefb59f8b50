//! # Request Dispatcher
//!
//! Drives one request from `Pending` to a terminal state:
//!
//! 1. Wait for the clock to reach the admission time (arrival plus the configured
//!    take-up delay), or the patience deadline if that comes first.
//! 2. Cancel if the deadline has already been reached; such a request is never
//!    taken up.
//! 3. Decline if the resource is unknown or already deleted.
//! 4. Race the lock acquisition against the patience deadline.
//! 5. Hold the lock for the operation's service time, release it, complete.
//!
//! Once a request is running it always completes; only the wait for the lock can
//! be cancelled.

use crate::clock::{Clock, LogicalTime};
use crate::config::ArbiterConfig;
use crate::error::EngineError;
use crate::event::{Event, EventKind, EventSink};
use crate::lock::{Acquire, ResourceLock};
use crate::patience::PatienceTimer;
use crate::request::{DeclineReason, Operation, Outcome, Request, RequestState, Ticket};
use crate::table::ResourceTable;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Shared context for every dispatch task of a run. Cloning is cheap.
#[derive(Clone)]
pub struct RequestDispatcher {
    clock: Clock,
    table: Arc<ResourceTable>,
    config: Arc<ArbiterConfig>,
    sink: Arc<dyn EventSink>,
}

impl RequestDispatcher {
    pub fn new(
        clock: Clock,
        table: Arc<ResourceTable>,
        config: Arc<ArbiterConfig>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            clock,
            table,
            config,
            sink,
        }
    }

    /// Processes `request` to completion and returns its outcome.
    #[instrument(
        skip(self, request),
        fields(user = %request.user, resource = %request.resource, op = %request.op)
    )]
    pub async fn dispatch(&self, ticket: Ticket, request: Request) -> Result<Outcome, EngineError> {
        let mut tracker = Tracker::new(ticket);

        let deadline = request.patience_deadline(self.config.patience);
        let admit_at = request.arrival.saturating_add(self.config.admission_delay);
        let now = self.clock.await_at_least(admit_at.min(deadline)).await;
        tracker.enter(RequestState::Admitted)?;
        if now >= deadline {
            return self.cancel(&mut tracker, &request, deadline).await;
        }

        let lock = match self.table.get(request.resource) {
            Some(lock) if !lock.is_deleted() => lock,
            Some(_) => return self.decline(&mut tracker, &request, DeclineReason::Deleted).await,
            None => {
                return self
                    .decline(&mut tracker, &request, DeclineReason::UnknownResource)
                    .await
            }
        };

        self.emit(now, EventKind::TakenUp { ticket, user: request.user }).await;

        let timer = PatienceTimer::new(self.clock.clone(), deadline);
        match lock.try_acquire(request.op, &timer).await {
            Acquire::Granted => {}
            Acquire::TimedOut => {
                return self.cancel(&mut tracker, &request, timer.deadline()).await;
            }
            Acquire::Declined => {
                return self.decline(&mut tracker, &request, DeclineReason::Deleted).await;
            }
        }

        tracker.enter(RequestState::Running)?;
        let started = self.clock.now();
        debug!(%ticket, started, "Running");

        let finished = self.run_operation(ticket, lock, &request, started).await;
        tracker.enter(RequestState::Completed)?;
        info!(%ticket, started, finished, "Completed");
        self.emit(finished, EventKind::Completed { ticket, user: request.user }).await;
        Ok(Outcome::Completed)
    }

    /// Holds the granted lock for the service time of the operation, then releases
    /// it. A DELETE has nothing to release; the resource stays deleted.
    async fn run_operation(
        &self,
        ticket: Ticket,
        lock: &ResourceLock,
        request: &Request,
        started: LogicalTime,
    ) -> LogicalTime {
        let service = self.config.service_time(request.op);
        let done = self.clock.await_at_least(started.saturating_add(service)).await;

        match request.op {
            Operation::Read => lock.release_read(),
            Operation::Write => lock.release_write(),
            Operation::Delete => {
                let kind = EventKind::Deleted {
                    ticket,
                    user: request.user,
                    resource: request.resource,
                };
                self.emit(done, kind).await;
            }
        }
        done
    }

    async fn cancel(
        &self,
        tracker: &mut Tracker,
        request: &Request,
        deadline: LogicalTime,
    ) -> Result<Outcome, EngineError> {
        tracker.enter(RequestState::Cancelled)?;
        let at = self.clock.now();
        info!(ticket = %tracker.ticket, deadline, at, "Cancelled");
        let kind = EventKind::Cancelled {
            ticket: tracker.ticket,
            user: request.user,
        };
        self.emit(at, kind).await;
        Ok(Outcome::Cancelled)
    }

    async fn decline(
        &self,
        tracker: &mut Tracker,
        request: &Request,
        reason: DeclineReason,
    ) -> Result<Outcome, EngineError> {
        tracker.enter(RequestState::Declined)?;
        let at = self.clock.now();
        info!(ticket = %tracker.ticket, ?reason, at, "Declined");
        let kind = EventKind::Declined {
            ticket: tracker.ticket,
            user: request.user,
            reason,
        };
        self.emit(at, kind).await;
        Ok(Outcome::Declined(reason))
    }

    async fn emit(&self, at: LogicalTime, kind: EventKind) {
        self.sink.emit(Event { at, kind }).await;
    }
}

/// Current lifecycle state of the request being dispatched.
struct Tracker {
    ticket: Ticket,
    state: RequestState,
}

impl Tracker {
    fn new(ticket: Ticket) -> Self {
        Self {
            ticket,
            state: RequestState::Pending,
        }
    }

    fn enter(&mut self, next: RequestState) -> Result<(), EngineError> {
        self.state = self.state.advance(next)?;
        Ok(())
    }
}
