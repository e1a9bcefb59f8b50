//! # Patience Timer
//!
//! Races a lock acquisition against a request's deadline on the logical [`Clock`].
//! When the deadline and the grant become possible in the same tick, the deadline
//! wins: the user had already given up.

use crate::clock::{Clock, LogicalTime};
use crate::lock::Acquire;
use std::future::Future;
use tracing::debug;

/// The deadline of one request.
#[derive(Debug, Clone)]
pub struct PatienceTimer {
    clock: Clock,
    deadline: LogicalTime,
}

impl PatienceTimer {
    pub fn new(clock: Clock, deadline: LogicalTime) -> Self {
        Self { clock, deadline }
    }

    pub fn deadline(&self) -> LogicalTime {
        self.deadline
    }

    pub fn has_expired(&self) -> bool {
        self.clock.now() >= self.deadline
    }

    /// Resolves once the deadline has been reached.
    pub async fn expired(&self) -> LogicalTime {
        self.clock.await_at_least(self.deadline).await
    }

    /// Runs `acquire` until it resolves or the deadline passes.
    ///
    /// `acquire` is dropped on timeout, so it must leave the lock untouched unless it
    /// completes with [`Acquire::Granted`].
    pub async fn race<F>(&self, acquire: F) -> Acquire
    where
        F: Future<Output = Acquire>,
    {
        tokio::select! {
            biased;
            at = self.expired() => {
                debug!(deadline = self.deadline, at, "Patience exhausted");
                Acquire::TimedOut
            }
            outcome = acquire => outcome,
        }
    }
}
