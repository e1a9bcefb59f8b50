//! # Resource Lock
//!
//! Readers-writer-delete exclusion for a single resource: any number of readers,
//! or one writer, or one delete, never mixed. A granted delete marks the resource
//! deleted for the rest of the run and has no release.
//!
//! ## Waiting
//!
//! State lives behind a short-lived `std::sync::Mutex` that is never held across an
//! `.await`. Blocked callers park on a [`Notify`] and re-check the state when a
//! release (or a delete) wakes them. Each waiter registers interest *before*
//! inspecting the state, so a release between the check and the park is not lost.
//!
//! Every `try_acquire_*` call is bounded by a [`PatienceTimer`]. Dropping the wait on
//! timeout leaves the state untouched: the only mutation happens in the same
//! synchronous step that returns [`Acquire::Granted`].

use crate::patience::PatienceTimer;
use crate::request::{Operation, ResourceId};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::{debug, trace};

/// Result of an acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Granted,
    TimedOut,
    /// The resource is deleted.
    Declined,
}

/// Admission rules shared by every lock of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockPolicy {
    /// Hard cap on concurrent readers, if any.
    pub reader_capacity: Option<u32>,
    /// Readers wait while a delete is queued.
    pub delete_priority: bool,
}

/// Point-in-time copy of a lock's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockSnapshot {
    pub active_readers: u32,
    pub writer_active: bool,
    pub deleted: bool,
    pub pending_deletes: u32,
}

enum Admission {
    Grant,
    Wait,
    Decline,
}

#[derive(Debug, Default)]
struct LockState {
    active_readers: u32,
    writer_active: bool,
    deleted: bool,
    pending_deletes: u32,
}

impl LockState {
    fn is_quiescent(&self) -> bool {
        self.active_readers == 0 && !self.writer_active
    }

    fn admit(&mut self, op: Operation, policy: &LockPolicy) -> Admission {
        if self.deleted {
            return Admission::Decline;
        }
        match op {
            Operation::Read => {
                let full = policy
                    .reader_capacity
                    .is_some_and(|cap| self.active_readers >= cap);
                let yielding = policy.delete_priority && self.pending_deletes > 0;
                if self.writer_active || full || yielding {
                    return Admission::Wait;
                }
                self.active_readers += 1;
            }
            Operation::Write => {
                if !self.is_quiescent() {
                    return Admission::Wait;
                }
                self.writer_active = true;
            }
            Operation::Delete => {
                if !self.is_quiescent() {
                    return Admission::Wait;
                }
                self.deleted = true;
            }
        }
        Admission::Grant
    }
}

/// The lock guarding one resource.
#[derive(Debug)]
pub struct ResourceLock {
    id: ResourceId,
    policy: LockPolicy,
    state: Mutex<LockState>,
    changed: Notify,
}

impl ResourceLock {
    pub fn new(id: ResourceId, policy: LockPolicy) -> Self {
        Self {
            id,
            policy,
            state: Mutex::new(LockState::default()),
            changed: Notify::new(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn is_deleted(&self) -> bool {
        self.state().deleted
    }

    pub fn snapshot(&self) -> LockSnapshot {
        let state = self.state();
        LockSnapshot {
            active_readers: state.active_readers,
            writer_active: state.writer_active,
            deleted: state.deleted,
            pending_deletes: state.pending_deletes,
        }
    }

    pub async fn try_acquire_read(&self, timer: &PatienceTimer) -> Acquire {
        timer.race(self.wait_for_grant(Operation::Read)).await
    }

    pub async fn try_acquire_write(&self, timer: &PatienceTimer) -> Acquire {
        timer.race(self.wait_for_grant(Operation::Write)).await
    }

    /// On grant the resource is deleted for good; there is no matching release.
    pub async fn try_acquire_delete(&self, timer: &PatienceTimer) -> Acquire {
        timer.race(self.wait_for_grant(Operation::Delete)).await
    }

    /// Dispatches to the acquire call matching `op`.
    pub async fn try_acquire(&self, op: Operation, timer: &PatienceTimer) -> Acquire {
        match op {
            Operation::Read => self.try_acquire_read(timer).await,
            Operation::Write => self.try_acquire_write(timer).await,
            Operation::Delete => self.try_acquire_delete(timer).await,
        }
    }

    pub fn release_read(&self) {
        let mut state = self.state();
        debug_assert!(state.active_readers > 0, "release_read without a reader");
        state.active_readers = state.active_readers.saturating_sub(1);
        let readers = state.active_readers;
        drop(state);

        trace!(resource = %self.id, readers, "Read released");
        if readers == 0 || self.policy.reader_capacity.is_some() {
            self.changed.notify_waiters();
        }
    }

    pub fn release_write(&self) {
        let mut state = self.state();
        debug_assert!(state.writer_active, "release_write without a writer");
        state.writer_active = false;
        drop(state);

        trace!(resource = %self.id, "Write released");
        self.changed.notify_waiters();
    }

    async fn wait_for_grant(&self, op: Operation) -> Acquire {
        let _queued = (op == Operation::Delete).then(|| QueuedDelete::register(self));

        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let admission = {
                let mut state = self.state();
                state.admit(op, &self.policy)
            };

            match admission {
                Admission::Grant => {
                    debug!(resource = %self.id, %op, "Granted");
                    if op == Operation::Delete {
                        // Blocked callers must observe the deletion and give up.
                        self.changed.notify_waiters();
                    }
                    return Acquire::Granted;
                }
                Admission::Decline => return Acquire::Declined,
                Admission::Wait => trace!(resource = %self.id, %op, "Waiting"),
            }

            notified.await;
        }
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a delete as queued on a lock for as long as it waits.
struct QueuedDelete<'a> {
    lock: &'a ResourceLock,
}

impl<'a> QueuedDelete<'a> {
    fn register(lock: &'a ResourceLock) -> Self {
        lock.state().pending_deletes += 1;
        Self { lock }
    }
}

impl Drop for QueuedDelete<'_> {
    fn drop(&mut self) {
        let mut state = self.lock.state();
        state.pending_deletes = state.pending_deletes.saturating_sub(1);
        drop(state);
        if self.lock.policy.delete_priority {
            self.lock.changed.notify_waiters();
        }
    }
}
