//! # Logical Clock
//!
//! A single counter drives both arrival eligibility and patience deadlines. The
//! counter lives in a Tokio `watch` channel: [`Clock::tick`] bumps the value and
//! wakes every task parked in [`Clock::await_at_least`].
//!
//! Exactly one [`ClockDriver`] advances the counter during a run. Tests can skip the
//! driver and call [`Clock::tick`] by hand, or run under paused Tokio time so the
//! driver's interval fires deterministically.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, trace};

/// A point on the logical time line, in ticks since the start of the run.
pub type LogicalTime = u64;

/// Shared handle to the logical time counter. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct Clock {
    counter: Arc<watch::Sender<LogicalTime>>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Creates a clock at time 0.
    pub fn new() -> Self {
        let (counter, _) = watch::channel(0);
        Self {
            counter: Arc::new(counter),
        }
    }

    pub fn now(&self) -> LogicalTime {
        *self.counter.borrow()
    }

    /// Suspends until the counter reaches `target`, returning the time observed.
    pub async fn await_at_least(&self, target: LogicalTime) -> LogicalTime {
        let mut rx = self.counter.subscribe();
        // The sender lives as long as `self`, so the wait can only end by success.
        let seen = match rx.wait_for(|now| *now >= target).await {
            Ok(now) => *now,
            Err(_) => self.now(),
        };
        seen
    }

    /// Advances the counter by one and wakes all waiters.
    pub fn tick(&self) -> LogicalTime {
        let mut now = 0;
        self.counter.send_modify(|t| {
            *t += 1;
            now = *t;
        });
        now
    }

    /// Spawns the background task that ticks once per `period`.
    pub fn drive(&self, period: Duration) -> ClockDriver {
        let clock = self.clone();
        let (stop, mut stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(?period, "Clock driver started");

            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        let now = clock.tick();
                        trace!(now, "Tick");
                    }
                }
            }

            info!(now = clock.now(), "Clock driver stopped");
        });

        ClockDriver { stop, handle }
    }
}

/// Handle to the running clock task.
pub struct ClockDriver {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ClockDriver {
    /// Signals the driver to exit and waits for it.
    pub async fn stop(self) -> Result<(), JoinError> {
        let _ = self.stop.send(());
        self.handle.await
    }
}
