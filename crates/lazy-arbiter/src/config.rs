//! # Run Configuration
//!
//! [`ArbiterConfig`] is built once at startup and shared read-only by every task
//! of a run.

use crate::clock::LogicalTime;
use crate::error::ConfigError;
use crate::lock::LockPolicy;
use crate::request::Operation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Static parameters of a single arbitration run.
///
/// All durations except `tick_millis` are expressed in logical ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Service time of a READ.
    pub read_time: LogicalTime,
    /// Service time of a WRITE.
    pub write_time: LogicalTime,
    /// Service time of a DELETE.
    pub delete_time: LogicalTime,
    /// Number of resources; valid ids are `1..=resource_count`.
    pub resource_count: u32,
    /// Concurrent readers allowed on one resource. Only a hard cap when
    /// `enforce_reader_capacity` is set.
    pub reader_capacity: u32,
    /// Ticks a user waits after arrival before giving up on a request.
    pub patience: LogicalTime,
    /// Ticks between arrival and the moment the request is taken up.
    pub admission_delay: LogicalTime,
    pub enforce_reader_capacity: bool,
    /// Readers queue behind a pending DELETE instead of overtaking it.
    pub delete_priority: bool,
    /// Wall-clock length of one logical tick.
    pub tick_millis: u64,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            read_time: 1,
            write_time: 1,
            delete_time: 1,
            resource_count: 1,
            reader_capacity: 1,
            patience: 5,
            admission_delay: 0,
            enforce_reader_capacity: false,
            delete_priority: false,
            tick_millis: 1000,
        }
    }
}

impl ArbiterConfig {
    /// Returns the configured service time for `op`.
    pub fn service_time(&self, op: Operation) -> LogicalTime {
        match op {
            Operation::Read => self.read_time,
            Operation::Write => self.write_time,
            Operation::Delete => self.delete_time,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    /// Lock policy applied to every resource of the run.
    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy {
            reader_capacity: self.enforce_reader_capacity.then_some(self.reader_capacity),
            delete_priority: self.delete_priority,
        }
    }

    /// Rejects settings under which a run cannot make progress.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resource_count == 0 {
            return Err(ConfigError::NoResources);
        }
        if self.tick_millis == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.enforce_reader_capacity && self.reader_capacity == 0 {
            return Err(ConfigError::ZeroReaderCapacity);
        }
        Ok(())
    }
}
