//! # Requests
//!
//! Value types for a user's request and the lifecycle it moves through.
//!
//! ```text
//! Pending ──▶ Admitted ──▶ Running ──▶ Completed
//!                │
//!                ├──▶ Declined   (unknown or deleted resource)
//!                └──▶ Cancelled  (patience deadline before grant)
//! ```

use crate::clock::LogicalTime;
use crate::error::TransitionError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Identifies the user who issued a request. Not unique across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a resource ("file"). Valid ids are `1..=resource_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

impl Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a request in the admission set; unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket(pub usize);

impl Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Read,
    Write,
    Delete,
}

impl Operation {
    /// Whether the operation needs the resource to itself.
    pub fn is_exclusive(self) -> bool {
        !matches!(self, Operation::Read)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Read => "READ",
            Operation::Write => "WRITE",
            Operation::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READ" => Ok(Operation::Read),
            "WRITE" => Ok(Operation::Write),
            "DELETE" => Ok(Operation::Delete),
            other => Err(UnknownOperation(other.to_string())),
        }
    }
}

/// A parsed user request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub user: UserId,
    pub resource: ResourceId,
    pub op: Operation,
    /// Logical time at which the request becomes eligible.
    pub arrival: LogicalTime,
}

impl Request {
    pub fn new(user: u32, resource: u32, op: Operation, arrival: LogicalTime) -> Self {
        Self {
            user: UserId(user),
            resource: ResourceId(resource),
            op,
            arrival,
        }
    }

    /// Time at which the user gives up if the lock has not been granted.
    pub fn patience_deadline(&self, patience: LogicalTime) -> LogicalTime {
        self.arrival.saturating_add(patience)
    }
}

/// Where a request currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestState {
    Pending,
    Admitted,
    Running,
    Completed,
    Cancelled,
    Declined,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Completed | RequestState::Cancelled | RequestState::Declined
        )
    }

    /// Moves to `next` if the lifecycle allows it.
    pub fn advance(self, next: RequestState) -> Result<RequestState, TransitionError> {
        use RequestState::*;
        match (self, next) {
            (Pending, Admitted)
            | (Admitted, Running)
            | (Admitted, Declined)
            | (Admitted, Cancelled)
            | (Running, Completed) => Ok(next),
            (from, to) => Err(TransitionError { from, to }),
        }
    }
}

/// Why a request was refused at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclineReason {
    /// The id is outside the configured range.
    UnknownResource,
    /// The resource has been deleted earlier in the run.
    Deleted,
}

/// Terminal result of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Completed,
    Declined(DeclineReason),
    Cancelled,
}
