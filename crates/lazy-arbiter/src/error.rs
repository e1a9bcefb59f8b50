//! # Engine Errors
//!
//! A declined or cancelled request is an *outcome*, not an error: it is reported
//! through [`Outcome`](crate::request::Outcome) and the event stream. The types in
//! this module cover the conditions that stop a run instead.

use crate::request::RequestState;
use tokio::task::JoinError;

/// Invalid startup parameters. This is the only fatal class of input error and is
/// raised before any request is processed.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Resource count must be at least 1")]
    NoResources,
    #[error("Tick interval must be non-zero")]
    ZeroTick,
    #[error("Reader capacity must be at least 1 when it is enforced")]
    ZeroReaderCapacity,
}

/// A request tried to move between two states that the lifecycle does not connect.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Illegal request transition: {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: RequestState,
    pub to: RequestState,
}

/// Errors that abort a whole run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Dispatch task failed: {0}")]
    TaskFailed(#[from] JoinError),
    #[error("Clock driver failed: {0}")]
    ClockDriver(#[source] JoinError),
}
