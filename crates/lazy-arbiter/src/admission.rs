//! # Admission Controller
//!
//! Owns everything a run needs: the configuration, the resource table, the clock
//! and the event sink. [`AdmissionController::run`] starts the clock driver, spawns
//! one dispatch task per request, waits until every request is resolved and then
//! stops the driver.
//!
//! Nothing here is process-global, so independent runs can share a process (and a
//! test binary).

use crate::clock::{Clock, LogicalTime};
use crate::config::ArbiterConfig;
use crate::dispatcher::RequestDispatcher;
use crate::error::{ConfigError, EngineError};
use crate::event::{Event, EventKind, EventSink};
use crate::request::{Outcome, Request, Ticket};
use crate::table::ResourceTable;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// One entry per request, ordered by ticket.
    pub outcomes: Vec<(Ticket, Outcome)>,
    /// Logical time at which the last request was resolved.
    pub finished_at: LogicalTime,
}

impl RunReport {
    pub fn outcome(&self, ticket: Ticket) -> Option<Outcome> {
        self.outcomes
            .iter()
            .find(|(t, _)| *t == ticket)
            .map(|(_, outcome)| *outcome)
    }

    /// Number of requests whose outcome matches `predicate`.
    pub fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

pub struct AdmissionController {
    config: Arc<ArbiterConfig>,
    table: Arc<ResourceTable>,
    clock: Clock,
    sink: Arc<dyn EventSink>,
}

impl AdmissionController {
    /// Validates `config` and creates the resource table for a fresh run.
    pub fn new(config: ArbiterConfig, sink: Arc<dyn EventSink>) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = ResourceTable::new(config.resource_count, config.lock_policy());
        Ok(Self {
            config: Arc::new(config),
            table: Arc::new(table),
            clock: Clock::new(),
            sink,
        })
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    /// The resource table the next run will use.
    pub fn resources(&self) -> &ResourceTable {
        &self.table
    }

    /// Processes every request and returns once all of them are resolved.
    ///
    /// Declined and cancelled requests are normal outcomes; an error means a dispatch
    /// task itself failed.
    #[instrument(skip_all, fields(requests = requests.len(), resources = self.table.len()))]
    pub async fn run(self, requests: Vec<Request>) -> Result<RunReport, EngineError> {
        for (index, request) in requests.iter().enumerate() {
            let kind = EventKind::Requested {
                ticket: Ticket(index),
                user: request.user,
                resource: request.resource,
                op: request.op,
            };
            self.sink.emit(Event { at: request.arrival, kind }).await;
        }

        info!("Run started");
        let driver = self.clock.drive(self.config.tick_interval());

        let dispatcher = RequestDispatcher::new(
            self.clock.clone(),
            Arc::clone(&self.table),
            Arc::clone(&self.config),
            Arc::clone(&self.sink),
        );
        let handles: Vec<_> = requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.dispatch(Ticket(index), request).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        let mut failure = None;
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(outcome)) => outcomes.push((Ticket(index), outcome)),
                Ok(Err(e)) => {
                    error!(ticket = index, error = %e, "Dispatch failed");
                    failure.get_or_insert(e);
                }
                Err(e) => {
                    error!(ticket = index, error = %e, "Dispatch task panicked");
                    failure.get_or_insert(EngineError::TaskFailed(e));
                }
            }
        }

        let finished_at = self.clock.now();
        driver.stop().await.map_err(EngineError::ClockDriver)?;
        if let Some(e) = failure {
            return Err(e);
        }

        self.sink
            .emit(Event {
                at: finished_at,
                kind: EventKind::Idle,
            })
            .await;
        info!(finished_at, "No more pending requests");

        Ok(RunReport {
            outcomes,
            finished_at,
        })
    }
}
