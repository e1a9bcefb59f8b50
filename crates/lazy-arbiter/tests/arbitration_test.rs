use lazy_arbiter::mock::RecordingSink;
use lazy_arbiter::{
    AdmissionController, ArbiterConfig, DeclineReason, EventKind, Operation, Outcome, Request,
    ResourceId, RunReport, Ticket,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Runs `requests` on a fresh controller and returns the report and recorded events.
async fn run(config: ArbiterConfig, requests: Vec<Request>) -> (RunReport, RecordingSink) {
    let sink = RecordingSink::new();
    let controller =
        AdmissionController::new(config, Arc::new(sink.clone())).expect("valid config");
    let report = controller.run(requests).await.expect("run succeeds");
    (report, sink)
}

fn config(read: u64, write: u64, delete: u64, resources: u32, patience: u64) -> ArbiterConfig {
    ArbiterConfig {
        read_time: read,
        write_time: write,
        delete_time: delete,
        resource_count: resources,
        patience,
        ..Default::default()
    }
}

fn completed_at(sink: &RecordingSink, ticket: Ticket) -> u64 {
    let event = sink.terminal_for(ticket).expect("terminal event");
    assert!(
        matches!(event.kind, EventKind::Completed { .. }),
        "{ticket} did not complete: {event:?}"
    );
    event.at
}

#[tokio::test(start_paused = true)]
async fn single_read_completes_after_read_time() {
    let (report, sink) = run(
        config(2, 3, 1, 1, 5),
        vec![Request::new(1, 1, Operation::Read, 0)],
    )
    .await;

    assert_eq!(report.outcome(Ticket(0)), Some(Outcome::Completed));
    let timeline = sink.timeline(Ticket(0));
    let kinds: Vec<_> = timeline.iter().map(|e| (e.at, e.kind.clone())).collect();
    assert_eq!(
        kinds,
        vec![
            (
                0,
                EventKind::Requested {
                    ticket: Ticket(0),
                    user: lazy_arbiter::UserId(1),
                    resource: ResourceId(1),
                    op: Operation::Read,
                }
            ),
            (
                0,
                EventKind::TakenUp {
                    ticket: Ticket(0),
                    user: lazy_arbiter::UserId(1)
                }
            ),
            (
                2,
                EventKind::Completed {
                    ticket: Ticket(0),
                    user: lazy_arbiter::UserId(1)
                }
            ),
        ]
    );
    assert_eq!(report.finished_at, 2);
}

#[tokio::test(start_paused = true)]
async fn reader_and_writer_never_overlap() {
    let (report, sink) = run(
        config(2, 3, 1, 1, 5),
        vec![
            Request::new(1, 1, Operation::Read, 0),
            Request::new(2, 1, Operation::Write, 0),
        ],
    )
    .await;

    assert_eq!(report.count(|o| *o == Outcome::Completed), 2);
    let read_end = completed_at(&sink, Ticket(0));
    let write_end = completed_at(&sink, Ticket(1));
    let read_start = read_end - 2;
    let write_start = write_end - 3;

    assert!(
        write_start >= read_end || read_start >= write_end,
        "read [{read_start},{read_end}) overlaps write [{write_start},{write_end})"
    );
    // Whoever went second waited for the first and still finished within patience.
    assert!(read_end.max(write_end) == 5);
}

#[tokio::test(start_paused = true)]
async fn read_after_delete_is_declined() {
    let (report, sink) = run(
        config(2, 3, 1, 1, 5),
        vec![
            Request::new(1, 1, Operation::Delete, 0),
            Request::new(2, 1, Operation::Read, 1),
        ],
    )
    .await;

    assert_eq!(report.outcome(Ticket(0)), Some(Outcome::Completed));
    assert_eq!(
        report.outcome(Ticket(1)),
        Some(Outcome::Declined(DeclineReason::Deleted))
    );

    let deleted = sink
        .timeline(Ticket(0))
        .into_iter()
        .find(|e| matches!(e.kind, EventKind::Deleted { .. }))
        .expect("delete success event");
    assert_eq!(deleted.at, 1);
    assert_eq!(completed_at(&sink, Ticket(0)), 1);

    let declined = sink.terminal_for(Ticket(1)).unwrap();
    assert_eq!(declined.at, 1);
    assert!(!sink
        .timeline(Ticket(1))
        .iter()
        .any(|e| matches!(e.kind, EventKind::TakenUp { .. })));
}

#[tokio::test(start_paused = true)]
async fn deleted_resource_stays_deleted() {
    let (report, _) = run(
        config(1, 1, 1, 2, 5),
        vec![
            Request::new(1, 1, Operation::Delete, 0),
            Request::new(2, 1, Operation::Read, 2),
            Request::new(3, 1, Operation::Write, 3),
            Request::new(4, 1, Operation::Delete, 4),
            Request::new(5, 2, Operation::Read, 4),
        ],
    )
    .await;

    assert_eq!(report.outcome(Ticket(0)), Some(Outcome::Completed));
    for ticket in 1..=3 {
        assert_eq!(
            report.outcome(Ticket(ticket)),
            Some(Outcome::Declined(DeclineReason::Deleted))
        );
    }
    // Other resources are unaffected.
    assert_eq!(report.outcome(Ticket(4)), Some(Outcome::Completed));
}

#[tokio::test(start_paused = true)]
async fn starved_request_is_cancelled_at_its_deadline() {
    let (report, sink) = run(
        config(2, 10, 1, 1, 3),
        vec![
            Request::new(1, 1, Operation::Write, 0),
            Request::new(2, 1, Operation::Read, 1),
        ],
    )
    .await;

    assert_eq!(report.outcome(Ticket(1)), Some(Outcome::Cancelled));
    let cancelled = sink.terminal_for(Ticket(1)).unwrap();
    let deadline = 1 + 3;
    assert!(cancelled.at >= deadline && cancelled.at < deadline + 1);

    // The writer outlived its own patience but was already running.
    assert_eq!(report.outcome(Ticket(0)), Some(Outcome::Completed));
    assert_eq!(completed_at(&sink, Ticket(0)), 10);
}

#[tokio::test(start_paused = true)]
async fn unknown_resources_are_declined() {
    let (report, _) = run(
        config(1, 1, 1, 2, 5),
        vec![
            Request::new(1, 0, Operation::Read, 0),
            Request::new(2, 3, Operation::Write, 1),
            Request::new(3, 2, Operation::Read, 1),
        ],
    )
    .await;

    let unknown = Some(Outcome::Declined(DeclineReason::UnknownResource));
    assert_eq!(report.outcome(Ticket(0)), unknown);
    assert_eq!(report.outcome(Ticket(1)), unknown);
    assert_eq!(report.outcome(Ticket(2)), Some(Outcome::Completed));
}

#[tokio::test(start_paused = true)]
async fn take_up_delay_shifts_admission() {
    let config = ArbiterConfig {
        admission_delay: 1,
        ..config(2, 3, 1, 1, 5)
    };
    let (_, sink) = run(config, vec![Request::new(7, 1, Operation::Read, 3)]).await;

    let taken_up = sink
        .timeline(Ticket(0))
        .into_iter()
        .find(|e| matches!(e.kind, EventKind::TakenUp { .. }))
        .unwrap();
    assert_eq!(taken_up.at, 4);
    assert_eq!(completed_at(&sink, Ticket(0)), 6);
}

#[tokio::test(start_paused = true)]
async fn patience_spent_before_take_up_cancels_without_taking_up() {
    let config = ArbiterConfig {
        admission_delay: 1,
        ..config(1, 1, 1, 1, 1)
    };
    let (report, sink) = run(config, vec![Request::new(1, 1, Operation::Delete, 0)]).await;

    assert_eq!(report.outcome(Ticket(0)), Some(Outcome::Cancelled));
    let timeline: Vec<_> = sink
        .timeline(Ticket(0))
        .into_iter()
        .map(|e| (e.at, e.kind))
        .collect();
    assert_eq!(
        timeline,
        vec![
            (
                0,
                EventKind::Requested {
                    ticket: Ticket(0),
                    user: lazy_arbiter::UserId(1),
                    resource: ResourceId(1),
                    op: Operation::Delete,
                }
            ),
            (
                1,
                EventKind::Cancelled {
                    ticket: Ticket(0),
                    user: lazy_arbiter::UserId(1)
                }
            ),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn deadline_before_take_up_cancels_at_the_deadline() {
    let config = ArbiterConfig {
        admission_delay: 3,
        ..config(1, 1, 1, 1, 1)
    };
    let (report, sink) = run(
        config,
        vec![
            Request::new(1, 1, Operation::Read, 0),
            Request::new(2, 9, Operation::Read, 2),
        ],
    )
    .await;

    // The user gives up before the resource is even looked at.
    assert_eq!(report.outcome(Ticket(0)), Some(Outcome::Cancelled));
    assert_eq!(report.outcome(Ticket(1)), Some(Outcome::Cancelled));
    assert_eq!(sink.terminal_for(Ticket(0)).unwrap().at, 1);
    assert_eq!(sink.terminal_for(Ticket(1)).unwrap().at, 3);
    assert!(sink
        .events()
        .iter()
        .all(|e| !matches!(e.kind, EventKind::TakenUp { .. })));
    assert_eq!(report.finished_at, 3);
}

/// A busy mixed workload over three resources.
fn mixed_workload() -> Vec<Request> {
    let ops = [
        Operation::Read,
        Operation::Write,
        Operation::Read,
        Operation::Read,
        Operation::Write,
        Operation::Delete,
    ];
    (0..30u32)
        .map(|i| {
            let op = ops[(i as usize * 7) % ops.len()];
            Request::new(100 + i, 1 + i % 3, op, u64::from(i / 2))
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn every_request_gets_exactly_one_terminal_event() {
    let requests = mixed_workload();
    let total = requests.len();
    let (report, sink) = run(config(2, 3, 1, 3, 4), requests).await;

    assert_eq!(report.outcomes.len(), total);
    let mut terminals: HashMap<Ticket, usize> = HashMap::new();
    for event in sink.terminal_events() {
        *terminals.entry(event.kind.ticket().unwrap()).or_default() += 1;
    }
    assert_eq!(terminals.len(), total);
    assert!(terminals.values().all(|count| *count == 1));

    for (ticket, outcome) in &report.outcomes {
        let event = sink.terminal_for(*ticket).unwrap();
        let matches = match outcome {
            Outcome::Completed => matches!(event.kind, EventKind::Completed { .. }),
            Outcome::Declined(_) => matches!(event.kind, EventKind::Declined { .. }),
            Outcome::Cancelled => matches!(event.kind, EventKind::Cancelled { .. }),
        };
        assert!(matches, "{ticket}: report says {outcome:?}, sink saw {event:?}");
    }

    let events = sink.events();
    assert_eq!(events.last().map(|e| e.kind.clone()), Some(EventKind::Idle));
    assert_eq!(sink.idle_at(), Some(report.finished_at));
}

#[tokio::test(start_paused = true)]
async fn exclusive_operations_never_overlap_anything() {
    let requests = mixed_workload();
    let config = config(2, 3, 1, 3, 4);
    let (report, sink) = run(config.clone(), requests.clone()).await;

    // Running intervals of completed requests, grouped by resource.
    let mut intervals: HashMap<ResourceId, Vec<(u64, u64, Operation)>> = HashMap::new();
    for (ticket, outcome) in &report.outcomes {
        if *outcome != Outcome::Completed {
            continue;
        }
        let request = &requests[ticket.0];
        let end = completed_at(&sink, *ticket);
        let start = end - config.service_time(request.op);
        intervals
            .entry(request.resource)
            .or_default()
            .push((start, end, request.op));
    }

    for (resource, runs) in &intervals {
        for (i, a) in runs.iter().enumerate() {
            for b in runs.iter().skip(i + 1) {
                if !a.2.is_exclusive() && !b.2.is_exclusive() {
                    continue;
                }
                let disjoint = a.1 <= b.0 || b.1 <= a.0;
                assert!(disjoint, "resource {resource}: {a:?} overlaps {b:?}");
            }
        }
        // Nothing runs on a resource after its delete.
        if let Some(delete) = runs.iter().find(|r| r.2 == Operation::Delete) {
            assert!(runs.iter().all(|r| r.1 <= delete.1));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn requested_events_carry_arrival_time() {
    let (_, sink) = run(
        config(1, 1, 1, 1, 5),
        vec![
            Request::new(1, 1, Operation::Read, 4),
            Request::new(1, 1, Operation::Read, 2),
        ],
    )
    .await;

    let requested: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e.kind, EventKind::Requested { .. }))
        .map(|e| (e.kind.ticket().unwrap(), e.at))
        .collect();
    assert_eq!(requested, vec![(Ticket(0), 4), (Ticket(1), 2)]);
}

#[tokio::test(start_paused = true)]
async fn independent_runs_share_nothing() {
    let first = run(
        config(1, 1, 1, 1, 5),
        vec![Request::new(1, 1, Operation::Delete, 0)],
    );
    let second = run(
        config(1, 1, 1, 1, 5),
        vec![Request::new(2, 1, Operation::Read, 2)],
    );
    let ((first, _), (second, _)) = tokio::join!(first, second);

    assert_eq!(first.outcome(Ticket(0)), Some(Outcome::Completed));
    assert_eq!(second.outcome(Ticket(0)), Some(Outcome::Completed));
}

#[tokio::test(start_paused = true)]
async fn empty_run_goes_straight_to_idle() {
    let (report, sink) = run(ArbiterConfig::default(), Vec::new()).await;
    assert!(report.outcomes.is_empty());
    assert_eq!(report.finished_at, 0);
    assert_eq!(sink.events().len(), 1);
    assert_eq!(sink.idle_at(), Some(0));
}

#[tokio::test]
async fn controller_builds_one_lock_per_resource() {
    let config = config(1, 1, 1, 3, 5);
    let controller =
        AdmissionController::new(config.clone(), Arc::new(RecordingSink::new())).unwrap();

    assert_eq!(controller.config(), &config);
    let resources = controller.resources();
    assert_eq!(resources.len(), 3);
    assert!(resources.get(ResourceId(3)).is_some());
    assert!(resources.get(ResourceId(4)).is_none());
    assert!(resources.iter().all(|lock| !lock.is_deleted()));
}

#[tokio::test]
async fn invalid_config_is_rejected_before_running() {
    let config = ArbiterConfig {
        resource_count: 0,
        ..Default::default()
    };
    let result = AdmissionController::new(config, Arc::new(RecordingSink::new()));
    assert!(matches!(
        result,
        Err(lazy_arbiter::ConfigError::NoResources)
    ));
}
