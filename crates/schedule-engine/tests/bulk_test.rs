//! Integration tests for bulk operations.

mod helpers;

use std::collections::HashMap;

use schedule_core::events::ScheduleEvent;
use schedule_core::types::{SessionId, TrainerId};
use schedule_core::ErrorKind;
use schedule_engine::{BulkOperation, BulkOperationKind, FailureReason, MoveTarget, SuccessDetail};
use schedule_entity::SessionStatus;

use helpers::{drain, slot, TestSchedule};

#[tokio::test]
async fn test_delete_with_missing_id_reports_per_id() {
    let app = TestSchedule::new();
    let a = app.add_at(TrainerId::new(), "monday", "08:00").await;
    let c = app.add_at(TrainerId::new(), "monday", "09:00").await;
    let b = SessionId::new();

    let result = app
        .engine
        .bulk_apply(&app.ctx, BulkOperation::Delete, &[a.id, b, c.id])
        .await;

    assert_eq!(result.operation, BulkOperationKind::Delete);
    let succeeded: Vec<_> = result.successes.iter().map(|s| s.session_id).collect();
    assert_eq!(succeeded, vec![a.id, c.id]);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].session_id, b);
    assert_eq!(result.failures[0].reason.kind(), ErrorKind::NotFound);
    assert_eq!(result.total(), 3);

    assert_eq!(app.engine.get(&a.id).await.unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(app.engine.get(&c.id).await.unwrap_err().kind, ErrorKind::NotFound);
    assert!(app.store.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_duplicate_copies_everything_but_id_and_bookings() {
    let app = TestSchedule::new();
    let mut source = helpers::session(TrainerId::new(), "friday", "18:00");
    source.flags.is_recurring = true;
    source.description = "Bring a mat".to_string();
    let source = app.add(source).await;

    let result = app
        .engine
        .bulk_apply(&app.ctx, BulkOperation::Duplicate, &[source.id])
        .await;

    let SuccessDetail::Duplicated { copy_id } = result.successes[0].detail.clone() else {
        panic!("Expected a duplicate, got {:?}", result.successes[0].detail);
    };
    assert_ne!(copy_id, source.id);

    let copy = app.engine.get(&copy_id).await.unwrap();
    assert_eq!(copy.current_participants, 0);
    assert_eq!(
        schedule_entity::Session {
            id: source.id,
            current_participants: source.current_participants,
            ..copy.clone()
        },
        source
    );
    assert_eq!(app.engine.get(&source.id).await.unwrap(), source);

    let ids: Vec<_> = app
        .engine
        .sessions_at(&source.slot)
        .await
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![source.id, copy_id]);
}

#[tokio::test]
async fn test_cancel_keeps_session_and_is_idempotent() {
    let app = TestSchedule::new();
    let session = app.add_at(TrainerId::new(), "sunday", "10:00").await;
    let mut rx = app.bus.subscribe();

    let first = app
        .engine
        .bulk_apply(&app.ctx, BulkOperation::Cancel, &[session.id])
        .await;
    let second = app
        .engine
        .bulk_apply(&app.ctx, BulkOperation::Cancel, &[session.id])
        .await;

    assert_eq!(
        first.successes[0].detail,
        SuccessDetail::Cancelled {
            already_cancelled: false
        }
    );
    assert_eq!(
        second.successes[0].detail,
        SuccessDetail::Cancelled {
            already_cancelled: true
        }
    );
    let stored = app.engine.get(&session.id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Cancelled);

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].payload, ScheduleEvent::SessionCancelled { .. }));
}

#[tokio::test]
async fn test_move_batch_allows_partial_success() {
    let app = TestSchedule::new();
    let busy = TrainerId::new();
    let target = slot("tuesday", "19:00");
    let resident = app.add_at(busy, "tuesday", "19:00").await;
    let blocked = app.add_at(busy, "monday", "08:00").await;
    let free = app.add_at(TrainerId::new(), "monday", "09:00").await;

    let result = app
        .engine
        .bulk_apply(
            &app.ctx,
            BulkOperation::Move {
                target: MoveTarget::Same(target),
                force: false,
            },
            &[blocked.id, free.id],
        )
        .await;

    assert_eq!(result.successes.len(), 1);
    assert_eq!(result.successes[0].session_id, free.id);
    let failure = result.failure_for(&blocked.id).unwrap();
    match &failure.reason {
        FailureReason::Conflict { conflicts } => assert_eq!(conflicts, &vec![resident]),
        other => panic!("Expected conflict, got {other:?}"),
    }
    assert_eq!(app.engine.get(&blocked.id).await.unwrap().slot, blocked.slot);
    assert!(app.engine.pending_transactions().await.is_empty());

    let retried = app
        .engine
        .bulk_apply(
            &app.ctx,
            BulkOperation::Move {
                target: MoveTarget::Same(target),
                force: true,
            },
            &[blocked.id],
        )
        .await;
    assert_eq!(
        retried.successes[0].detail,
        SuccessDetail::Moved {
            from: blocked.slot,
            to: target,
            forced: true
        }
    );
}

#[tokio::test]
async fn test_move_batch_with_per_session_targets() {
    let app = TestSchedule::new();
    let a = app.add_at(TrainerId::new(), "monday", "08:00").await;
    let b = app.add_at(TrainerId::new(), "monday", "09:00").await;
    let unmapped = app.add_at(TrainerId::new(), "monday", "10:00").await;
    let targets = HashMap::from([
        (a.id, slot("wednesday", "07:00")),
        (b.id, slot("thursday", "21:00")),
    ]);

    let result = app
        .engine
        .bulk_apply(
            &app.ctx,
            BulkOperation::Move {
                target: MoveTarget::PerSession(targets),
                force: false,
            },
            &[a.id, b.id, unmapped.id],
        )
        .await;

    assert_eq!(result.successes.len(), 2);
    assert_eq!(app.engine.get(&a.id).await.unwrap().slot, slot("wednesday", "07:00"));
    assert_eq!(app.engine.get(&b.id).await.unwrap().slot, slot("thursday", "21:00"));
    assert_eq!(
        result.failure_for(&unmapped.id).unwrap().reason.kind(),
        ErrorKind::Validation
    );
}

#[tokio::test]
async fn test_off_grid_batch_target_fails_each_id() {
    let app = TestSchedule::new();
    let a = app.add_at(TrainerId::new(), "monday", "08:00").await;

    let result = app
        .engine
        .bulk_apply(
            &app.ctx,
            BulkOperation::Move {
                target: MoveTarget::Same(slot("monday", "23:00")),
                force: true,
            },
            &[a.id],
        )
        .await;

    assert_eq!(result.failures[0].reason.kind(), ErrorKind::Validation);
    assert_eq!(app.engine.get(&a.id).await.unwrap().slot, a.slot);
}

#[tokio::test]
async fn test_repeated_ids_are_processed_once() {
    let app = TestSchedule::new();
    let a = app.add_at(TrainerId::new(), "monday", "08:00").await;

    let result = app
        .engine
        .bulk_apply(&app.ctx, BulkOperation::Delete, &[a.id, a.id])
        .await;

    assert_eq!(result.total(), 1);
    assert!(result.is_complete_success());
}

#[tokio::test]
async fn test_failed_write_is_noted_but_committed() {
    let app = TestSchedule::new();
    let a = app.add_at(TrainerId::new(), "monday", "08:00").await;
    app.store.set_fail_writes(true);

    let result = app
        .engine
        .bulk_apply(&app.ctx, BulkOperation::Cancel, &[a.id])
        .await;

    assert!(result.is_complete_success());
    assert!(result.successes[0].persistence_error.is_some());
    assert!(app.engine.get(&a.id).await.unwrap().is_cancelled());
    assert!(!app.store.snapshot().await[0].is_cancelled());
}

#[tokio::test]
async fn test_empty_batch() {
    let app = TestSchedule::new();
    let result = app
        .engine
        .bulk_apply(&app.ctx, BulkOperation::Duplicate, &[])
        .await;
    assert_eq!(result.total(), 0);
}
