//! Integration tests for single-session moves.

mod helpers;

use schedule_core::events::ScheduleEvent;
use schedule_core::types::TrainerId;
use schedule_core::ErrorKind;
use schedule_engine::{MoveDecision, MoveOutcome};

use helpers::{drain, slot, TestSchedule};

#[tokio::test]
async fn test_move_to_free_slot_relocates() {
    let app = TestSchedule::new();
    let session = app.add_at(TrainerId::new(), "monday", "08:00").await;
    let target = slot("thursday", "19:00");

    let outcome = app
        .engine
        .propose_move(&app.ctx, &session.id, target)
        .await
        .unwrap();

    assert!(outcome.is_applied());
    let at_target = app.engine.sessions_at(&target).await;
    assert!(at_target.iter().any(|s| s.id == session.id));
    let at_origin = app.engine.sessions_at(&session.slot).await;
    assert!(at_origin.iter().all(|s| s.id != session.id));
}

#[tokio::test]
async fn test_move_beside_other_trainers_is_allowed() {
    let app = TestSchedule::new();
    let neighbour = app.add_at(TrainerId::new(), "thursday", "19:00").await;
    let session = app.add_at(TrainerId::new(), "monday", "08:00").await;

    let outcome = app
        .engine
        .propose_move(&app.ctx, &session.id, neighbour.slot)
        .await
        .unwrap();

    assert!(outcome.is_applied());
    let ids: Vec<_> = app
        .engine
        .sessions_at(&neighbour.slot)
        .await
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![neighbour.id, session.id]);
}

#[tokio::test]
async fn test_move_to_own_slot_never_conflicts() {
    let app = TestSchedule::new();
    let trainer = TrainerId::new();
    let session = app.add_at(trainer, "tuesday", "18:00").await;
    let mut rx = app.bus.subscribe();

    let outcome = app
        .engine
        .propose_move(&app.ctx, &session.id, session.slot)
        .await
        .unwrap();

    match outcome {
        MoveOutcome::Applied { from, session: moved, forced, .. } => {
            assert_eq!(from, session.slot);
            assert_eq!(moved.slot, session.slot);
            assert!(!forced);
        }
        other => panic!("Expected applied move, got {other:?}"),
    }
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_conflict_reports_full_set_and_leaves_grid_untouched() {
    let app = TestSchedule::new();
    let trainer = TrainerId::new();
    let resident = app.add_at(trainer, "wednesday", "19:00").await;
    let mover = app.add_at(trainer, "monday", "08:00").await;
    let before = app.engine.query(Default::default()).await.to_vec();

    let outcome = app
        .engine
        .propose_move(&app.ctx, &mover.id, resident.slot)
        .await
        .unwrap();

    assert_eq!(outcome.conflicts().unwrap(), &[resident.clone()]);
    assert_eq!(app.engine.query(Default::default()).await.to_vec(), before);
}

#[tokio::test]
async fn test_forced_move_double_books_trainer() {
    let app = TestSchedule::new();
    let trainer = TrainerId::new();
    let resident = app.add_at(trainer, "wednesday", "19:00").await;
    let mover = app.add_at(trainer, "monday", "08:00").await;
    let mut rx = app.bus.subscribe();

    let proposed = app
        .engine
        .propose_move(&app.ctx, &mover.id, resident.slot)
        .await
        .unwrap();
    let resolved = app
        .engine
        .resolve_move(&app.ctx, &proposed.transaction_id(), MoveDecision::Force)
        .await
        .unwrap();

    assert!(matches!(resolved, MoveOutcome::Applied { forced: true, .. }));
    let same_trainer = app
        .engine
        .sessions_at(&resident.slot)
        .await
        .into_iter()
        .filter(|s| s.trainer_id == trainer)
        .count();
    assert!(same_trainer >= 2);

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].actor_id, app.ctx.actor_id);
    assert!(matches!(
        events[0].payload,
        ScheduleEvent::SessionMoved { forced: true, from, to, .. }
            if from == mover.slot && to == resident.slot
    ));
}

#[tokio::test]
async fn test_abort_keeps_session_in_place() {
    let app = TestSchedule::new();
    let trainer = TrainerId::new();
    let resident = app.add_at(trainer, "wednesday", "19:00").await;
    let mover = app.add_at(trainer, "monday", "08:00").await;

    let proposed = app
        .engine
        .propose_move(&app.ctx, &mover.id, resident.slot)
        .await
        .unwrap();
    let resolved = app
        .engine
        .resolve_move(&app.ctx, &proposed.transaction_id(), MoveDecision::Abort)
        .await
        .unwrap();

    assert!(matches!(resolved, MoveOutcome::Aborted { .. }));
    assert_eq!(app.engine.get(&mover.id).await.unwrap().slot, mover.slot);
}

#[tokio::test]
async fn test_force_after_delete_reports_not_found() {
    let app = TestSchedule::new();
    let trainer = TrainerId::new();
    let resident = app.add_at(trainer, "wednesday", "19:00").await;
    let mover = app.add_at(trainer, "monday", "08:00").await;

    let proposed = app
        .engine
        .propose_move(&app.ctx, &mover.id, resident.slot)
        .await
        .unwrap();
    app.engine
        .bulk_apply(&app.ctx, schedule_engine::BulkOperation::Delete, &[mover.id])
        .await;

    let err = app
        .engine
        .resolve_move(&app.ctx, &proposed.transaction_id(), MoveDecision::Force)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(app.engine.pending_transactions().await.is_empty());
}

#[tokio::test]
async fn test_committed_move_is_written_through() {
    let app = TestSchedule::new();
    let session = app.add_at(TrainerId::new(), "monday", "08:00").await;
    let target = slot("saturday", "10:00");

    app.engine
        .propose_move(&app.ctx, &session.id, target)
        .await
        .unwrap();

    let stored = app.store.snapshot().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].slot, target);
}
