//! Integration tests for the read side: queries, grid and audit.

mod helpers;

use schedule_core::types::TrainerId;
use schedule_core::types::Weekday;
use schedule_engine::{IntegrityWarning, MoveDecision, ScheduleQuery, StatusFilter};
use schedule_entity::CapacityTier;

use helpers::{slot, TestSchedule};

#[tokio::test]
async fn test_query_combines_filters() {
    let app = TestSchedule::new();
    let olga = app.trainer("Olga Smirnova").await;
    let yoga = app.session_type("Yoga").await;

    let mut morning = helpers::session(olga.id, "monday", "08:00");
    morning.session_type_id = yoga.id;
    morning.current_participants = 9;
    let morning = app.add(morning).await;

    let mut evening = helpers::session(olga.id, "monday", "19:00");
    evening.session_type_id = yoga.id;
    evening.flags.has_waiting_list = true;
    let evening = app.add(evening).await;

    app.add_at(TrainerId::new(), "monday", "08:00").await;

    let by_trainer = app.engine.query(ScheduleQuery::new().trainer(olga.id)).await;
    assert_eq!(by_trainer.to_vec(), vec![morning.clone(), evening.clone()]);

    let full = app
        .engine
        .query(ScheduleQuery::new().trainer(olga.id).capacity(CapacityTier::Full))
        .await;
    assert_eq!(full.to_vec(), vec![morning.clone()]);

    let waiting = app
        .engine
        .query(ScheduleQuery::new().status(StatusFilter::Waiting))
        .await;
    assert_eq!(waiting.to_vec(), vec![evening.clone()]);

    let searched = app.engine.query(ScheduleQuery::new().search("smirnova")).await;
    assert_eq!(searched.count(), 2);
    let by_type = app
        .engine
        .query(ScheduleQuery::new().search("yoga").day(Weekday::Monday))
        .await;
    assert_eq!(by_type.count(), 2);
}

#[tokio::test]
async fn test_query_result_is_a_snapshot() {
    let app = TestSchedule::new();
    let session = app.add_at(TrainerId::new(), "monday", "08:00").await;

    let result = app.engine.query(ScheduleQuery::new()).await;
    app.engine
        .propose_move(&app.ctx, &session.id, slot("friday", "20:00"))
        .await
        .unwrap();

    let first: Vec<_> = result.iter().map(|s| s.slot).collect();
    let second: Vec<_> = result.iter().map(|s| s.slot).collect();
    assert_eq!(first, vec![session.slot]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_results_ordered_by_slot() {
    let app = TestSchedule::new();
    let late = app.add_at(TrainerId::new(), "sunday", "07:00").await;
    let early = app.add_at(TrainerId::new(), "monday", "21:00").await;
    let mid = app.add_at(TrainerId::new(), "monday", "22:00").await;

    let ids: Vec<_> = app
        .engine
        .query(ScheduleQuery::new())
        .await
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![early.id, mid.id, late.id]);
}

#[tokio::test]
async fn test_grid_reflects_moves() {
    let app = TestSchedule::new();
    let session = app.add_at(TrainerId::new(), "monday", "08:00").await;
    let target = slot("saturday", "11:00");
    app.engine
        .propose_move(&app.ctx, &session.id, target)
        .await
        .unwrap();

    let grid = app.engine.grid().await;
    assert!(grid.cell(&session.slot).unwrap().sessions.is_empty());
    assert_eq!(grid.cell(&target).unwrap().sessions[0].id, session.id);
    assert_eq!(grid.session_count(), 1);
}

#[tokio::test]
async fn test_audit_flags_forced_double_booking_and_dangling_refs() {
    let app = TestSchedule::new();
    let known = app.trainer("Ivan Sokolov").await;
    let kind = app.session_type("Boxing").await;

    let mut resident = helpers::session(known.id, "tuesday", "19:00");
    resident.session_type_id = kind.id;
    let resident = app.add(resident).await;
    let mut mover = helpers::session(known.id, "monday", "08:00");
    mover.session_type_id = kind.id;
    let mover = app.add(mover).await;

    let clean = app.engine.audit().await;
    assert!(clean.is_clean(), "unexpected warnings: {:?}", clean.warnings);

    let proposed = app
        .engine
        .propose_move(&app.ctx, &mover.id, resident.slot)
        .await
        .unwrap();
    app.engine
        .resolve_move(&app.ctx, &proposed.transaction_id(), MoveDecision::Force)
        .await
        .unwrap();
    let orphan = app.add_at(TrainerId::new(), "friday", "18:00").await;

    let report = app.engine.audit().await;
    assert_eq!(report.sessions_checked, 3);
    assert!(report.warnings.contains(&IntegrityWarning::TrainerDoubleBooked {
        trainer_id: known.id,
        slot: resident.slot,
        session_ids: vec![resident.id, mover.id],
    }));
    assert!(report.warnings.contains(&IntegrityWarning::UnknownTrainer {
        session_id: orphan.id,
        trainer_id: orphan.trainer_id,
    }));
}
