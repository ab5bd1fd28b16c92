//! Shared test helpers for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::broadcast;

use schedule_core::config::GridConfig;
use schedule_core::events::DomainEvent;
use schedule_core::types::{AdminId, SessionId, SessionTypeId, Slot, TrainerId};
use schedule_core::CommandContext;
use schedule_engine::{BroadcastEventBus, MemoryDirectory, MemorySessionStore, ScheduleEngine};
use schedule_entity::{Session, SessionFlags, SessionStatus, SessionType, Trainer};

/// An engine wired to in-memory collaborators.
pub struct TestSchedule {
    pub engine: Arc<ScheduleEngine>,
    pub store: Arc<MemorySessionStore>,
    pub directory: Arc<MemoryDirectory>,
    pub bus: BroadcastEventBus,
    pub ctx: CommandContext,
}

impl TestSchedule {
    /// Empty schedule on the default grid.
    pub fn new() -> Self {
        let store = Arc::new(MemorySessionStore::new());
        let directory = Arc::new(MemoryDirectory::new());
        let bus = BroadcastEventBus::new(256);
        let engine = Arc::new(ScheduleEngine::new(
            store.clone(),
            directory.clone(),
            Arc::new(bus.clone()),
            GridConfig::default(),
        ));
        Self {
            engine,
            store,
            directory,
            bus,
            ctx: CommandContext::new(AdminId::new()),
        }
    }

    /// Register a trainer in the directory.
    pub async fn trainer(&self, name: &str) -> Trainer {
        let trainer = Trainer::new(TrainerId::new(), name);
        self.directory.upsert_trainer(trainer.clone()).await;
        trainer
    }

    /// Register a session type in the directory.
    pub async fn session_type(&self, name: &str) -> SessionType {
        let kind = SessionType::new(SessionTypeId::new(), name);
        self.directory.upsert_session_type(kind.clone()).await;
        kind
    }

    /// Insert a session and return it.
    pub async fn add(&self, session: Session) -> Session {
        self.engine
            .insert_session(&self.ctx, session)
            .await
            .expect("Failed to insert session")
    }

    /// Insert a fresh session for `trainer` at the given day and time.
    pub async fn add_at(&self, trainer: TrainerId, day: &str, time: &str) -> Session {
        self.add(session(trainer, day, time)).await
    }
}

/// Parse a slot.
pub fn slot(day: &str, time: &str) -> Slot {
    Slot::parse(day, time).expect("Invalid test slot")
}

/// A session with 5 of 10 places booked.
pub fn session(trainer: TrainerId, day: &str, time: &str) -> Session {
    Session {
        id: SessionId::new(),
        title: "Strength & conditioning".to_string(),
        slot: slot(day, time),
        duration_minutes: 60,
        room: "Hall 2".to_string(),
        level: "All levels".to_string(),
        description: String::new(),
        trainer_id: trainer,
        session_type_id: SessionTypeId::new(),
        max_participants: 10,
        current_participants: 5,
        flags: SessionFlags::default(),
        status: SessionStatus::Scheduled,
    }
}

/// Every event currently queued on a receiver.
pub fn drain(rx: &mut broadcast::Receiver<DomainEvent>) -> Vec<DomainEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
