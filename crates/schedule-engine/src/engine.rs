//! The schedule engine facade.
//!
//! Owns the registry behind a single reader/writer lock and exposes the
//! inbound commands. Every mutation follows the same sequence:
//!
//! 1. take the write lock, validate, mutate the registry;
//! 2. reserve the next write turn, then release the lock;
//! 3. write through to the store;
//! 4. publish the domain event and hand the turn on.
//!
//! Turns are reserved under the write lock, so store writes and events
//! follow commit order even when a store call is slow. A failed
//! write-through never rolls the registry back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use schedule_core::config::GridConfig;
use schedule_core::context::CommandContext;
use schedule_core::error::AppError;
use schedule_core::events::{DomainEvent, ScheduleEvent};
use schedule_core::result::AppResult;
use schedule_core::traits::EventSink;
use schedule_core::types::{SessionId, Slot, TransactionId};
use schedule_entity::Session;

use crate::audit::{IntegrityAuditor, IntegrityReport};
use crate::bulk::{BatchResult, BulkOperation, BulkOperationProcessor};
use crate::directory::Directory;
use crate::grid::WeekGrid;
use crate::query::{NameIndex, QueryResult, ScheduleQuery, ScheduleQueryService};
use crate::registry::SessionRegistry;
use crate::store::SharedSessionStore;
use crate::transaction::{MoveDecision, MoveOutcome, MoveState, MoveTransaction};

/// Everything guarded by the engine lock.
#[derive(Debug, Default)]
pub(crate) struct ScheduleState {
    /// The authoritative session set.
    pub(crate) registry: SessionRegistry,
    /// Conflicting moves awaiting a force/abort decision.
    pub(crate) pending: HashMap<TransactionId, MoveTransaction>,
}

impl ScheduleState {
    /// Drop every pending move of a session. Returns how many were dropped.
    pub(crate) fn discard_pending(&mut self, session_id: &SessionId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, tx| tx.session_id != *session_id);
        before - self.pending.len()
    }

    /// Drop pending moves that waited `ttl` or longer.
    pub(crate) fn expire_pending(&mut self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, tx| {
            (now - tx.created_at)
                .to_std()
                .map_or(true, |age| age < ttl)
        });
        before - self.pending.len()
    }
}

/// A durable write to issue after a commit.
pub(crate) enum StoreWrite<'a> {
    Upsert(&'a Session),
    Remove(&'a SessionId),
}

/// Exclusive right to issue the next durable write.
///
/// Reserved while the state write lock is held; dropped once the write and
/// its event are out.
pub(crate) struct WriteTurn<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// Default lifetime of a conflicting move awaiting a decision.
pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(15 * 60);

/// Concurrent weekly schedule.
pub struct ScheduleEngine {
    pub(crate) state: RwLock<ScheduleState>,
    store: SharedSessionStore,
    directory: Arc<dyn Directory>,
    events: Arc<dyn EventSink>,
    grid: GridConfig,
    write_order: Mutex<()>,
    pending_ttl: Duration,
}

impl std::fmt::Debug for ScheduleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleEngine")
            .field("store", &self.store.backend())
            .field("grid", &self.grid)
            .field("pending_ttl", &self.pending_ttl)
            .finish_non_exhaustive()
    }
}

impl ScheduleEngine {
    /// Create an engine with an empty registry.
    pub fn new(
        store: SharedSessionStore,
        directory: Arc<dyn Directory>,
        events: Arc<dyn EventSink>,
        grid: GridConfig,
    ) -> Self {
        Self {
            state: RwLock::new(ScheduleState::default()),
            store,
            directory,
            events,
            grid,
            write_order: Mutex::new(()),
            pending_ttl: DEFAULT_PENDING_TTL,
        }
    }

    /// Set how long a conflicting move waits for a decision before it is
    /// discarded.
    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    /// Create an engine and hydrate its registry from the store.
    ///
    /// Stored sessions are not grid-checked; a stored duplicate id fails
    /// with `DuplicateId`.
    pub async fn load(
        store: SharedSessionStore,
        directory: Arc<dyn Directory>,
        events: Arc<dyn EventSink>,
        grid: GridConfig,
    ) -> AppResult<Self> {
        let sessions = store.load_all().await?;
        let mut registry = SessionRegistry::new();
        for session in sessions {
            registry.insert(session)?;
        }

        info!(
            backend = store.backend(),
            sessions = registry.len(),
            "Schedule loaded"
        );

        let engine = Self::new(store, directory, events, grid);
        engine.state.write().await.registry = registry;
        Ok(engine)
    }

    /// The grid bounds this engine validates against.
    pub fn grid_config(&self) -> &GridConfig {
        &self.grid
    }

    /// Number of sessions in the registry.
    pub async fn len(&self) -> usize {
        self.state.read().await.registry.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.registry.is_empty()
    }

    /// Look up a session by id.
    pub async fn get(&self, id: &SessionId) -> AppResult<Session> {
        self.state.read().await.registry.get(id).cloned()
    }

    /// Sessions in a slot, in arrival order.
    pub async fn sessions_at(&self, slot: &Slot) -> Vec<Session> {
        self.state
            .read()
            .await
            .registry
            .sessions_at(slot)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Hand a newly created session to the engine.
    pub async fn insert_session(&self, ctx: &CommandContext, session: Session) -> AppResult<Session> {
        self.grid.check_target(&session.slot)?;
        let turn = {
            let mut state = self.state.write().await;
            state.registry.insert(session.clone())?;
            self.reserve_write().await
        };

        info!(
            session_id = %session.id,
            trainer_id = %session.trainer_id,
            slot = %session.slot,
            "Session added"
        );

        let written = self
            .settle(
                turn,
                ctx,
                StoreWrite::Upsert(&session),
                ScheduleEvent::SessionAdded {
                    session_id: session.id,
                    slot: session.slot,
                },
            )
            .await;

        for warning in IntegrityAuditor::check_references(&*self.directory, std::slice::from_ref(&session)).await {
            warn!(session_id = %session.id, warning = %warning, "Session references unknown directory entry");
        }
        written.map(|()| session)
    }

    /// Propose relocating a session.
    ///
    /// Without conflicts the move is applied at once. Otherwise the
    /// registry is untouched and the returned outcome lists every colliding
    /// session; the transaction stays pending until [`resolve_move`], until
    /// it expires, or until a newer proposal for the same session replaces
    /// it.
    ///
    /// [`resolve_move`]: ScheduleEngine::resolve_move
    pub async fn propose_move(
        &self,
        ctx: &CommandContext,
        session_id: &SessionId,
        target: Slot,
    ) -> AppResult<MoveOutcome> {
        self.grid.check_target(&target)?;

        let (outcome, turn) = {
            let mut state = self.state.write().await;
            self.sweep_pending(&mut state);
            let superseded = state.discard_pending(session_id);
            if superseded > 0 {
                debug!(session_id = %session_id, superseded, "Pending moves replaced by a newer proposal");
            }

            let tx = MoveTransaction::propose(&mut state.registry, session_id, target)?;
            let outcome = match tx.state() {
                MoveState::Applied => MoveOutcome::Applied {
                    transaction_id: tx.id,
                    session: state.registry.get(session_id)?.clone(),
                    from: tx.from,
                    forced: false,
                },
                MoveState::Conflicting => {
                    let outcome = MoveOutcome::Conflicting {
                        transaction_id: tx.id,
                        session_id: tx.session_id,
                        target: tx.target,
                        conflicts: tx.conflicts().to_vec(),
                    };
                    state.pending.insert(tx.id, tx);
                    outcome
                }
                other => {
                    return Err(AppError::internal(format!(
                        "Proposed move ended in unexpected state {other}"
                    )));
                }
            };
            let turn = self.reserve_move_write(&outcome).await;
            (outcome, turn)
        };

        if let MoveOutcome::Conflicting {
            transaction_id,
            conflicts,
            ..
        } = &outcome
        {
            warn!(
                transaction_id = %transaction_id,
                session_id = %session_id,
                target = %target,
                conflicts = conflicts.len(),
                "Move held: trainer already booked in target slot"
            );
        }

        self.finish_move(ctx, &outcome, turn).await?;
        Ok(outcome)
    }

    /// Settle a pending conflicting move.
    ///
    /// Fails with `NotFound` if the transaction is unknown, expired,
    /// replaced or already resolved.
    pub async fn resolve_move(
        &self,
        ctx: &CommandContext,
        transaction_id: &TransactionId,
        decision: MoveDecision,
    ) -> AppResult<MoveOutcome> {
        let (outcome, turn) = {
            let mut state = self.state.write().await;
            self.sweep_pending(&mut state);
            let mut tx = state.pending.remove(transaction_id).ok_or_else(|| {
                AppError::not_found(format!("No pending move transaction {transaction_id}"))
            })?;

            let outcome = match tx.resolve(decision, &mut state.registry)? {
                MoveState::Applied => MoveOutcome::Applied {
                    transaction_id: tx.id,
                    session: state.registry.get(&tx.session_id)?.clone(),
                    from: tx.from,
                    forced: tx.forced(),
                },
                _ => MoveOutcome::Aborted {
                    transaction_id: tx.id,
                    session_id: tx.session_id,
                },
            };
            let turn = self.reserve_move_write(&outcome).await;
            (outcome, turn)
        };

        self.finish_move(ctx, &outcome, turn).await?;
        Ok(outcome)
    }

    /// Conflicting moves awaiting a decision, oldest first. Expired moves
    /// are dropped on the way.
    pub async fn pending_transactions(&self) -> Vec<MoveTransaction> {
        let mut state = self.state.write().await;
        self.sweep_pending(&mut state);
        let mut pending: Vec<MoveTransaction> = state.pending.values().cloned().collect();
        drop(state);
        pending.sort_by_key(|tx| tx.created_at);
        pending
    }

    /// Apply one operation to a set of sessions, each independently.
    pub async fn bulk_apply(
        &self,
        ctx: &CommandContext,
        operation: BulkOperation,
        session_ids: &[SessionId],
    ) -> BatchResult {
        BulkOperationProcessor::new(self)
            .apply(ctx, operation, session_ids)
            .await
    }

    /// Filter the schedule. The result reflects the registry as of this
    /// call.
    pub async fn query(&self, query: ScheduleQuery) -> QueryResult {
        let snapshot = self.snapshot().await;
        let names = if query.needs_names() {
            NameIndex::resolve(&*self.directory, &snapshot).await
        } else {
            NameIndex::default()
        };
        debug!(snapshot = snapshot.len(), ?query, "Schedule query");
        ScheduleQueryService::run(snapshot, names, query)
    }

    /// The whole week laid out on the configured grid.
    pub async fn grid(&self) -> WeekGrid {
        let state = self.state.read().await;
        WeekGrid::build(&self.grid, &state.registry)
    }

    /// Check the schedule for data-integrity problems.
    pub async fn audit(&self) -> IntegrityReport {
        let snapshot = self.snapshot().await;
        let report = IntegrityAuditor::run(&*self.directory, &snapshot).await;
        for warning in &report.warnings {
            warn!(warning = %warning, "Schedule integrity warning");
        }
        report
    }

    /// Every session, ordered by slot then arrival.
    async fn snapshot(&self) -> Vec<Session> {
        self.state
            .read()
            .await
            .registry
            .iter_ordered()
            .cloned()
            .collect()
    }

    fn sweep_pending(&self, state: &mut ScheduleState) {
        let expired = state.expire_pending(self.pending_ttl, Utc::now());
        if expired > 0 {
            info!(expired, "Discarded expired pending moves");
        }
    }

    /// A turn for an applied move that changed slot.
    async fn reserve_move_write(&self, outcome: &MoveOutcome) -> Option<WriteTurn<'_>> {
        match outcome {
            MoveOutcome::Applied { session, from, .. } if *from != session.slot => {
                Some(self.reserve_write().await)
            }
            _ => None,
        }
    }

    async fn finish_move(
        &self,
        ctx: &CommandContext,
        outcome: &MoveOutcome,
        turn: Option<WriteTurn<'_>>,
    ) -> AppResult<()> {
        let MoveOutcome::Applied {
            transaction_id,
            session,
            from,
            forced,
        } = outcome
        else {
            return Ok(());
        };

        let Some(turn) = turn else {
            debug!(session_id = %session.id, "Move to own slot, nothing to do");
            return Ok(());
        };

        info!(
            transaction_id = %transaction_id,
            session_id = %session.id,
            from = %from,
            to = %session.slot,
            forced,
            "Session moved"
        );

        self.settle(
            turn,
            ctx,
            StoreWrite::Upsert(session),
            ScheduleEvent::SessionMoved {
                session_id: session.id,
                trainer_id: session.trainer_id,
                from: *from,
                to: session.slot,
                forced: *forced,
            },
        )
        .await
    }

    /// Queue behind earlier commits for the store. Must be called with the
    /// state write lock held.
    pub(crate) async fn reserve_write(&self) -> WriteTurn<'_> {
        WriteTurn {
            _guard: self.write_order.lock().await,
        }
    }

    /// Write through and publish, then release the turn.
    pub(crate) async fn settle(
        &self,
        turn: WriteTurn<'_>,
        ctx: &CommandContext,
        write: StoreWrite<'_>,
        payload: ScheduleEvent,
    ) -> AppResult<()> {
        let written = self.write_through(write).await;
        self.publish(ctx, payload);
        drop(turn);
        written
    }

    /// Issue a durable write. Failures are logged and returned; the
    /// in-memory state stays committed.
    async fn write_through(&self, write: StoreWrite<'_>) -> AppResult<()> {
        let (session_id, result) = match write {
            StoreWrite::Upsert(session) => (session.id, self.store.upsert(session).await),
            StoreWrite::Remove(id) => (*id, self.store.remove(id).await.map(|_| ())),
        };

        if let Err(e) = &result {
            warn!(
                session_id = %session_id,
                backend = self.store.backend(),
                error = %e,
                "Write-through failed, in-memory schedule kept"
            );
        }
        result.map_err(|e| {
            AppError::persistence(format!(
                "Session {session_id} committed in memory but not persisted: {}",
                e.message
            ))
        })
    }

    /// Emit an event for a committed mutation.
    fn publish(&self, ctx: &CommandContext, payload: ScheduleEvent) {
        self.events.publish(DomainEvent::new(ctx.actor_id, payload));
    }
}
