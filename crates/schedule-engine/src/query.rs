//! Read-side filtering and search over the schedule.
//!
//! A query runs against a snapshot captured under one read of the
//! registry. The resulting [`QueryResult`] filters lazily and can be
//! iterated any number of times; it never observes later mutations.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use schedule_core::error::AppError;
use schedule_core::types::{SessionTypeId, TrainerId, Weekday};
use schedule_entity::{CapacityTier, Session};

use crate::capacity::CapacityClassifier;
use crate::directory::Directory;

/// Session status buckets offered by the schedule filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Neither cancelled nor expired.
    Active,
    /// Booking period lapsed.
    Expired,
    /// Membership restrictions apply.
    Restricted,
    /// Clients are on a waiting list.
    Waiting,
    /// Called off by an administrator.
    Cancelled,
}

impl StatusFilter {
    /// Whether a session falls in this bucket.
    pub fn matches(&self, session: &Session) -> bool {
        match self {
            Self::Active => !session.is_cancelled() && !session.flags.is_expired,
            Self::Expired => session.flags.is_expired,
            Self::Restricted => session.flags.has_restrictions,
            Self::Waiting => session.flags.has_waiting_list,
            Self::Cancelled => session.is_cancelled(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Restricted => "restricted",
            Self::Waiting => "waiting",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "restricted" => Ok(Self::Restricted),
            "waiting" => Ok(Self::Waiting),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(AppError::validation(format!("Unknown status filter: '{other}'"))),
        }
    }
}

/// Conjunction of optional filters. An empty query matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleQuery {
    /// Only sessions of this trainer.
    pub trainer_id: Option<TrainerId>,
    /// Only sessions of this type.
    pub session_type_id: Option<SessionTypeId>,
    /// Only sessions in this capacity tier. Sessions with zero capacity
    /// never match.
    pub capacity: Option<CapacityTier>,
    /// Only sessions in this status bucket.
    pub status: Option<StatusFilter>,
    /// Only sessions on this day.
    pub day: Option<Weekday>,
    /// Case-insensitive substring over title, trainer name and type name.
    pub search: Option<String>,
    /// Only sessions with a waiting list.
    pub waiting_list_only: bool,
    /// Only sessions with payment issues.
    pub payment_issues_only: bool,
}

impl ScheduleQuery {
    /// A query with no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one trainer.
    pub fn trainer(mut self, id: TrainerId) -> Self {
        self.trainer_id = Some(id);
        self
    }

    /// Restrict to one session type.
    pub fn session_type(mut self, id: SessionTypeId) -> Self {
        self.session_type_id = Some(id);
        self
    }

    /// Restrict to one capacity tier.
    pub fn capacity(mut self, tier: CapacityTier) -> Self {
        self.capacity = Some(tier);
        self
    }

    /// Restrict to one status bucket.
    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to one day.
    pub fn day(mut self, day: Weekday) -> Self {
        self.day = Some(day);
        self
    }

    /// Free-text search.
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Only sessions with a waiting list.
    pub fn with_waiting_list(mut self) -> Self {
        self.waiting_list_only = true;
        self
    }

    /// Only sessions with payment issues.
    pub fn with_payment_issues(mut self) -> Self {
        self.payment_issues_only = true;
        self
    }

    /// The normalized search needle, if any.
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether evaluating this query needs directory names.
    pub fn needs_names(&self) -> bool {
        self.needle().is_some()
    }
}

/// Display names of the trainers and session types referenced by a
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    trainers: HashMap<TrainerId, String>,
    session_types: HashMap<SessionTypeId, String>,
}

impl NameIndex {
    /// Resolve names for every reference in `sessions`. Missing entries and
    /// directory failures are logged and left out.
    pub async fn resolve(directory: &dyn Directory, sessions: &[Session]) -> Self {
        let mut index = NameIndex::default();

        for session in sessions {
            if !index.trainers.contains_key(&session.trainer_id) {
                match directory.trainer(&session.trainer_id).await {
                    Ok(Some(trainer)) => {
                        index.trainers.insert(trainer.id, trainer.name);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(trainer_id = %session.trainer_id, error = %e, "Trainer lookup failed");
                    }
                }
            }
            if !index.session_types.contains_key(&session.session_type_id) {
                match directory.session_type(&session.session_type_id).await {
                    Ok(Some(kind)) => {
                        index.session_types.insert(kind.id, kind.name);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(
                            session_type_id = %session.session_type_id,
                            error = %e,
                            "Session type lookup failed"
                        );
                    }
                }
            }
        }
        index
    }

    /// Trainer display name, if known.
    pub fn trainer(&self, id: &TrainerId) -> Option<&str> {
        self.trainers.get(id).map(String::as_str)
    }

    /// Session type display name, if known.
    pub fn session_type(&self, id: &SessionTypeId) -> Option<&str> {
        self.session_types.get(id).map(String::as_str)
    }
}

/// Stateless filter evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleQueryService;

impl ScheduleQueryService {
    /// Package a snapshot and a query into a lazily filtered result.
    pub fn run(snapshot: Vec<Session>, names: NameIndex, query: ScheduleQuery) -> QueryResult {
        let needle = query.needle();
        QueryResult {
            snapshot: snapshot.into(),
            names: Arc::new(names),
            query: Arc::new(query),
            needle: needle.map(Arc::from),
        }
    }

    /// Whether `session` satisfies every filter in `query`.
    pub fn matches(
        query: &ScheduleQuery,
        needle: Option<&str>,
        session: &Session,
        names: &NameIndex,
    ) -> bool {
        if query.trainer_id.is_some_and(|t| t != session.trainer_id) {
            return false;
        }
        if query
            .session_type_id
            .is_some_and(|t| t != session.session_type_id)
        {
            return false;
        }
        if query.day.is_some_and(|d| d != session.slot.day) {
            return false;
        }
        if query.waiting_list_only && !session.flags.has_waiting_list {
            return false;
        }
        if query.payment_issues_only && !session.flags.has_payment_issues {
            return false;
        }
        if let Some(status) = &query.status {
            if !status.matches(session) {
                return false;
            }
        }
        if let Some(tier) = query.capacity {
            match CapacityClassifier::classify_session(session) {
                Ok(actual) if actual == tier => {}
                _ => return false,
            }
        }
        if let Some(needle) = needle {
            let hit = session.title.to_lowercase().contains(needle)
                || names
                    .trainer(&session.trainer_id)
                    .is_some_and(|n| n.to_lowercase().contains(needle))
                || names
                    .session_type(&session.session_type_id)
                    .is_some_and(|n| n.to_lowercase().contains(needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// A finite, restartable, lazily filtered sequence of sessions.
///
/// Cloning is cheap; clones share the snapshot.
#[derive(Debug, Clone)]
pub struct QueryResult {
    snapshot: Arc<[Session]>,
    names: Arc<NameIndex>,
    query: Arc<ScheduleQuery>,
    needle: Option<Arc<str>>,
}

impl QueryResult {
    /// Iterate the matching sessions from the start.
    pub fn iter(&self) -> QueryIter<'_> {
        QueryIter {
            result: self,
            inner: self.snapshot.iter(),
        }
    }

    /// Number of matching sessions. Walks the whole sequence.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Collect the matching sessions.
    pub fn to_vec(&self) -> Vec<Session> {
        self.iter().cloned().collect()
    }

    /// Names resolved for the snapshot.
    pub fn names(&self) -> &NameIndex {
        &self.names
    }

    /// The query being evaluated.
    pub fn query(&self) -> &ScheduleQuery {
        &self.query
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Session;
    type IntoIter = QueryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`QueryResult`].
#[derive(Debug)]
pub struct QueryIter<'a> {
    result: &'a QueryResult,
    inner: std::slice::Iter<'a, Session>,
}

impl<'a> Iterator for QueryIter<'a> {
    type Item = &'a Session;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.result;
        self.inner.by_ref().find(|session| {
            ScheduleQueryService::matches(
                &result.query,
                result.needle.as_deref(),
                session,
                &result.names,
            )
        })
    }
}
