//! Storage capability the session store is written against
//!
//! Any engine that can apply a batch of changes atomically and answer the
//! two sorted queries below can back a [`SessionStore`](crate::SessionStore).

pub mod memory;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::Result;
use crate::model::{Session, Wave};

pub use memory::MemoryBackend;

/// One write inside a commit
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert or overwrite a session row
    PutSession(Session),
    /// Insert or overwrite a wave row; its session must exist
    PutWave(Wave),
    /// Remove a session and, per [`crate::schema::SESSION_WAVES`], its waves
    DeleteSession(Uuid),
    DeleteWave(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Predicate + ordering over sessions, sorted on `start_date`
#[derive(Debug, Clone, PartialEq)]
pub struct SessionQuery {
    pub uploaded: Option<bool>,
    /// Strictly after
    pub started_after: Option<DateTime<Utc>>,
    pub order: SortOrder,
}

impl Default for SessionQuery {
    fn default() -> Self {
        Self {
            uploaded: None,
            started_after: None,
            order: SortOrder::Descending,
        }
    }
}

impl SessionQuery {
    /// Every session, newest first
    pub fn newest_first() -> Self {
        Self::default()
    }

    pub fn uploaded(mut self, uploaded: bool) -> Self {
        self.uploaded = Some(uploaded);
        self
    }

    pub fn started_after(mut self, after: DateTime<Utc>) -> Self {
        self.started_after = Some(after);
        self
    }

    pub fn matches(&self, session: &Session) -> bool {
        self.uploaded.map_or(true, |u| session.is_uploaded == u)
            && self.started_after.map_or(true, |t| session.start_date > t)
    }

    /// Order by `start_date`, ties broken by id so output is deterministic
    pub fn sort(&self, sessions: &mut [Session]) {
        sessions.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        if self.order == SortOrder::Descending {
            sessions.reverse();
        }
    }
}

/// Predicate + ordering over waves, sorted on `start_time`
#[derive(Debug, Clone, PartialEq)]
pub struct WaveQuery {
    pub session_id: Option<Uuid>,
    pub min_confidence: Option<f64>,
    pub order: SortOrder,
}

impl Default for WaveQuery {
    fn default() -> Self {
        Self {
            session_id: None,
            min_confidence: None,
            order: SortOrder::Ascending,
        }
    }
}

impl WaveQuery {
    /// Waves of one session in ride order
    pub fn for_session(session_id: Uuid) -> Self {
        Self {
            session_id: Some(session_id),
            ..Self::default()
        }
    }

    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = Some(confidence);
        self
    }

    pub fn matches(&self, wave: &Wave) -> bool {
        self.session_id.map_or(true, |id| wave.session_id == id)
            && self.min_confidence.map_or(true, |c| wave.confidence >= c)
    }

    pub fn sort(&self, waves: &mut [Wave]) {
        waves.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        if self.order == SortOrder::Descending {
            waves.reverse();
        }
    }
}

/// Persistence capability: atomic batch writes plus sorted predicate reads
pub trait SessionBackend {
    /// Apply every change or none of them
    ///
    /// # Errors
    ///
    /// `OrphanedWave` if a `PutWave` names a session that does not exist
    /// once the earlier changes of the batch are applied;
    /// `PersistenceFailure` if the engine rejects the transaction.
    fn commit(&mut self, changes: Vec<Change>) -> Result<()>;

    /// # Errors
    ///
    /// `PersistenceFailure` if the engine cannot be read.
    fn session(&self, id: Uuid) -> Result<Option<Session>>;

    /// # Errors
    ///
    /// `PersistenceFailure` if the engine cannot be read.
    fn wave(&self, id: Uuid) -> Result<Option<Wave>>;

    /// # Errors
    ///
    /// `PersistenceFailure` if the engine cannot be read.
    fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>>;

    /// # Errors
    ///
    /// `PersistenceFailure` if the engine cannot be read.
    fn waves(&self, query: &WaveQuery) -> Result<Vec<Wave>>;

    /// Make committed data durable; called on store shutdown
    ///
    /// # Errors
    ///
    /// `PersistenceFailure` if the engine cannot flush.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
