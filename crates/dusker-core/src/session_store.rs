//! Session store facade
//!
//! The only mutator of persisted sessions and waves. Every operation reads
//! the current stored parent, computes the new records, writes them in a
//! single backend commit and only then updates the caller's copy, so a
//! failed commit leaves both the stored state and the caller's record as
//! they were.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{Change, SessionBackend, SessionQuery, WaveQuery};
use crate::context::MergePolicy;
use crate::errors::{DuskerError, Result};
use crate::model::{NewSession, NewWave, Session, Wave};
use crate::{log_op_end, log_op_error, log_op_start};

/// How session aggregates react to wave updates and deletes
///
/// Additions behave the same in both modes: `total_waves` + 1 and a running
/// maximum on `max_speed`. In both modes a session's `max_speed` may sit above
/// its fastest wave when the caller set it so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMode {
    /// Delete decrements `total_waves`; nothing else is touched
    Incremental,
    /// Rebuild `total_waves` from the live waves; `max_speed` falls back to
    /// the fastest live wave only when the edited or removed wave had set it
    #[default]
    Recompute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreOptions {
    pub aggregate_mode: AggregateMode,
    pub merge_policy: MergePolicy,
}

/// Create/read/update/delete over sessions and their waves
pub struct SessionStore<B: SessionBackend> {
    pub(crate) backend: B,
    pub(crate) options: StoreOptions,
}

/// Run `f` bracketed by start/end (or end_error) log events
pub(crate) fn observed<T>(op: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    log_op_start!(op);
    let start = Instant::now();
    let result = f();
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => {
            log_op_end!(op, duration_ms = duration_ms);
        }
        Err(err) => {
            log_op_error!(op, err, duration_ms = duration_ms);
        }
    }
    result
}

/// New `max_speed` for a session after one of its waves changed or went away
///
/// `previous` is the wave's speed before the edit. A value the caller set
/// above every wave survives unless that wave is the one that reached it.
pub(crate) fn settle_max_speed(current: f64, previous: f64, fastest: f64) -> f64 {
    if previous >= current {
        fastest
    } else {
        current.max(fastest)
    }
}

/// `(count, fastest)` over a set of waves; fastest is 0 for an empty set
pub(crate) fn aggregate<'a>(waves: impl IntoIterator<Item = &'a Wave>) -> (u32, f64) {
    waves
        .into_iter()
        .fold((0, 0.0), |(count, fastest), w| (count + 1, fastest.max(w.max_speed)))
}

impl<B: SessionBackend> SessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, StoreOptions::default())
    }

    pub fn with_options(backend: B, options: StoreOptions) -> Self {
        Self { backend, options }
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Flush the backend and hand it back
    ///
    /// # Errors
    ///
    /// `PersistenceFailure` if the backend cannot flush.
    pub fn close(mut self) -> Result<B> {
        observed("close", || self.backend.flush())?;
        Ok(self.backend)
    }

    // ===== Sessions =====

    /// Persist a new session under a fresh identifier
    ///
    /// No duplicate detection: identical field sets yield distinct sessions.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a metric is NaN or infinite, `PersistenceFailure`
    /// if the commit is rejected.
    pub fn create_session(&mut self, new: NewSession) -> Result<Session> {
        observed("create_session", || {
            let session = new.into_session(Uuid::now_v7());
            session.ensure_finite()?;
            self.backend
                .commit(vec![Change::PutSession(session.clone())])?;
            tracing::debug!(session_id = %session.id, location = %session.location, "session created");
            Ok(session)
        })
    }

    /// Overwrite every caller-owned field of `existing` with `values`
    ///
    /// `total_waves` stays store-owned and `max_speed` is never set below the
    /// fastest wave the session owns. On success `existing` holds the stored
    /// record.
    ///
    /// # Errors
    ///
    /// `IdMismatch` if `values` belongs to another record, `InvalidInput` for
    /// a non-finite metric, `SessionNotFound` if `existing` is not stored,
    /// `PersistenceFailure` on commit.
    pub fn update_session(&mut self, existing: &mut Session, values: &Session) -> Result<()> {
        observed("update_session", || {
            if values.id != existing.id {
                return Err(DuskerError::IdMismatch {
                    expected: existing.id,
                    actual: values.id,
                });
            }
            values.ensure_finite()?;

            let mut updated = self.require_session(existing.id)?;
            updated.overwrite_from(values);
            let (_, fastest) = aggregate(&self.backend.waves(&WaveQuery::for_session(updated.id))?);
            updated.max_speed = updated.max_speed.max(fastest);

            self.backend
                .commit(vec![Change::PutSession(updated.clone())])?;
            *existing = updated;
            Ok(())
        })
    }

    /// Remove a session and all of its waves in one commit
    ///
    /// # Errors
    ///
    /// `SessionNotFound` if it is not stored, `PersistenceFailure` on commit
    /// (nothing is removed in that case).
    pub fn delete_session(&mut self, session: &Session) -> Result<()> {
        observed("delete_session", || {
            self.require_session(session.id)?;
            self.backend.commit(vec![Change::DeleteSession(session.id)])?;
            tracing::debug!(session_id = %session.id, "session deleted with its waves");
            Ok(())
        })
    }

    /// All sessions, newest `start_date` first; empty when there are none
    ///
    /// # Errors
    ///
    /// `PersistenceFailure` if the backend cannot be read.
    pub fn get_all_sessions(&self) -> Result<Vec<Session>> {
        observed("get_all_sessions", || {
            self.backend.sessions(&SessionQuery::newest_first())
        })
    }

    /// # Errors
    ///
    /// `PersistenceFailure` if the backend cannot be read. A missing session
    /// is `Ok(None)`.
    pub fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        observed("get_session", || self.backend.session(id))
    }

    /// Sessions whose `is_uploaded` flag is still false, newest first
    ///
    /// # Errors
    ///
    /// `PersistenceFailure` if the backend cannot be read.
    pub fn sessions_pending_upload(&self) -> Result<Vec<Session>> {
        observed("sessions_pending_upload", || {
            self.backend
                .sessions(&SessionQuery::newest_first().uploaded(false))
        })
    }

    // ===== Waves =====

    /// Attach a new wave to `session`
    ///
    /// The wave and the parent's updated `total_waves`/`max_speed` are
    /// committed together. On success `session` holds the stored parent.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a metric is NaN or infinite, `SessionNotFound` if
    /// `session` is not stored, `PersistenceFailure` on commit.
    pub fn add_wave(&mut self, session: &mut Session, new: NewWave) -> Result<Wave> {
        observed("add_wave", || {
            let mut parent = self.require_session(session.id)?;
            let wave = new.into_wave(Uuid::now_v7(), parent.id);
            wave.ensure_finite()?;

            parent.total_waves += 1;
            if wave.max_speed > parent.max_speed {
                parent.max_speed = wave.max_speed;
            }

            self.backend.commit(vec![
                Change::PutWave(wave.clone()),
                Change::PutSession(parent.clone()),
            ])?;
            tracing::debug!(
                session_id = %parent.id,
                wave_id = %wave.id,
                total_waves = parent.total_waves,
                "wave added"
            );
            *session = parent;
            Ok(wave)
        })
    }

    /// Overwrite the ride fields of `existing` with `values`
    ///
    /// The wave keeps its session. Under [`AggregateMode::Recompute`] the
    /// parent's aggregates are rebuilt in the same commit.
    ///
    /// # Errors
    ///
    /// `IdMismatch`, `InvalidInput` for a non-finite metric, `WaveNotFound`,
    /// or `PersistenceFailure` on commit.
    pub fn update_wave(&mut self, existing: &mut Wave, values: &Wave) -> Result<()> {
        observed("update_wave", || {
            if values.id != existing.id {
                return Err(DuskerError::IdMismatch {
                    expected: existing.id,
                    actual: values.id,
                });
            }
            values.ensure_finite()?;

            let stored = self.require_wave(existing.id)?;
            let mut updated = stored.clone();
            updated.overwrite_from(values);

            let mut changes = vec![Change::PutWave(updated.clone())];
            if self.options.aggregate_mode == AggregateMode::Recompute {
                if let Some(parent) = self.backend.session(updated.session_id)? {
                    let parent = self.recompute(parent, &stored, Some(&updated))?;
                    changes.push(Change::PutSession(parent));
                }
            }

            self.backend.commit(changes)?;
            *existing = updated;
            Ok(())
        })
    }

    /// Remove a wave and adjust its parent's aggregates
    ///
    /// # Errors
    ///
    /// `WaveNotFound` if it is not stored, `PersistenceFailure` on commit.
    pub fn delete_wave(&mut self, wave: &Wave) -> Result<()> {
        observed("delete_wave", || {
            let stored = self.require_wave(wave.id)?;
            let mut changes = vec![Change::DeleteWave(stored.id)];

            match self.backend.session(stored.session_id)? {
                Some(mut parent) => {
                    match self.options.aggregate_mode {
                        AggregateMode::Incremental => {
                            parent.total_waves = parent.total_waves.saturating_sub(1);
                        }
                        AggregateMode::Recompute => {
                            parent = self.recompute(parent, &stored, None)?;
                        }
                    }
                    changes.push(Change::PutSession(parent));
                }
                None => {
                    tracing::warn!(
                        wave_id = %stored.id,
                        session_id = %stored.session_id,
                        "deleting wave whose session is gone"
                    );
                }
            }

            self.backend.commit(changes)
        })
    }

    /// Waves of a session by `start_time`, earliest first
    ///
    /// # Errors
    ///
    /// `PersistenceFailure` if the backend cannot be read.
    pub fn get_waves_for_session(&self, session_id: Uuid) -> Result<Vec<Wave>> {
        observed("get_waves_for_session", || {
            self.backend.waves(&WaveQuery::for_session(session_id))
        })
    }

    // ===== Helpers =====

    pub(crate) fn require_session(&self, id: Uuid) -> Result<Session> {
        self.backend
            .session(id)?
            .ok_or(DuskerError::SessionNotFound { session_id: id })
    }

    pub(crate) fn require_wave(&self, id: Uuid) -> Result<Wave> {
        self.backend
            .wave(id)?
            .ok_or(DuskerError::WaveNotFound { wave_id: id })
    }

    /// Rebuild `parent`'s aggregates with one pending change to `previous`
    /// (its stored version): replaced by `edited`, or removed when `edited`
    /// is `None`.
    pub(crate) fn recompute(
        &self,
        mut parent: Session,
        previous: &Wave,
        edited: Option<&Wave>,
    ) -> Result<Session> {
        let mut live = self.backend.waves(&WaveQuery::for_session(parent.id))?;
        live.retain(|w| w.id != previous.id);
        live.extend(edited.cloned());

        let (count, fastest) = aggregate(&live);
        parent.total_waves = count;
        parent.max_speed = settle_max_speed(parent.max_speed, previous.max_speed, fastest);
        Ok(parent)
    }
}
