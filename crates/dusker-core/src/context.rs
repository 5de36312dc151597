//! Background editing context
//!
//! A [`BackgroundContext`] collects edits made away from the foreground
//! store (on another thread, or while a sync is in flight) and
//! [`SessionStore::merge`] folds them in with one commit. Each staged update
//! carries the record as it was when the edit started (`base`) and the
//! edited record. Fields the background did not touch keep their stored
//! value. Fields both sides changed to different values are conflicts,
//! decided by the [`MergePolicy`].

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::backend::{Change, SessionBackend, WaveQuery};
use crate::errors::{DuskerError, Result};
use crate::model::{NewWave, Session, Wave};
use crate::session_store::{aggregate, observed, settle_max_speed, AggregateMode, SessionStore};
use crate::types::TraceId;

/// Which side wins a field both sides changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The background edit overwrites the stored value
    #[default]
    IncomingWins,
    /// The stored value is kept
    StoredWins,
}

#[derive(Debug, Clone, PartialEq)]
enum Staged {
    UpdateSession { base: Session, edited: Session },
    UpdateWave { base: Wave, edited: Wave },
    AddWave { session_id: Uuid, wave: NewWave },
}

impl Staged {
    fn ensure_finite(&self) -> Result<()> {
        match self {
            Staged::UpdateSession { edited, .. } => edited.ensure_finite(),
            Staged::UpdateWave { edited, .. } => edited.ensure_finite(),
            Staged::AddWave { wave, .. } => wave.ensure_finite(),
        }
    }
}

/// Staged edits awaiting [`SessionStore::merge`]
///
/// Owns plain values only, so it can be moved to a worker thread.
#[derive(Debug, Clone)]
pub struct BackgroundContext {
    policy: MergePolicy,
    trace_id: TraceId,
    staged: Vec<Staged>,
}

impl BackgroundContext {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            trace_id: TraceId::new(),
            staged: Vec::new(),
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Correlates the merge's log lines with whatever produced the edits
    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = trace_id;
        self
    }

    /// # Errors
    ///
    /// `IdMismatch` if `edited` is not the same session as `base`.
    pub fn update_session(&mut self, base: Session, edited: Session) -> Result<()> {
        if base.id != edited.id {
            return Err(DuskerError::IdMismatch {
                expected: base.id,
                actual: edited.id,
            });
        }
        self.staged.push(Staged::UpdateSession { base, edited });
        Ok(())
    }

    /// # Errors
    ///
    /// `IdMismatch` if `edited` is not the same wave as `base`.
    pub fn update_wave(&mut self, base: Wave, edited: Wave) -> Result<()> {
        if base.id != edited.id {
            return Err(DuskerError::IdMismatch {
                expected: base.id,
                actual: edited.id,
            });
        }
        self.staged.push(Staged::UpdateWave { base, edited });
        Ok(())
    }

    pub fn add_wave(&mut self, session_id: Uuid, wave: NewWave) {
        self.staged.push(Staged::AddWave { session_id, wave });
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}

/// A field both sides changed
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConflict {
    pub record_id: Uuid,
    /// Serialized (camelCase) field name
    pub field: String,
    /// The policy that decided it
    pub resolution: MergePolicy,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Staged edits that were written
    pub applied: usize,
    pub added_waves: Vec<Wave>,
    pub conflicts: Vec<FieldConflict>,
    /// Records the edits targeted that no longer exist
    pub skipped: Vec<Uuid>,
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(DuskerError::Serialization {
            message: format!("expected an object, got {other}"),
        }),
    }
}

/// Store-owned fields a background copy never overrides
const PROTECTED_FIELDS: [&str; 3] = ["id", "sessionId", "totalWaves"];

/// Field-level three-way merge of `incoming` onto `stored`
fn merge_fields<T: Serialize + DeserializeOwned>(
    record_id: Uuid,
    stored: &T,
    base: &T,
    incoming: &T,
    policy: MergePolicy,
    conflicts: &mut Vec<FieldConflict>,
) -> Result<T> {
    let stored = to_object(stored)?;
    let base = to_object(base)?;
    let incoming = to_object(incoming)?;

    let mut merged = stored.clone();
    for (field, theirs) in incoming {
        if PROTECTED_FIELDS.contains(&field.as_str()) {
            continue;
        }
        let original = base.get(&field);
        if original == Some(&theirs) {
            continue;
        }
        let ours = stored.get(&field);
        if ours != original && ours != Some(&theirs) {
            conflicts.push(FieldConflict {
                record_id,
                field: field.clone(),
                resolution: policy,
            });
            if policy == MergePolicy::StoredWins {
                continue;
            }
        }
        merged.insert(field, theirs);
    }

    Ok(serde_json::from_value(Value::Object(merged))?)
}

/// Records touched so far in a merge, layered over the backend
struct Overlay<'a, B: SessionBackend> {
    backend: &'a B,
    sessions: BTreeMap<Uuid, Session>,
    waves: HashMap<Uuid, Wave>,
}

impl<'a, B: SessionBackend> Overlay<'a, B> {
    fn session(&self, id: Uuid) -> Result<Option<Session>> {
        match self.sessions.get(&id) {
            Some(s) => Ok(Some(s.clone())),
            None => self.backend.session(id),
        }
    }

    fn wave(&self, id: Uuid) -> Result<Option<Wave>> {
        match self.waves.get(&id) {
            Some(w) => Ok(Some(w.clone())),
            None => self.backend.wave(id),
        }
    }

    /// Stored waves of a session with the pending ones laid over them
    fn live_waves(&self, session_id: Uuid) -> Result<Vec<Wave>> {
        let mut live = self.backend.waves(&WaveQuery::for_session(session_id))?;
        for pending in self.waves.values().filter(|w| w.session_id == session_id) {
            match live.iter_mut().find(|w| w.id == pending.id) {
                Some(slot) => *slot = pending.clone(),
                None => live.push(pending.clone()),
            }
        }
        Ok(live)
    }
}

impl<B: SessionBackend> SessionStore<B> {
    /// A fresh context using this store's merge policy
    pub fn background_context(&self) -> BackgroundContext {
        BackgroundContext::new(self.options.merge_policy)
    }

    /// Fold a background context's edits into the store in one commit
    ///
    /// Edits whose target record has been deleted meanwhile are reported in
    /// [`MergeReport::skipped`], not treated as errors. `total_waves` is
    /// never taken from the background copy.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a staged record carries a NaN or infinite metric,
    /// `PersistenceFailure` if the commit is rejected, `Serialization` if a
    /// record cannot be merged. None of the edits are applied in any of
    /// these cases.
    pub fn merge(&mut self, context: BackgroundContext) -> Result<MergeReport> {
        observed("merge", || {
            tracing::debug!(
                trace_id = context.trace_id.as_str(),
                staged = context.staged.len(),
                policy = ?context.policy,
                "merging background context"
            );
            for staged in &context.staged {
                staged.ensure_finite()?;
            }

            let mode = self.options.aggregate_mode;
            let mut report = MergeReport::default();
            let mut overlay = Overlay {
                backend: &self.backend,
                sessions: BTreeMap::new(),
                waves: HashMap::new(),
            };
            let mut wave_order = Vec::new();
            // session id -> fastest pre-edit speed among its edited waves
            let mut recompute: BTreeMap<Uuid, f64> = BTreeMap::new();

            for staged in context.staged {
                match staged {
                    Staged::UpdateSession { base, edited } => {
                        let Some(stored) = overlay.session(edited.id)? else {
                            report.skipped.push(edited.id);
                            continue;
                        };
                        let mut merged: Session = merge_fields(
                            stored.id,
                            &stored,
                            &base,
                            &edited,
                            context.policy,
                            &mut report.conflicts,
                        )?;
                        let (_, fastest) = aggregate(&overlay.live_waves(stored.id)?);
                        merged.max_speed = merged.max_speed.max(fastest);
                        overlay.sessions.insert(merged.id, merged);
                    }
                    Staged::UpdateWave { base, edited } => {
                        let Some(stored) = overlay.wave(edited.id)? else {
                            report.skipped.push(edited.id);
                            continue;
                        };
                        let merged: Wave = merge_fields(
                            stored.id,
                            &stored,
                            &base,
                            &edited,
                            context.policy,
                            &mut report.conflicts,
                        )?;
                        if mode == AggregateMode::Recompute {
                            let previous = recompute
                                .entry(merged.session_id)
                                .or_insert(stored.max_speed);
                            *previous = previous.max(stored.max_speed);
                        }
                        if !wave_order.contains(&merged.id) {
                            wave_order.push(merged.id);
                        }
                        overlay.waves.insert(merged.id, merged);
                    }
                    Staged::AddWave { session_id, wave } => {
                        let Some(mut parent) = overlay.session(session_id)? else {
                            report.skipped.push(session_id);
                            continue;
                        };
                        let wave = wave.into_wave(Uuid::now_v7(), session_id);
                        parent.total_waves += 1;
                        if wave.max_speed > parent.max_speed {
                            parent.max_speed = wave.max_speed;
                        }
                        overlay.sessions.insert(parent.id, parent);
                        wave_order.push(wave.id);
                        report.added_waves.push(wave.clone());
                        overlay.waves.insert(wave.id, wave);
                    }
                }
                report.applied += 1;
            }

            for (session_id, previous) in recompute {
                if let Some(mut parent) = overlay.session(session_id)? {
                    let (count, fastest) = aggregate(&overlay.live_waves(session_id)?);
                    parent.total_waves = count;
                    parent.max_speed = settle_max_speed(parent.max_speed, previous, fastest);
                    overlay.sessions.insert(session_id, parent);
                }
            }

            let Overlay {
                sessions, mut waves, ..
            } = overlay;
            let mut changes: Vec<Change> = sessions.into_values().map(Change::PutSession).collect();
            changes.extend(
                wave_order
                    .iter()
                    .filter_map(|id| waves.remove(id))
                    .map(Change::PutWave),
            );

            if !changes.is_empty() {
                self.backend.commit(changes)?;
            }
            if !report.skipped.is_empty() {
                tracing::warn!(
                    trace_id = context.trace_id.as_str(),
                    skipped = report.skipped.len(),
                    "background edits targeted deleted records"
                );
            }
            Ok(report)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewSession;

    fn session() -> Session {
        NewSession::at("Malibu", chrono::Utc::now()).into_session(Uuid::now_v7())
    }

    #[test]
    fn test_untouched_fields_keep_stored_value() {
        let base = session();
        let mut stored = base.clone();
        stored.notes = Some("foreground".into());
        let mut incoming = base.clone();
        incoming.location = "Zuma".into();

        let mut conflicts = Vec::new();
        let merged = merge_fields(
            base.id,
            &stored,
            &base,
            &incoming,
            MergePolicy::IncomingWins,
            &mut conflicts,
        )
        .unwrap();

        assert!(conflicts.is_empty());
        assert_eq!(merged.notes.as_deref(), Some("foreground"));
        assert_eq!(merged.location, "Zuma");
    }

    #[test]
    fn test_conflict_resolution_follows_policy() {
        let base = session();
        let mut stored = base.clone();
        stored.location = "Stored".into();
        let mut incoming = base.clone();
        incoming.location = "Incoming".into();

        for (policy, expected) in [
            (MergePolicy::IncomingWins, "Incoming"),
            (MergePolicy::StoredWins, "Stored"),
        ] {
            let mut conflicts = Vec::new();
            let merged =
                merge_fields(base.id, &stored, &base, &incoming, policy, &mut conflicts).unwrap();
            assert_eq!(merged.location, expected);
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].field, "location");
            assert_eq!(conflicts[0].resolution, policy);
        }
    }

    #[test]
    fn test_same_change_on_both_sides_is_no_conflict() {
        let base = session();
        let mut stored = base.clone();
        stored.is_uploaded = true;
        let incoming = stored.clone();

        let mut conflicts = Vec::new();
        merge_fields(
            base.id,
            &stored,
            &base,
            &incoming,
            MergePolicy::StoredWins,
            &mut conflicts,
        )
        .unwrap();
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_protected_fields_are_never_merged() {
        let base = session();
        let mut stored = base.clone();
        stored.total_waves = 3;
        let mut incoming = base.clone();
        incoming.total_waves = 99;

        let mut conflicts = Vec::new();
        let merged = merge_fields(
            base.id,
            &stored,
            &base,
            &incoming,
            MergePolicy::IncomingWins,
            &mut conflicts,
        )
        .unwrap();

        assert!(conflicts.is_empty());
        assert_eq!(merged.total_waves, 3);
    }

    #[test]
    fn test_context_rejects_mismatched_ids() {
        let mut ctx = BackgroundContext::new(MergePolicy::default());
        let err = ctx.update_session(session(), session()).unwrap_err();
        assert!(matches!(err, DuskerError::IdMismatch { .. }));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_context_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<BackgroundContext>();
    }
}
