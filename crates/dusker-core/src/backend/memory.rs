use std::collections::HashMap;

use uuid::Uuid;

use super::{Change, SessionBackend, SessionQuery, WaveQuery};
use crate::errors::{DuskerError, Result};
use crate::model::{Session, Wave};
use crate::schema::{DeleteRule, SESSION_WAVES};

/// HashMap-backed storage
///
/// Waves are indexed by id and carry their owner's id. A commit applies its
/// changes in place and records what each one overwrote; if a later change
/// fails, the log is replayed backwards and the maps end up as they were.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    sessions: HashMap<Uuid, Session>,
    waves: HashMap<Uuid, Wave>,
}

/// Prior value of one slot touched by an in-flight commit
enum Undo {
    Session(Uuid, Option<Session>),
    Wave(Uuid, Option<Wave>),
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&mut self, change: Change, undo: &mut Vec<Undo>) -> Result<()> {
        match change {
            Change::PutSession(session) => {
                let id = session.id;
                undo.push(Undo::Session(id, self.sessions.insert(id, session)));
            }
            Change::PutWave(wave) => {
                if !self.sessions.contains_key(&wave.session_id) {
                    return Err(DuskerError::OrphanedWave {
                        wave_id: wave.id,
                        session_id: wave.session_id,
                    });
                }
                let id = wave.id;
                undo.push(Undo::Wave(id, self.waves.insert(id, wave)));
            }
            Change::DeleteSession(id) => {
                let owned: Vec<Uuid> = self
                    .waves
                    .values()
                    .filter(|w| w.session_id == id)
                    .map(|w| w.id)
                    .collect();
                match SESSION_WAVES.delete_rule {
                    DeleteRule::Cascade => {
                        for wave_id in owned {
                            undo.push(Undo::Wave(wave_id, self.waves.remove(&wave_id)));
                        }
                    }
                    DeleteRule::Nullify | DeleteRule::Deny => {
                        // A wave cannot outlive its session.
                        if let Some(wave_id) = owned.first() {
                            return Err(DuskerError::OrphanedWave {
                                wave_id: *wave_id,
                                session_id: id,
                            });
                        }
                    }
                }
                undo.push(Undo::Session(id, self.sessions.remove(&id)));
            }
            Change::DeleteWave(id) => {
                undo.push(Undo::Wave(id, self.waves.remove(&id)));
            }
        }
        Ok(())
    }

    fn roll_back(&mut self, undo: Vec<Undo>) {
        for entry in undo.into_iter().rev() {
            match entry {
                Undo::Session(id, Some(prior)) => {
                    self.sessions.insert(id, prior);
                }
                Undo::Session(id, None) => {
                    self.sessions.remove(&id);
                }
                Undo::Wave(id, Some(prior)) => {
                    self.waves.insert(id, prior);
                }
                Undo::Wave(id, None) => {
                    self.waves.remove(&id);
                }
            }
        }
    }
}

impl SessionBackend for MemoryBackend {
    fn commit(&mut self, changes: Vec<Change>) -> Result<()> {
        let mut undo = Vec::with_capacity(changes.len());
        for change in changes {
            if let Err(err) = self.apply(change, &mut undo) {
                self.roll_back(undo);
                return Err(err);
            }
        }
        Ok(())
    }

    fn session(&self, id: Uuid) -> Result<Option<Session>> {
        Ok(self.sessions.get(&id).cloned())
    }

    fn wave(&self, id: Uuid) -> Result<Option<Wave>> {
        Ok(self.waves.get(&id).cloned())
    }

    fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>> {
        let mut out: Vec<Session> = self
            .sessions
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        query.sort(&mut out);
        Ok(out)
    }

    fn waves(&self, query: &WaveQuery) -> Result<Vec<Wave>> {
        let mut out: Vec<Wave> = self
            .waves
            .values()
            .filter(|w| query.matches(w))
            .cloned()
            .collect();
        query.sort(&mut out);
        Ok(out)
    }
}
