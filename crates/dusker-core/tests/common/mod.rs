use chrono::{DateTime, Duration, Utc};
use dusker_core::backend::{Change, MemoryBackend, SessionBackend, SessionQuery, WaveQuery};
use dusker_core::errors::{DuskerError, Result};
use dusker_core::{NewSession, Session, SessionStore, StoreOptions, Wave};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Memory backend whose commits can be made to fail on demand
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FailingBackend {
    pub inner: MemoryBackend,
    pub fail_commits: Arc<AtomicBool>,
}

impl SessionBackend for FailingBackend {
    fn commit(&mut self, changes: Vec<Change>) -> Result<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(DuskerError::persistence("commit", "injected failure"));
        }
        self.inner.commit(changes)
    }

    fn session(&self, id: Uuid) -> Result<Option<Session>> {
        self.inner.session(id)
    }

    fn wave(&self, id: Uuid) -> Result<Option<Wave>> {
        self.inner.wave(id)
    }

    fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>> {
        self.inner.sessions(query)
    }

    fn waves(&self, query: &WaveQuery) -> Result<Vec<Wave>> {
        self.inner.waves(query)
    }
}

#[allow(dead_code)]
pub fn memory_store() -> SessionStore<MemoryBackend> {
    SessionStore::new(MemoryBackend::new())
}

#[allow(dead_code)]
pub fn memory_store_with(options: StoreOptions) -> SessionStore<MemoryBackend> {
    SessionStore::with_options(MemoryBackend::new(), options)
}

/// A store plus the switch that makes its commits fail
#[allow(dead_code)]
pub fn failing_store() -> (SessionStore<FailingBackend>, Arc<AtomicBool>) {
    let backend = FailingBackend::default();
    let switch = backend.fail_commits.clone();
    (SessionStore::new(backend), switch)
}

/// A session with every field set to a non-default value
#[allow(dead_code)]
pub fn full_session(start: DateTime<Utc>) -> NewSession {
    NewSession {
        start_date: start,
        end_date: Some(start + Duration::minutes(95)),
        location: "Rincon".to_string(),
        latitude: 34.3736,
        longitude: -119.4768,
        max_speed: 6.5,
        avg_heart_rate: 131.0,
        distance_surfed: 740.5,
        distance_paddled: 2210.25,
        stroke_count: 811,
        notes: Some("Glassy, chest high".to_string()),
        is_uploaded: true,
    }
}
