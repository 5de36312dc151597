#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::{Duration, Utc};
use common::{failing_store, full_session, memory_store};
use dusker_core::errors::DuskerError;
use dusker_core::{NewSession, NewWave};
use std::sync::atomic::Ordering;
use uuid::Uuid;

#[test]
fn test_create_then_get_round_trips_every_field() {
    let mut store = memory_store();
    let input = full_session(Utc::now() - Duration::hours(2));

    let created = store.create_session(input.clone()).unwrap();
    let fetched = store.get_session(created.id).unwrap().unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.location, input.location);
    assert_eq!(fetched.end_date, input.end_date);
    assert_eq!(fetched.notes, input.notes);
    assert_eq!(fetched.stroke_count, input.stroke_count);
    assert_eq!(fetched.total_waves, 0);
}

#[test]
fn test_absent_end_date_stays_absent() {
    let mut store = memory_store();
    let created = store.create_session(NewSession::default()).unwrap();

    let fetched = store.get_session(created.id).unwrap().unwrap();
    assert!(fetched.end_date.is_none());
    assert!(fetched.is_ongoing());
}

#[test]
fn test_identical_fields_make_distinct_sessions() {
    let mut store = memory_store();
    let fields = full_session(Utc::now());

    let a = store.create_session(fields.clone()).unwrap();
    let b = store.create_session(fields).unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(store.get_all_sessions().unwrap().len(), 2);
}

#[test]
fn test_get_session_missing_is_none() {
    let store = memory_store();
    assert_eq!(store.get_session(Uuid::now_v7()).unwrap(), None);
}

#[test]
fn test_get_all_sessions_empty() {
    assert!(memory_store().get_all_sessions().unwrap().is_empty());
}

#[test]
fn test_get_all_sessions_newest_first() {
    let mut store = memory_store();
    let now = Utc::now();
    let older = store
        .create_session(NewSession::at("Older", now - Duration::hours(2)))
        .unwrap();
    let newer = store
        .create_session(NewSession::at("Newer", now - Duration::hours(1)))
        .unwrap();

    let ids: Vec<_> = store
        .get_all_sessions()
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[test]
fn test_update_session_overwrites_fields() {
    let mut store = memory_store();
    let mut session = store.create_session(NewSession::default()).unwrap();

    let mut values = session.clone();
    values.location = "Ocean Beach".to_string();
    values.notes = Some("Big and cold".to_string());
    values.end_date = Some(session.start_date + Duration::hours(1));
    values.is_uploaded = true;

    store.update_session(&mut session, &values).unwrap();

    assert_eq!(session, values);
    assert_eq!(store.get_session(session.id).unwrap(), Some(values));
}

#[test]
fn test_update_session_keeps_store_owned_wave_count() {
    let mut store = memory_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    store.add_wave(&mut session, NewWave::default()).unwrap();

    let mut values = session.clone();
    values.total_waves = 40;
    store.update_session(&mut session, &values).unwrap();

    assert_eq!(session.total_waves, 1);
}

#[test]
fn test_update_session_never_lowers_max_speed_below_a_wave() {
    let mut store = memory_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    store
        .add_wave(&mut session, NewWave::starting_at(Utc::now(), 9.5))
        .unwrap();

    let mut values = session.clone();
    values.max_speed = 2.0;
    store.update_session(&mut session, &values).unwrap();
    assert_eq!(session.max_speed, 9.5);

    values.max_speed = 14.0;
    store.update_session(&mut session, &values).unwrap();
    assert_eq!(session.max_speed, 14.0);
}

#[test]
fn test_update_session_rejects_foreign_values() {
    let mut store = memory_store();
    let mut a = store.create_session(NewSession::at("A", Utc::now())).unwrap();
    let b = store.create_session(NewSession::at("B", Utc::now())).unwrap();

    let err = store.update_session(&mut a, &b).unwrap_err();

    assert!(matches!(err, DuskerError::IdMismatch { .. }));
    assert_eq!(store.get_session(a.id).unwrap().unwrap().location, "A");
}

#[test]
fn test_update_session_not_stored() {
    let mut store = memory_store();
    let mut session = memory_store()
        .create_session(NewSession::default())
        .unwrap();
    let values = session.clone();

    let err = store.update_session(&mut session, &values).unwrap_err();
    assert!(matches!(err, DuskerError::SessionNotFound { .. }));
}

#[test]
fn test_delete_session_cascades_to_waves() {
    let mut store = memory_store();
    let mut doomed = store.create_session(NewSession::default()).unwrap();
    let mut kept = store.create_session(NewSession::default()).unwrap();
    for _ in 0..4 {
        store.add_wave(&mut doomed, NewWave::default()).unwrap();
    }
    store.add_wave(&mut kept, NewWave::default()).unwrap();

    store.delete_session(&doomed).unwrap();

    assert!(store.get_waves_for_session(doomed.id).unwrap().is_empty());
    assert_eq!(store.get_waves_for_session(kept.id).unwrap().len(), 1);
    let remaining: Vec<_> = store
        .get_all_sessions()
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(remaining, vec![kept.id]);
}

#[test]
fn test_delete_missing_session() {
    let mut store = memory_store();
    let session = memory_store()
        .create_session(NewSession::default())
        .unwrap();

    let err = store.delete_session(&session).unwrap_err();
    assert!(matches!(err, DuskerError::SessionNotFound { .. }));
}

#[test]
fn test_add_wave_running_max() {
    let mut store = memory_store();
    let mut session = store.create_session(NewSession::default()).unwrap();

    for speed in [5.0, 12.0, 8.0] {
        store
            .add_wave(&mut session, NewWave::starting_at(Utc::now(), speed))
            .unwrap();
    }

    let stored = store.get_session(session.id).unwrap().unwrap();
    assert_eq!(stored.total_waves, 3);
    assert_eq!(stored.max_speed, 12.0);
}

#[test]
fn test_added_wave_belongs_to_session() {
    let mut store = memory_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    let coordinates = br#"[{"latitude":1.0,"longitude":2.0,"timestamp":0.0}]"#.to_vec();

    let wave = store
        .add_wave(
            &mut session,
            NewWave {
                coordinates: coordinates.clone(),
                ..NewWave::default()
            },
        )
        .unwrap();

    assert_eq!(wave.session_id, session.id);
    assert_eq!(store.get_waves_for_session(session.id).unwrap(), vec![wave.clone()]);
    assert_eq!(wave.coordinates, coordinates);
}

#[test]
fn test_waves_sorted_by_start_time() {
    let mut store = memory_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    let t0 = session.start_date;

    let late = store
        .add_wave(&mut session, NewWave::starting_at(t0 + Duration::minutes(20), 3.0))
        .unwrap();
    let early = store
        .add_wave(&mut session, NewWave::starting_at(t0 + Duration::minutes(5), 4.0))
        .unwrap();
    let middle = store
        .add_wave(&mut session, NewWave::starting_at(t0 + Duration::minutes(10), 5.0))
        .unwrap();

    let ids: Vec<_> = store
        .get_waves_for_session(session.id)
        .unwrap()
        .into_iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(ids, vec![early.id, middle.id, late.id]);
}

#[test]
fn test_waves_for_unknown_session_is_empty() {
    let store = memory_store();
    assert!(store.get_waves_for_session(Uuid::now_v7()).unwrap().is_empty());
}

#[test]
fn test_update_wave_keeps_identity_and_parent() {
    let mut store = memory_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    let mut wave = store.add_wave(&mut session, NewWave::default()).unwrap();

    let mut values = wave.clone();
    values.distance = 180.0;
    values.confidence = 0.42;
    values.session_id = Uuid::now_v7();
    store.update_wave(&mut wave, &values).unwrap();

    assert_eq!(wave.session_id, session.id);
    assert_eq!(wave.distance, 180.0);
    assert_eq!(store.get_waves_for_session(session.id).unwrap(), vec![wave]);
}

#[test]
fn test_update_wave_rejects_foreign_values() {
    let mut store = memory_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    let mut a = store.add_wave(&mut session, NewWave::default()).unwrap();
    let b = store.add_wave(&mut session, NewWave::default()).unwrap();

    let err = store.update_wave(&mut a, &b).unwrap_err();
    assert!(matches!(err, DuskerError::IdMismatch { .. }));
}

#[test]
fn test_delete_wave_decrements_count() {
    let mut store = memory_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    let first = store.add_wave(&mut session, NewWave::default()).unwrap();
    store.add_wave(&mut session, NewWave::default()).unwrap();

    store.delete_wave(&first).unwrap();

    let stored = store.get_session(session.id).unwrap().unwrap();
    assert_eq!(stored.total_waves, 1);
    assert_eq!(store.get_waves_for_session(session.id).unwrap().len(), 1);
}

#[test]
fn test_delete_missing_wave() {
    let mut store = memory_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    let wave = store.add_wave(&mut session, NewWave::default()).unwrap();
    store.delete_wave(&wave).unwrap();

    let err = store.delete_wave(&wave).unwrap_err();
    assert!(matches!(err, DuskerError::WaveNotFound { .. }));
}

#[test]
fn test_pending_upload_filters_uploaded() {
    let mut store = memory_store();
    let uploaded = full_session(Utc::now());
    let pending = NewSession::at("Pending", Utc::now());
    store.create_session(uploaded).unwrap();
    let pending = store.create_session(pending).unwrap();

    assert_eq!(store.sessions_pending_upload().unwrap(), vec![pending]);
}

#[test]
fn test_failed_add_wave_leaves_everything_untouched() {
    let (mut store, fail) = failing_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    let before = session.clone();

    fail.store(true, Ordering::SeqCst);
    let err = store
        .add_wave(&mut session, NewWave::starting_at(Utc::now(), 30.0))
        .unwrap_err();
    fail.store(false, Ordering::SeqCst);

    assert!(matches!(err, DuskerError::PersistenceFailure { .. }));
    assert_eq!(session, before);
    assert_eq!(store.get_session(session.id).unwrap(), Some(before));
    assert!(store.get_waves_for_session(session.id).unwrap().is_empty());
}

#[test]
fn test_failed_delete_session_removes_nothing() {
    let (mut store, fail) = failing_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    store.add_wave(&mut session, NewWave::default()).unwrap();

    fail.store(true, Ordering::SeqCst);
    let err = store.delete_session(&session).unwrap_err();
    fail.store(false, Ordering::SeqCst);

    assert!(matches!(err, DuskerError::PersistenceFailure { .. }));
    assert!(store.get_session(session.id).unwrap().is_some());
    assert_eq!(store.get_waves_for_session(session.id).unwrap().len(), 1);
}

#[test]
fn test_failed_update_session_keeps_callers_record() {
    let (mut store, fail) = failing_store();
    let mut session = store.create_session(NewSession::default()).unwrap();
    let before = session.clone();
    let mut values = session.clone();
    values.location = "Elsewhere".to_string();

    fail.store(true, Ordering::SeqCst);
    assert!(store.update_session(&mut session, &values).is_err());
    fail.store(false, Ordering::SeqCst);

    assert_eq!(session, before);
}

#[test]
fn test_close_returns_backend_with_data() {
    let mut store = memory_store();
    let session = store.create_session(NewSession::default()).unwrap();

    let backend = store.close().unwrap();
    let reopened = dusker_core::SessionStore::new(backend);

    assert_eq!(reopened.get_session(session.id).unwrap(), Some(session));
}

#[test]
fn test_non_finite_metrics_are_rejected_before_commit() {
    let mut store = memory_store();
    let mut session = store
        .create_session(full_session(Utc::now() - Duration::hours(1)))
        .unwrap();
    let mut wave = store
        .add_wave(&mut session, NewWave::starting_at(Utc::now(), 7.0))
        .unwrap();

    let err = store
        .create_session(NewSession {
            avg_heart_rate: f64::NAN,
            ..NewSession::default()
        })
        .unwrap_err();
    assert!(matches!(err, DuskerError::InvalidInput { .. }));

    let mut values = session.clone();
    values.latitude = f64::INFINITY;
    let err = store.update_session(&mut session, &values).unwrap_err();
    assert!(matches!(err, DuskerError::InvalidInput { .. }));

    let mut new = NewWave::starting_at(Utc::now(), 8.0);
    new.confidence = f64::NAN;
    let err = store.add_wave(&mut session, new).unwrap_err();
    assert!(matches!(err, DuskerError::InvalidInput { .. }));

    let mut values = wave.clone();
    values.max_speed = f64::NEG_INFINITY;
    let err = store.update_wave(&mut wave, &values).unwrap_err();
    assert!(matches!(err, DuskerError::InvalidInput { .. }));

    assert_eq!(store.get_all_sessions().unwrap(), vec![session.clone()]);
    assert_eq!(store.get_waves_for_session(session.id).unwrap(), vec![wave]);
}

#[test]
fn test_merge_rejects_non_finite_metrics() {
    let mut store = memory_store();
    let session = store.create_session(NewSession::default()).unwrap();

    let mut ctx = store.background_context();
    ctx.add_wave(session.id, NewWave::starting_at(Utc::now(), 5.0));
    let mut edited = session.clone();
    edited.avg_heart_rate = f64::NAN;
    ctx.update_session(session.clone(), edited).unwrap();

    let err = store.merge(ctx).unwrap_err();

    assert!(matches!(err, DuskerError::InvalidInput { .. }));
    assert_eq!(store.get_session(session.id).unwrap(), Some(session.clone()));
    assert!(store.get_waves_for_session(session.id).unwrap().is_empty());
}
