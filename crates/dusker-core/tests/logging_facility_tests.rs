#![allow(clippy::unwrap_used, clippy::expect_used)]

use dusker_core::errors::DuskerError;
use dusker_core::logging_facility::test_capture::init_test_capture;
use dusker_core::types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use dusker_core::{log_op_end, log_op_error, log_op_start};
use dusker_core::{MemoryBackend, NewSession, NewWave, SessionStore};
use uuid::Uuid;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, session_id = "s-1");

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[0].field("session_id"), Some("s-1"));
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one end event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = DuskerError::WaveNotFound {
        wave_id: Uuid::nil(),
    };
    log_op_error!(op_name, &err, duration_ms = 10);

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one error event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(events[0].field("err_code"), Some("ERR_NOT_FOUND"));
    assert_eq!(events[0].field("err_kind"), Some("NotFound"));
}

#[test]
fn test_store_operations_are_bracketed() {
    let capture = init_test_capture();
    let mut store = SessionStore::new(MemoryBackend::new());

    let mut session = store.create_session(NewSession::default()).unwrap();
    store.add_wave(&mut session, NewWave::default()).unwrap();

    for op in ["create_session", "add_wave"] {
        capture.assert_event_exists(op, EVENT_START);
        capture.assert_event_exists(op, EVENT_END);
    }
}

#[test]
fn test_failed_store_operation_logs_error_event() {
    let capture = init_test_capture();
    let mut store = SessionStore::new(MemoryBackend::new());
    let wave = dusker_core::Wave {
        id: Uuid::now_v7(),
        session_id: Uuid::now_v7(),
        start_time: chrono::Utc::now(),
        end_time: chrono::Utc::now(),
        distance: 0.0,
        duration: 0.0,
        max_speed: 0.0,
        coordinates: Vec::new(),
        confidence: 1.0,
    };

    assert!(store.delete_wave(&wave).is_err());

    let errors: Vec<_> = capture
        .events_for("delete_wave")
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|e| e.field("err_code") == Some("ERR_NOT_FOUND")));
}

#[test]
fn test_add_wave_logs_new_aggregate() {
    let capture = init_test_capture();
    let mut store = SessionStore::new(MemoryBackend::new());
    let mut session = store.create_session(NewSession::default()).unwrap();

    let wave = store.add_wave(&mut session, NewWave::default()).unwrap();

    let wave_id = wave.id.to_string();
    let added = capture
        .events()
        .into_iter()
        .find(|e| e.field("wave_id") == Some(wave_id.as_str()))
        .expect("wave added event");
    assert_eq!(added.field("total_waves"), Some("1"));
    assert_eq!(added.field("message"), Some("wave added"));
}
