//! Row <-> record conversion
//!
//! Identifiers are stored as hyphenated text and timestamps as UTC
//! nanoseconds, so SQL ordering matches the in-memory ordering.

use chrono::{DateTime, Utc};
use dusker_core::errors::{DuskerError, Result};
use dusker_core::{Session, Wave};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

pub const SESSION_COLUMNS: &str = "id, start_date, end_date, location, latitude, longitude, \
     total_waves, max_speed, avg_heart_rate, distance_surfed, distance_paddled, stroke_count, \
     notes, is_uploaded";

pub const WAVE_COLUMNS: &str =
    "id, session_id, start_time, end_time, distance, duration, max_speed, coordinates, confidence";

/// # Errors
///
/// `InvalidInput` for instants outside the nanosecond range (years 1677 to 2262).
pub fn encode_instant(at: DateTime<Utc>) -> Result<i64> {
    at.timestamp_nanos_opt().ok_or_else(|| DuskerError::InvalidInput {
        reason: format!("timestamp {at} cannot be stored"),
    })
}

pub fn decode_instant(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn instant_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    row.get(idx).map(decode_instant)
}

/// Map a row selected with [`SESSION_COLUMNS`]
pub fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: uuid_at(row, 0)?,
        start_date: instant_at(row, 1)?,
        end_date: row.get::<_, Option<i64>>(2)?.map(decode_instant),
        location: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        total_waves: row.get(6)?,
        max_speed: row.get(7)?,
        avg_heart_rate: row.get(8)?,
        distance_surfed: row.get(9)?,
        distance_paddled: row.get(10)?,
        stroke_count: row.get(11)?,
        notes: row.get(12)?,
        is_uploaded: row.get(13)?,
    })
}

/// Map a row selected with [`WAVE_COLUMNS`]
pub fn wave_from_row(row: &Row<'_>) -> rusqlite::Result<Wave> {
    Ok(Wave {
        id: uuid_at(row, 0)?,
        session_id: uuid_at(row, 1)?,
        start_time: instant_at(row, 2)?,
        end_time: instant_at(row, 3)?,
        distance: row.get(4)?,
        duration: row.get(5)?,
        max_speed: row.get(6)?,
        coordinates: row.get(7)?,
        confidence: row.get(8)?,
    })
}
