//! SQLite implementation of the storage capability
//!
//! Each commit is one rusqlite transaction. Cascading session deletes are
//! left to the `ON DELETE CASCADE` foreign key.

use std::path::Path;

use dusker_core::backend::{Change, SessionBackend, SessionQuery, SortOrder, WaveQuery};
use dusker_core::errors::{DuskerError, Result};
use dusker_core::{Session, Wave};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use uuid::Uuid;

use super::hydration::{
    encode_instant, session_from_row, wave_from_row, SESSION_COLUMNS, WAVE_COLUMNS,
};
use crate::db;
use crate::errors::sqlite_op;
use crate::migrations::apply_migrations;

pub struct SqliteBackend {
    conn: Connection,
}

fn direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Ascending => "ASC",
        SortOrder::Descending => "DESC",
    }
}

impl SqliteBackend {
    /// Open (or create) the database file and bring its schema up to date
    ///
    /// # Errors
    ///
    /// `PersistenceFailure` if the file cannot be opened; `SchemaLoad` or
    /// `MigrationChecksumMismatch` if the schema cannot be applied.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening session database");
        Self::from_connection(db::open(path)?)
    }

    /// # Errors
    ///
    /// As for [`SqliteBackend::open`].
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    /// Wrap a configured connection, applying pending migrations
    ///
    /// # Errors
    ///
    /// `SchemaLoad` or `MigrationChecksumMismatch`.
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn put_session(tx: &Transaction<'_>, session: &Session) -> Result<()> {
        tx.execute(
            "INSERT INTO sessions (id, start_date, end_date, location, latitude, longitude,
                total_waves, max_speed, avg_heart_rate, distance_surfed, distance_paddled,
                stroke_count, notes, is_uploaded)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(id) DO UPDATE SET
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                location = excluded.location,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                total_waves = excluded.total_waves,
                max_speed = excluded.max_speed,
                avg_heart_rate = excluded.avg_heart_rate,
                distance_surfed = excluded.distance_surfed,
                distance_paddled = excluded.distance_paddled,
                stroke_count = excluded.stroke_count,
                notes = excluded.notes,
                is_uploaded = excluded.is_uploaded",
            params![
                session.id.to_string(),
                encode_instant(session.start_date)?,
                session.end_date.map(encode_instant).transpose()?,
                session.location,
                session.latitude,
                session.longitude,
                session.total_waves,
                session.max_speed,
                session.avg_heart_rate,
                session.distance_surfed,
                session.distance_paddled,
                session.stroke_count,
                session.notes,
                session.is_uploaded,
            ],
        )
        .map_err(sqlite_op("put_session"))?;
        Ok(())
    }

    fn put_wave(tx: &Transaction<'_>, wave: &Wave) -> Result<()> {
        let parent_exists = tx
            .query_row(
                "SELECT 1 FROM sessions WHERE id = ?1",
                [wave.session_id.to_string()],
                |_| Ok(()),
            )
            .optional()
            .map_err(sqlite_op("put_wave"))?
            .is_some();
        if !parent_exists {
            return Err(DuskerError::OrphanedWave {
                wave_id: wave.id,
                session_id: wave.session_id,
            });
        }

        tx.execute(
            "INSERT INTO waves (id, session_id, start_time, end_time, distance, duration,
                max_speed, coordinates, confidence)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                session_id = excluded.session_id,
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                distance = excluded.distance,
                duration = excluded.duration,
                max_speed = excluded.max_speed,
                coordinates = excluded.coordinates,
                confidence = excluded.confidence",
            params![
                wave.id.to_string(),
                wave.session_id.to_string(),
                encode_instant(wave.start_time)?,
                encode_instant(wave.end_time)?,
                wave.distance,
                wave.duration,
                wave.max_speed,
                wave.coordinates,
                wave.confidence,
            ],
        )
        .map_err(sqlite_op("put_wave"))?;
        Ok(())
    }
}

impl SessionBackend for SqliteBackend {
    fn commit(&mut self, changes: Vec<Change>) -> Result<()> {
        let tx = self.conn.transaction().map_err(sqlite_op("commit"))?;

        for change in &changes {
            match change {
                Change::PutSession(session) => Self::put_session(&tx, session)?,
                Change::PutWave(wave) => Self::put_wave(&tx, wave)?,
                Change::DeleteSession(id) => {
                    tx.execute("DELETE FROM sessions WHERE id = ?1", [id.to_string()])
                        .map_err(sqlite_op("delete_session"))?;
                }
                Change::DeleteWave(id) => {
                    tx.execute("DELETE FROM waves WHERE id = ?1", [id.to_string()])
                        .map_err(sqlite_op("delete_wave"))?;
                }
            }
        }

        tx.commit().map_err(sqlite_op("commit"))?;
        tracing::trace!(changes = changes.len(), "sqlite commit");
        Ok(())
    }

    fn session(&self, id: Uuid) -> Result<Option<Session>> {
        self.conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                [id.to_string()],
                session_from_row,
            )
            .optional()
            .map_err(sqlite_op("get_session"))
    }

    fn wave(&self, id: Uuid) -> Result<Option<Wave>> {
        self.conn
            .query_row(
                &format!("SELECT {WAVE_COLUMNS} FROM waves WHERE id = ?1"),
                [id.to_string()],
                wave_from_row,
            )
            .optional()
            .map_err(sqlite_op("get_wave"))
    }

    fn sessions(&self, query: &SessionQuery) -> Result<Vec<Session>> {
        let dir = direction(query.order);
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE (?1 IS NULL OR is_uploaded = ?1)
               AND (?2 IS NULL OR start_date > ?2)
             ORDER BY start_date {dir}, id {dir}"
        );
        let after = query.started_after.map(encode_instant).transpose()?;

        let mut stmt = self.conn.prepare(&sql).map_err(sqlite_op("query_sessions"))?;
        let rows = stmt
            .query_map(params![query.uploaded, after], session_from_row)
            .map_err(sqlite_op("query_sessions"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sqlite_op("query_sessions"))?;
        Ok(rows)
    }

    fn waves(&self, query: &WaveQuery) -> Result<Vec<Wave>> {
        let dir = direction(query.order);
        let sql = format!(
            "SELECT {WAVE_COLUMNS} FROM waves
             WHERE (?1 IS NULL OR session_id = ?1)
               AND (?2 IS NULL OR confidence >= ?2)
             ORDER BY start_time {dir}, id {dir}"
        );
        let session_id = query.session_id.map(|id| id.to_string());

        let mut stmt = self.conn.prepare(&sql).map_err(sqlite_op("query_waves"))?;
        let rows = stmt
            .query_map(params![session_id, query.min_confidence], wave_from_row)
            .map_err(sqlite_op("query_waves"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sqlite_op("query_waves"))?;
        Ok(rows)
    }

    fn flush(&mut self) -> Result<()> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            .map_err(sqlite_op("flush"))
    }
}
