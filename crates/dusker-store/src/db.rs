//! Database connection management

use std::path::Path;

use rusqlite::Connection;

use crate::errors::{sqlite_op, Result};

/// Open a SQLite database at the given path, creating the file if needed
///
/// # Errors
///
/// `PersistenceFailure` if the file cannot be opened or configured.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let conn = Connection::open(path).map_err(sqlite_op("open"))?;
    configure(&conn)?;
    Ok(conn)
}

/// Open an in-memory SQLite database (for testing)
///
/// # Errors
///
/// `PersistenceFailure` if SQLite cannot allocate the database.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(sqlite_op("open"))?;
    configure(&conn)?;
    Ok(conn)
}

/// Enforce foreign keys and switch to WAL
///
/// In-memory databases stay in `memory` journal mode.
///
/// # Errors
///
/// `PersistenceFailure` if a pragma is rejected.
pub fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(sqlite_op("configure"))?;

    let mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(sqlite_op("configure"))?;
    tracing::debug!(journal_mode = %mode, "sqlite connection configured");

    Ok(())
}
