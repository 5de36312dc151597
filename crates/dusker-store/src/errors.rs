//! Error helpers for dusker-store
//!
//! Everything surfaces as a core [`DuskerError`] so the backend can sit
//! behind the storage trait.

use dusker_core::errors::DuskerError;

pub use dusker_core::errors::Result;

/// A migration that failed to apply
pub fn migration_error(migration_id: &str, reason: &str) -> DuskerError {
    DuskerError::SchemaLoad {
        message: format!("Migration {} failed: {}", migration_id, reason),
    }
}

pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> DuskerError {
    DuskerError::MigrationChecksumMismatch {
        migration_id: migration_id.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Create a persistence error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> DuskerError {
    DuskerError::persistence("sqlite", err)
}

/// Like [`from_rusqlite`], naming the operation that failed
pub fn sqlite_op(op: &'static str) -> impl Fn(rusqlite::Error) -> DuskerError {
    move |err| DuskerError::persistence(op, err)
}
