//! Subcommands and the state they share

pub mod export;
pub mod seed;
pub mod sessions;
pub mod waves;

use std::path::PathBuf;

use dusker_core::errors::{DuskerError, Result};
use dusker_core::{SessionStore, StoreOptions};
use dusker_store::SqliteBackend;
use uuid::Uuid;

/// Resolved global options
#[derive(Debug, Clone)]
pub struct Global {
    pub db: PathBuf,
    pub options: StoreOptions,
}

impl Global {
    /// Open the database, applying migrations
    ///
    /// # Errors
    ///
    /// Schema and migration failures are fatal for the invocation.
    pub fn open_store(&self) -> Result<SessionStore<SqliteBackend>> {
        let backend = SqliteBackend::open(&self.db)?;
        Ok(SessionStore::with_options(backend, self.options))
    }
}

/// # Errors
///
/// `InvalidInput` if `raw` is not a UUID.
pub fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| DuskerError::InvalidInput {
        reason: format!("'{raw}' is not a valid id: {e}"),
    })
}
