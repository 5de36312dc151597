//! Dusker Store - SQLite persistence for sessions and waves
//!
//! Provides:
//! - Connection management with foreign keys and WAL enabled
//! - Embedded, checksummed schema migrations
//! - `SqliteBackend`, the storage capability `SessionStore` runs on

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

pub use repo::SqliteBackend;
