//! Repository layer bridging the core records to SQLite rows

mod hydration;
mod sqlite_backend;

pub use sqlite_backend::SqliteBackend;
