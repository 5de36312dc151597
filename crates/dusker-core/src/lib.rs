//! Dusker Core - surf session persistence
//!
//! This crate provides:
//! - Session and Wave records and their derived views
//! - The schema model both storage backends follow
//! - The storage capability trait and an in-memory backend
//! - The `SessionStore` facade that keeps wave aggregates consistent
//! - Background editing contexts merged under a configurable policy
//! - Configuration, error and logging facilities shared by the workspace

pub use dusker_core_types as types;

pub mod backend;
pub mod config;
pub mod context;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod sample_data;
pub mod schema;
pub mod session_store;

// Re-export commonly used types
pub use backend::{Change, MemoryBackend, SessionBackend, SessionQuery, SortOrder, WaveQuery};
pub use config::DuskerConfig;
pub use context::{BackgroundContext, FieldConflict, MergePolicy, MergeReport};
pub use errors::{DuskerError, ExError, ExErrorKind, Result};
pub use model::{NewSession, NewWave, Session, Wave};
pub use session_store::{AggregateMode, SessionStore, StoreOptions};
