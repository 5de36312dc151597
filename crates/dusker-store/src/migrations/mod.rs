//! Migration framework
//!
//! Provides:
//! - Migration runner recording a checksum per applied migration
//! - Idempotent application; edited migrations are refused
//! - Embedded SQL migrations

mod checksums;
mod embedded;
mod runner;

pub use checksums::compute_checksum;
pub use embedded::{get_migrations, Migration};
pub use runner::{applied_migrations, apply_migrations};
