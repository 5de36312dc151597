//! Seed command
//!
//! Usage: dusker seed

use chrono::Utc;
use dusker_core::errors::Result;
use dusker_core::sample_data::seed_sample_sessions;

use super::sessions::session_line;
use super::Global;

pub fn execute(global: &Global) -> Result<()> {
    let mut store = global.open_store()?;
    let now = Utc::now();

    for session in seed_sample_sessions(&mut store, now)? {
        println!("{}", session_line(&session, now));
    }

    store.close()?;
    Ok(())
}
