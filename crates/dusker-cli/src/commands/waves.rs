//! Waves command
//!
//! Usage: dusker waves list <SESSION_ID>

use clap::{Args, Subcommand};
use dusker_core::errors::Result;
use dusker_core::model::decode_track;

use super::{parse_id, Global};

#[derive(Debug, Args)]
pub struct WavesArgs {
    #[command(subcommand)]
    pub command: WavesCommand,
}

#[derive(Debug, Subcommand)]
pub enum WavesCommand {
    /// List a session's waves in ride order
    List { session_id: String },
}

pub fn execute(global: &Global, args: WavesArgs) -> Result<()> {
    match args.command {
        WavesCommand::List { session_id } => execute_list(global, &session_id),
    }
}

fn execute_list(global: &Global, raw_id: &str) -> Result<()> {
    let session_id = parse_id(raw_id)?;
    let store = global.open_store()?;
    let waves = store.get_waves_for_session(session_id)?;

    for wave in &waves {
        // A payload we cannot read still lists the wave
        let points = decode_track(&wave.coordinates).map_or(0, |t| t.len());
        println!(
            "{}  {}  {:>6.1} m  {:>5}  max={:.1}  avg={:.1}  conf={:.2}  points={}",
            wave.id,
            wave.start_time.format("%H:%M:%S"),
            wave.distance,
            wave.formatted_duration(),
            wave.max_speed,
            wave.average_speed(),
            wave.confidence,
            points,
        );
    }
    if waves.is_empty() {
        println!("No waves.");
    }
    Ok(())
}
