//! Export command
//!
//! Usage: dusker export [--out <FILE>]

use std::path::PathBuf;

use clap::Args;
use dusker_core::errors::Result;
use dusker_core::{Session, Wave};
use serde::Serialize;

use super::Global;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Serialize)]
struct ExportedSession {
    #[serde(flatten)]
    session: Session,
    waves: Vec<Wave>,
}

pub fn execute(global: &Global, args: ExportArgs) -> Result<()> {
    let store = global.open_store()?;

    let exported = store
        .get_all_sessions()?
        .into_iter()
        .map(|session| {
            let waves = store.get_waves_for_session(session.id)?;
            Ok(ExportedSession { session, waves })
        })
        .collect::<Result<Vec<_>>>()?;
    let json = serde_json::to_string_pretty(&exported)?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("Exported {} sessions to {}", exported.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
