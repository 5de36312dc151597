//! Sessions command
//!
//! Usage: dusker sessions <list|show|create|delete|mark-uploaded>

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use dusker_core::errors::{DuskerError, Result};
use dusker_core::{NewSession, Session};
use dusker_core_types::RequestContext;

use super::{parse_id, Global};

#[derive(Debug, Args)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// List sessions, newest first
    List {
        /// Only sessions not uploaded yet
        #[arg(long)]
        pending_upload: bool,
    },
    /// Show one session in full
    Show { id: String },
    /// Start a new session now
    Create(CreateArgs),
    /// Delete a session and all of its waves
    Delete { id: String },
    /// Flag sessions as uploaded through a background merge
    ///
    /// Ids with no stored session are reported and skipped; the rest are
    /// still marked.
    MarkUploaded {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Spot name
    #[arg(long)]
    pub location: String,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub lon: f64,

    #[arg(long)]
    pub notes: Option<String>,
}

/// One-line summary used by `list` and `seed`
pub fn session_line(session: &Session, now: DateTime<Utc>) -> String {
    format!(
        "{}  {}  {:<18} waves={:<3} max={:.1}  {}{}",
        session.id,
        session.start_date.format("%Y-%m-%d %H:%M"),
        session.location,
        session.total_waves,
        session.max_speed,
        session.formatted_duration(now),
        if session.is_uploaded { "" } else { "  (pending upload)" },
    )
}

pub fn execute(global: &Global, ctx: &RequestContext, args: SessionsArgs) -> Result<()> {
    match args.command {
        SessionsCommand::List { pending_upload } => execute_list(global, pending_upload),
        SessionsCommand::Show { id } => execute_show(global, &id),
        SessionsCommand::Create(create) => execute_create(global, create),
        SessionsCommand::Delete { id } => execute_delete(global, &id),
        SessionsCommand::MarkUploaded { ids } => execute_mark_uploaded(global, ctx, &ids),
    }
}

fn execute_list(global: &Global, pending_upload: bool) -> Result<()> {
    let store = global.open_store()?;
    let sessions = if pending_upload {
        store.sessions_pending_upload()?
    } else {
        store.get_all_sessions()?
    };

    let now = Utc::now();
    for session in &sessions {
        println!("{}", session_line(session, now));
    }
    if sessions.is_empty() {
        println!("No sessions.");
    }
    Ok(())
}

fn execute_show(global: &Global, raw_id: &str) -> Result<()> {
    let id = parse_id(raw_id)?;
    let store = global.open_store()?;
    let session = store
        .get_session(id)?
        .ok_or(DuskerError::SessionNotFound { session_id: id })?;

    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}

fn execute_create(global: &Global, args: CreateArgs) -> Result<()> {
    let mut store = global.open_store()?;
    let session = store.create_session(NewSession {
        latitude: args.lat,
        longitude: args.lon,
        notes: args.notes,
        ..NewSession::at(args.location, Utc::now())
    })?;
    store.close()?;

    println!("{}", session.id);
    Ok(())
}

fn execute_delete(global: &Global, raw_id: &str) -> Result<()> {
    let id = parse_id(raw_id)?;
    let mut store = global.open_store()?;
    let session = store
        .get_session(id)?
        .ok_or(DuskerError::SessionNotFound { session_id: id })?;

    store.delete_session(&session)?;
    store.close()?;

    println!("Deleted {} ({} waves)", session.id, session.total_waves);
    Ok(())
}

fn execute_mark_uploaded(global: &Global, ctx: &RequestContext, raw_ids: &[String]) -> Result<()> {
    let ids = raw_ids
        .iter()
        .map(|raw| parse_id(raw))
        .collect::<Result<Vec<_>>>()?;
    let mut store = global.open_store()?;

    let mut background = store.background_context();
    if let Some(trace_id) = &ctx.trace_id {
        background = background.with_trace_id(trace_id.clone());
    }
    let mut skipped = Vec::new();
    for id in ids {
        match store.get_session(id)? {
            Some(base) => {
                let mut edited = base.clone();
                edited.is_uploaded = true;
                background.update_session(base, edited)?;
            }
            None => skipped.push(id),
        }
    }

    let report = store.merge(background)?;
    store.close()?;
    skipped.extend(report.skipped);

    println!("Marked {} session(s) uploaded", report.applied);
    for id in skipped {
        println!("Skipped {}: no such session", id);
    }
    Ok(())
}
