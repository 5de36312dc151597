//! Dusker CLI
//!
//! Command-line interface over the session database

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dusker_core::config::{DuskerConfig, DEFAULT_CONFIG_FILE};
use dusker_core::errors::{ExError, Result};
use dusker_core::logging_facility;
use dusker_core::StoreOptions;
use dusker_core_types::{RequestContext, TraceId};

mod commands;

use commands::Global;

#[derive(Debug, Parser)]
#[command(name = "dusker")]
#[command(about = "Dusker - surf session store", long_about = None)]
struct Cli {
    /// SQLite database file (overrides `store.database_path`)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Insert the three demo sessions with their waves
    Seed,
    /// Session operations
    Sessions(commands::sessions::SessionsArgs),
    /// Wave operations
    Waves(commands::waves::WavesArgs),
    /// Dump every session with its waves as JSON
    Export(commands::export::ExportArgs),
}

fn run(cli: Cli, ctx: &RequestContext) -> Result<()> {
    let config = DuskerConfig::load_from_path(&cli.config)?;
    logging_facility::init(config.logging.profile);
    tracing::debug!(
        request_id = ctx.request_id.as_str(),
        command = ?cli.command,
        "dusker invoked"
    );

    let global = Global {
        db: cli.db.unwrap_or_else(|| config.store.database_path.clone()),
        options: StoreOptions::from(&config.store),
    };

    match cli.command {
        Commands::Seed => commands::seed::execute(&global),
        Commands::Sessions(args) => commands::sessions::execute(&global, ctx, args),
        Commands::Waves(args) => commands::waves::execute(&global, args),
        Commands::Export(args) => commands::export::execute(&global, args),
    }
}

fn main() {
    let cli = Cli::parse();
    let ctx = RequestContext::new().with_trace_id(TraceId::new());

    if let Err(e) = run(cli, &ctx) {
        let ex = ExError::from(e).with_request_id(ctx.request_id.clone());
        eprintln!("Error: {}", ex);
        std::process::exit(1);
    }
}
