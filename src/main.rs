use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};

use cast_analyzer::analysis::{write_cross_reference_csv, write_kind_csv, write_occurrences_csv};
use cast_analyzer::config::{AppConfig, load_config};
use cast_analyzer::session::{
    DroppedFile, IngestEvent, Session, SessionClient, load_snapshot, save_snapshot,
    spawn_session_worker,
};
use cast_analyzer::{CancelToken, SourceId, ValueKind};

#[derive(Parser)]
#[command(name = "cast-analyzer", version, about = "Extract and cross-reference phones, emails and IPs across sources")]
struct Cli {
    /// JSON file with engine settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest files into a source, creating the database if needed
    Ingest {
        #[arg(long)]
        db: PathBuf,
        #[arg(short, long)]
        source: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print per-source value counts as JSON
    Analysis {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        kind: Option<ValueKind>,
    },
    /// Print values shared by every active source as JSON
    CrossRef {
        #[arg(long)]
        db: PathBuf,
        /// Only value and number of sharing sources
        #[arg(long)]
        brief: bool,
    },
    /// Write a CSV table
    Export {
        #[arg(long)]
        db: PathBuf,
        #[arg(long, value_enum)]
        table: ExportTable,
        #[arg(long)]
        out: PathBuf,
    },
    /// Clear one source, or every source when none is given
    Clear {
        #[arg(long)]
        db: PathBuf,
        #[arg(short, long)]
        source: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportTable {
    Phones,
    Emails,
    Ips,
    CrossRef,
    Occurrences,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Ingest { db, source, files } => ingest(config, &db, SourceId::from(source), &files),
        Command::Analysis { db, kind } => {
            let session = open_session(config, &db)?;
            let analysis = session.analysis();
            let output = match kind {
                Some(kind) => serde_json::to_string_pretty(analysis.items(kind))?,
                None => serde_json::to_string_pretty(&analysis)?,
            };
            println!("{}", output);
            Ok(())
        }
        Command::CrossRef { db, brief } => {
            let session = open_session(config, &db)?;
            let output = if brief {
                serde_json::to_string_pretty(&session.shared_values())?
            } else {
                serde_json::to_string_pretty(&session.analyze_cross_reference())?
            };
            println!("{}", output);
            Ok(())
        }
        Command::Export { db, table, out } => export(config, &db, table, &out),
        Command::Clear { db, source } => {
            let mut session = open_session(config, &db)?;
            match source {
                Some(source) => {
                    let source_id = SourceId::from(source);
                    if !session.clear(&source_id) {
                        return Err(anyhow!("no source {} in {}", source_id, db.display()));
                    }
                }
                None => session.reset(),
            }
            save_snapshot(&db, &session.snapshot())
        }
    }
}

/// Load the session stored at `db`; a missing file is an error
fn open_session(config: AppConfig, db: &Path) -> Result<Session> {
    let snapshot = load_snapshot(db)?;
    let mut session = Session::new(config);
    session.restore(snapshot);
    Ok(session)
}

fn ingest(config: AppConfig, db: &Path, source_id: SourceId, paths: &[PathBuf]) -> Result<()> {
    let session = if db.exists() {
        open_session(config, db)?
    } else {
        log::info!("Creating new database at {}", db.display());
        Session::new(config)
    };

    // unreadable paths travel with the batch and are reported as failed files
    let files: Vec<DroppedFile> = paths.iter().map(|path| DroppedFile::read(path)).collect();

    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let worker = spawn_session_worker(session, cmd_rx, event_tx, CancelToken::new());

    let client = SessionClient::new(cmd_tx);
    client.ingest(source_id, files)?;
    drop(client);

    for event in event_rx {
        match event {
            IngestEvent::FileFailed { .. } => eprintln!("{}", event.status()),
            IngestEvent::FileStarted { .. } => log::debug!("{}", event.status()),
            _ => println!("{}", event.status()),
        }
    }

    let session = worker
        .join()
        .map_err(|_| anyhow!("session worker panicked"))?;

    for (id, tile) in session.tiles() {
        let duplicates = tile.duplicate_files();
        if !duplicates.is_empty() {
            println!(
                "Source {}: ingested more than once: {}",
                id,
                duplicates.join(", ")
            );
        }
    }

    save_snapshot(db, &session.snapshot())
}

fn export(config: AppConfig, db: &Path, table: ExportTable, out: &Path) -> Result<()> {
    let session = open_session(config, db)?;
    let file = File::create(out).with_context(|| format!("failed to create {}", out.display()))?;
    let writer = BufWriter::new(file);

    match table {
        ExportTable::Phones => write_kind_csv(writer, session.analysis().items(ValueKind::Phone))?,
        ExportTable::Emails => write_kind_csv(writer, session.analysis().items(ValueKind::Email))?,
        ExportTable::Ips => write_kind_csv(writer, session.analysis().items(ValueKind::Ip))?,
        ExportTable::CrossRef => {
            write_cross_reference_csv(writer, &session.analyze_cross_reference())?
        }
        ExportTable::Occurrences => write_occurrences_csv(writer, session.tiles())?,
    }

    log::info!("Exported to {}", out.display());
    Ok(())
}
