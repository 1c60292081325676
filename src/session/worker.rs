use std::fs;
use std::path::Path;
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender};

use super::snapshot::SessionSnapshot;
use super::state::{IngestReport, Session};
use crate::analysis::{Analysis, CrossReferenceResult};
use crate::cancel::CancelToken;
use crate::error::IngestError;
use crate::store::SourceId;

/// A file delivered by the shell
#[derive(Clone, Debug)]
pub struct DroppedFile {
    pub name: String,
    /// File bytes, or why they could not be read
    pub contents: Result<Vec<u8>, String>,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            contents: Ok(bytes),
        }
    }

    /// Read a file from disk; a read failure is kept and reported as a failed file of the batch
    pub fn read(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            contents: fs::read(path).map_err(|e| e.to_string()),
        }
    }
}

/// Message sent to the session worker
#[derive(Debug)]
pub enum SessionCommand {
    /// Files dropped on one source, processed in order
    Ingest {
        source_id: SourceId,
        files: Vec<DroppedFile>,
    },
    Analysis {
        reply: Sender<Analysis>,
    },
    CrossReference {
        reply: Sender<Vec<CrossReferenceResult>>,
    },
    Snapshot {
        reply: Sender<SessionSnapshot>,
    },
    Restore(SessionSnapshot),
    Clear(SourceId),
    Reset,
}

/// Progress sent back from the worker
#[derive(Debug, Clone)]
pub enum IngestEvent {
    FileStarted {
        source_id: SourceId,
        file_name: String,
    },
    FileProcessed(IngestReport),
    FileFailed {
        source_id: SourceId,
        file_name: String,
        error: String,
    },
    BatchComplete {
        source_id: SourceId,
        processed: usize,
        failed: usize,
        /// Files left untouched because the batch was cancelled
        skipped: usize,
    },
}

impl IngestEvent {
    /// One-line status message for the shell
    pub fn status(&self) -> String {
        match self {
            Self::FileStarted { file_name, .. } => format!("Processing {}...", file_name),
            Self::FileProcessed(report) => format!(
                "{}: {} rows, {} phones, {} emails, {} ips",
                report.file_name, report.rows_scanned, report.phones, report.emails, report.ips
            ),
            Self::FileFailed {
                file_name, error, ..
            } => format!("{} failed: {}", file_name, error),
            Self::BatchComplete {
                source_id,
                processed,
                failed,
                skipped: 0,
            } => format!(
                "Source {}: {} files processed, {} failed",
                source_id, processed, failed
            ),
            Self::BatchComplete {
                source_id,
                processed,
                failed,
                skipped,
            } => format!(
                "Source {}: {} files processed, {} failed, {} skipped (cancelled)",
                source_id, processed, failed, skipped
            ),
        }
    }
}

/// Spawn the thread that owns the session.
///
/// Commands are handled one at a time, so a merge always completes before the next
/// starts. The thread exits when every command sender is dropped and hands the
/// session back through the join handle.
pub fn spawn_session_worker(
    mut session: Session,
    rx: Receiver<SessionCommand>,
    events: Sender<IngestEvent>,
    cancel: CancelToken,
) -> JoinHandle<Session> {
    thread::spawn(move || {
        log::info!("Session worker started");

        for command in rx {
            match command {
                SessionCommand::Ingest { source_id, files } => {
                    run_batch(&mut session, &source_id, files, &events, &cancel);
                }
                SessionCommand::Analysis { reply } => {
                    send_reply(reply, session.analysis());
                }
                SessionCommand::CrossReference { reply } => {
                    send_reply(reply, session.analyze_cross_reference());
                }
                SessionCommand::Snapshot { reply } => {
                    send_reply(reply, session.snapshot());
                }
                SessionCommand::Restore(snapshot) => session.restore(snapshot),
                SessionCommand::Clear(source_id) => {
                    if !session.clear(&source_id) {
                        log::warn!("Clear requested for unknown source {}", source_id);
                    }
                }
                SessionCommand::Reset => session.reset(),
            }
        }

        log::info!("Session worker shutting down");
        session
    })
}

/// Ingest a batch in order.
///
/// The token is cleared when the batch starts, so a cancel raised while the worker was
/// idle does not leak into it. It is checked before every file and between rows.
fn run_batch(
    session: &mut Session,
    source_id: &SourceId,
    files: Vec<DroppedFile>,
    events: &Sender<IngestEvent>,
    cancel: &CancelToken,
) {
    cancel.reset();
    let total = files.len();
    let mut processed = 0;
    let mut failed = 0;

    for file in files {
        if cancel.is_cancelled() {
            log::info!("Batch for source {} cancelled", source_id);
            break;
        }

        emit(
            events,
            IngestEvent::FileStarted {
                source_id: source_id.clone(),
                file_name: file.name.clone(),
            },
        );

        // errors stay with their file; the batch carries on
        match ingest_file(session, source_id, &file, cancel) {
            Ok(report) => {
                processed += 1;
                emit(events, IngestEvent::FileProcessed(report));
            }
            Err(e) => {
                failed += 1;
                log::warn!("Failed to ingest {}: {}", file.name, e);
                emit(
                    events,
                    IngestEvent::FileFailed {
                        source_id: source_id.clone(),
                        file_name: file.name.clone(),
                        error: e.to_string(),
                    },
                );
            }
        }
    }

    emit(
        events,
        IngestEvent::BatchComplete {
            source_id: source_id.clone(),
            processed,
            failed,
            skipped: total - processed - failed,
        },
    );
}

fn ingest_file(
    session: &mut Session,
    source_id: &SourceId,
    file: &DroppedFile,
    cancel: &CancelToken,
) -> Result<IngestReport, IngestError> {
    let bytes = file.contents.as_ref().map_err(|reason| IngestError::Read {
        file_name: file.name.clone(),
        reason: reason.clone(),
    })?;
    session.ingest_cancellable(&file.name, bytes, source_id, cancel)
}

fn emit(events: &Sender<IngestEvent>, event: IngestEvent) {
    if let Err(e) = events.send(event) {
        log::debug!("No listener for ingest event: {}", e);
    }
}

fn send_reply<T>(reply: Sender<T>, value: T) {
    if reply.send(value).is_err() {
        log::warn!("Reply receiver dropped before the session answered");
    }
}

/// Request/reply access to a running session worker
#[derive(Clone, Debug)]
pub struct SessionClient {
    commands: Sender<SessionCommand>,
}

impl SessionClient {
    pub fn new(commands: Sender<SessionCommand>) -> Self {
        Self { commands }
    }

    pub fn ingest(&self, source_id: SourceId, files: Vec<DroppedFile>) -> Result<()> {
        self.send(SessionCommand::Ingest { source_id, files })
    }

    pub fn analysis(&self) -> Result<Analysis> {
        self.request(|reply| SessionCommand::Analysis { reply })
    }

    pub fn cross_reference(&self) -> Result<Vec<CrossReferenceResult>> {
        self.request(|reply| SessionCommand::CrossReference { reply })
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|reply| SessionCommand::Snapshot { reply })
    }

    pub fn restore(&self, snapshot: SessionSnapshot) -> Result<()> {
        self.send(SessionCommand::Restore(snapshot))
    }

    pub fn clear(&self, source_id: SourceId) -> Result<()> {
        self.send(SessionCommand::Clear(source_id))
    }

    pub fn reset(&self) -> Result<()> {
        self.send(SessionCommand::Reset)
    }

    fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("session worker is not running"))
    }

    fn request<T>(&self, command: impl FnOnce(Sender<T>) -> SessionCommand) -> Result<T> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.send(command(reply_tx))?;
        reply_rx
            .recv()
            .map_err(|_| anyhow!("session worker stopped before replying"))
    }
}
