use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::diagnostics::{Diagnostic, Diagnostics};
use super::directory_index::{JournalFile, scan_journal_files};
use super::file_tracker::ActiveFileTracker;
use crate::events::{DispatchOutcome, HandlerRegistry};
use crate::handlers::default_registry;
use crate::journal::{RawEvent, decode_line};
use crate::reader::{ReadOutcome, poll_new_lines};
use crate::state::Registries;

/// Reads past a rotation at most this many times per tick.
const MAX_READ_ATTEMPTS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("journal directory {path} is unreadable: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub lines_read: usize,
    pub dispatched: usize,
    pub unhandled: usize,
    pub decode_failures: usize,
    pub handler_failures: usize,
    /// The tracker switched or restarted its file during this tick.
    pub rotated: bool,
    pub io_error: Option<String>,
}

/// One watched journal directory and everything derived from it.
///
/// Owns the tracker, the dispatcher and the registries. Nothing here is
/// global; build a fresh session per directory (or per test).
#[derive(Debug)]
pub struct JournalSession {
    directory: PathBuf,
    tracker: ActiveFileTracker,
    dispatcher: HandlerRegistry,
    registries: Arc<Registries>,
    diagnostics: Diagnostics,
    /// Journal already reported as vanished, so later ticks stay quiet.
    missing: Mutex<Option<PathBuf>>,
    tick_lock: Mutex<()>,
}

impl JournalSession {
    /// Open `directory` with the built-in handlers.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, SessionError> {
        Self::with_dispatcher(directory, default_registry())
    }

    pub fn with_dispatcher(
        directory: impl Into<PathBuf>,
        dispatcher: HandlerRegistry,
    ) -> Result<Self, SessionError> {
        let directory = directory.into();
        if let Err(source) = fs::read_dir(&directory) {
            return Err(SessionError::DirectoryUnreadable {
                path: directory,
                source,
            });
        }
        tracing::info!(
            directory = %directory.display(),
            handlers = dispatcher.len(),
            "[SESSION] opened journal directory"
        );
        Ok(Self {
            directory,
            tracker: ActiveFileTracker::new(),
            dispatcher,
            registries: Arc::new(Registries::new()),
            diagnostics: Diagnostics::new(),
            missing: Mutex::new(None),
            tick_lock: Mutex::new(()),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn registries(&self) -> Arc<Registries> {
        Arc::clone(&self.registries)
    }

    pub fn tracker(&self) -> &ActiveFileTracker {
        &self.tracker
    }

    pub fn dispatcher(&self) -> &HandlerRegistry {
        &self.dispatcher
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Polling
    // ─────────────────────────────────────────────────────────────────────────

    /// Select the active journal, read what was appended, and apply it.
    ///
    /// Ticks are serialised; a second caller waits for the first to finish.
    pub fn tick(&self) -> TickReport {
        let _guard = self.tick_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut report = TickReport::default();

        let generation = self.tracker.generation();
        let Some(mut file) = self.select_active(&mut report) else {
            return report;
        };

        for _ in 0..MAX_READ_ATTEMPTS {
            match poll_new_lines(&file.path, self.tracker.current_offset()) {
                ReadOutcome::Lines { lines, new_offset } => {
                    self.process_lines(lines.iter().map(String::as_str), &mut report);
                    self.tracker.advance_offset(new_offset);
                    break;
                }
                ReadOutcome::Rotated => {
                    let next = self.recover_from_rotation(&file, &mut report);
                    if self.note_rotation(&file, next.is_some()) {
                        self.diagnostics.record(Diagnostic::Rotation {
                            path: file.path.clone(),
                        });
                    }
                    match next {
                        Some(next) => file = next,
                        None => break,
                    }
                }
                ReadOutcome::Unavailable(reason) => {
                    self.diagnostics.record(Diagnostic::TransientIo {
                        path: file.path.clone(),
                        reason: reason.clone(),
                    });
                    report.io_error = Some(reason);
                    break;
                }
            }
        }

        // Generation 0 means nothing was tracked yet; the first pick is not a rotation.
        report.rotated = generation > 0 && self.tracker.generation() != generation;

        if report.lines_read > 0 {
            tracing::debug!(
                lines = report.lines_read,
                dispatched = report.dispatched,
                decode_failures = report.decode_failures,
                handler_failures = report.handler_failures,
                "[SESSION] tick"
            );
        }
        report
    }

    /// Feed already-read lines through decode and dispatch, as a tick would.
    /// Used for replays; the tracker is not touched.
    pub fn ingest_lines<I, S>(&self, lines: I) -> TickReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let _guard = self.tick_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut report = TickReport::default();
        for line in lines {
            self.process_line(line.as_ref(), &mut report);
        }
        report
    }

    /// Dispatch one decoded event, recording a diagnostic on failure.
    pub fn process_event(&self, event: &RawEvent) -> DispatchOutcome {
        let outcome = self.dispatcher.dispatch(event, &self.registries);
        if let DispatchOutcome::Failed(error) = &outcome {
            self.diagnostics.record(Diagnostic::HandlerFailure {
                kind: event.kind.clone(),
                error: error.clone(),
            });
        }
        outcome
    }

    fn select_active(&self, report: &mut TickReport) -> Option<JournalFile> {
        match scan_journal_files(&self.directory) {
            Ok(listing) => self.tracker.select_active_file(&listing),
            Err(e) => {
                tracing::warn!(
                    directory = %self.directory.display(),
                    error = %e,
                    "[SESSION] could not list journal directory"
                );
                self.diagnostics.record(Diagnostic::TransientIo {
                    path: self.directory.clone(),
                    reason: e.to_string(),
                });
                report.io_error = Some(e.to_string());
                self.tracker.current_file()
            }
        }
    }

    /// The file we were reading shrank or vanished. Either a newer journal
    /// took over, or the same path was truncated and must be re-read.
    fn recover_from_rotation(&self, stale: &JournalFile, report: &mut TickReport) -> Option<JournalFile> {
        let generation = self.tracker.generation();
        let next = self.select_active(report)?;
        if self.tracker.generation() != generation {
            return Some(next);
        }
        if next.path == stale.path && next.path.exists() {
            self.tracker.restart_current();
            return Some(next);
        }
        tracing::debug!(file = %stale.file_name(), "[SESSION] journal missing, waiting for a replacement");
        None
    }

    /// Remember whether `stale` is still missing. Returns false when it was
    /// already reported missing on an earlier tick.
    fn note_rotation(&self, stale: &JournalFile, recovered: bool) -> bool {
        let mut missing = self.missing.lock().unwrap_or_else(PoisonError::into_inner);
        if recovered {
            *missing = None;
            return true;
        }
        if missing.as_ref() == Some(&stale.path) {
            return false;
        }
        *missing = Some(stale.path.clone());
        true
    }

    fn process_lines<'a>(&self, lines: impl Iterator<Item = &'a str>, report: &mut TickReport) {
        for line in lines {
            self.process_line(line, report);
        }
    }

    fn process_line(&self, line: &str, report: &mut TickReport) {
        report.lines_read += 1;
        let event = match decode_line(line) {
            Ok(event) => event,
            Err(error) => {
                tracing::warn!(%error, "[SESSION] skipping undecodable line");
                self.diagnostics
                    .record(Diagnostic::decode_failure(error, line));
                report.decode_failures += 1;
                return;
            }
        };
        match self.process_event(&event) {
            DispatchOutcome::Handled => report.dispatched += 1,
            DispatchOutcome::Unhandled => report.unhandled += 1,
            DispatchOutcome::Failed(_) => report.handler_failures += 1,
        }
    }
}
