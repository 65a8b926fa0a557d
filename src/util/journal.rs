//! Conversion journal.
//!
//! Provides [`ConversionJournal`] which appends NDJSON events to a log file
//! while `dbfsql convert` runs: one `session_start`, one `file_converted` or
//! `file_failed` per source file, and one `session_end` with totals. Workers
//! share one journal; each event is written as a single line under an
//! exclusive file lock, so several processes may append to the same file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use chrono::Local;
use fs2::FileExt;
use serde::Serialize;

use crate::DbfError;

/// A single journal event, serialized as tagged NDJSON.
#[derive(Serialize)]
#[serde(tag = "event")]
pub enum JournalEvent {
    /// Emitted once at the start of a `convert` invocation.
    #[serde(rename = "session_start")]
    SessionStart {
        timestamp: String,
        args: Vec<String>,
        version: String,
        files: usize,
    },

    /// Emitted when a source file was fully delivered to its sink.
    #[serde(rename = "file_converted")]
    FileConverted {
        timestamp: String,
        file: String,
        table: String,
        output: String,
        rows: u64,
        deleted: u64,
        skipped: u64,
    },

    /// Emitted when a source file could not be converted.
    #[serde(rename = "file_failed")]
    FileFailed {
        timestamp: String,
        file: String,
        kind: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        record: Option<u32>,
    },

    /// Emitted once at the end of a `convert` invocation.
    #[serde(rename = "session_end")]
    SessionEnd {
        timestamp: String,
        duration_ms: u64,
        files_converted: u64,
        files_failed: u64,
        rows_written: u64,
    },
}

struct JournalInner {
    file: File,
    files_converted: u64,
    files_failed: u64,
    rows_written: u64,
}

/// Thread-safe journal that appends NDJSON events to a file.
pub struct ConversionJournal {
    inner: Mutex<JournalInner>,
    start: Instant,
}

impl ConversionJournal {
    /// Open (or create) the journal file in append mode.
    pub fn open(path: &str) -> Result<Self, DbfError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| DbfError::Io(format!("Cannot open journal {}: {}", path, e)))?;

        Ok(Self {
            inner: Mutex::new(JournalInner {
                file,
                files_converted: 0,
                files_failed: 0,
                rows_written: 0,
            }),
            start: Instant::now(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, JournalInner>, DbfError> {
        self.inner
            .lock()
            .map_err(|_| DbfError::Io("Journal lock poisoned".to_string()))
    }

    /// Emit a single event as one NDJSON line.
    pub fn emit(&self, event: &JournalEvent) -> Result<(), DbfError> {
        let line = serde_json::to_string(event)
            .map_err(|e| DbfError::Io(format!("Journal JSON error: {}", e)))?;

        let mut inner = self.lock()?;
        inner
            .file
            .lock_exclusive()
            .map_err(|e| DbfError::Io(format!("Journal lock error: {}", e)))?;
        let written = writeln!(inner.file, "{}", line).and_then(|_| inner.file.flush());
        inner
            .file
            .unlock()
            .map_err(|e| DbfError::Io(format!("Journal unlock error: {}", e)))?;
        written.map_err(|e| DbfError::Io(format!("Journal write error: {}", e)))
    }

    /// Emit a `session_start` event.
    pub fn start_session(&self, args: Vec<String>, files: usize) -> Result<(), DbfError> {
        self.emit(&JournalEvent::SessionStart {
            timestamp: now(),
            args,
            version: env!("CARGO_PKG_VERSION").to_string(),
            files,
        })
    }

    /// Emit a `session_end` event with accumulated counters.
    pub fn end_session(&self) -> Result<(), DbfError> {
        let event = {
            let inner = self.lock()?;
            JournalEvent::SessionEnd {
                timestamp: now(),
                duration_ms: self.start.elapsed().as_millis() as u64,
                files_converted: inner.files_converted,
                files_failed: inner.files_failed,
                rows_written: inner.rows_written,
            }
        };
        self.emit(&event)
    }

    /// Log a successfully converted file.
    pub fn log_converted(
        &self,
        file: &str,
        table: &str,
        output: &str,
        rows: u64,
        deleted: u64,
        skipped: u64,
    ) -> Result<(), DbfError> {
        self.emit(&JournalEvent::FileConverted {
            timestamp: now(),
            file: file.to_string(),
            table: table.to_string(),
            output: output.to_string(),
            rows,
            deleted,
            skipped,
        })?;
        let mut inner = self.lock()?;
        inner.files_converted += 1;
        inner.rows_written += rows;
        Ok(())
    }

    /// Log a failed file.
    pub fn log_failed(&self, file: &str, err: &DbfError) -> Result<(), DbfError> {
        self.emit(&JournalEvent::FileFailed {
            timestamp: now(),
            file: file.to_string(),
            kind: err.kind().to_string(),
            message: err.to_string(),
            record: err.record_index(),
        })?;
        self.lock()?.files_failed += 1;
        Ok(())
    }
}

fn now() -> String {
    Local::now().to_rfc3339()
}
