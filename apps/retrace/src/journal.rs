//! # JSONL Journal
//!
//! A `PersistHook` that appends one JSON object per notification:
//!
//! ```text
//! {"direction":"redo","change":{"description":"Move node n1",...}}
//! ```
//!
//! The hook is fire-and-forget, so write failures are logged and counted
//! rather than returned.

use retrace_core::{ChangeSet, Direction, HistoryError, PersistHook};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct JournalLine<'a> {
    direction: Direction,
    change: &'a ChangeSet,
}

/// Line-delimited JSON sink for persistence notifications.
#[derive(Debug)]
pub struct JsonlJournal<W: Write> {
    writer: W,
    written: usize,
    failed: usize,
}

impl<W: Write> JsonlJournal<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            failed: 0,
        }
    }

    /// Lines written successfully.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Notifications that could not be written.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn flush(&mut self) -> Result<(), HistoryError> {
        self.writer
            .flush()
            .map_err(|e| HistoryError::IoError(format!("Flush journal: {}", e)))
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, change: &ChangeSet, direction: Direction) -> Result<(), HistoryError> {
        let line = JournalLine { direction, change };
        serde_json::to_writer(&mut self.writer, &line)
            .map_err(|e| HistoryError::SerializationError(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| HistoryError::IoError(e.to_string()))
    }
}

impl<W: Write> PersistHook for JsonlJournal<W> {
    fn persist(&mut self, change: &ChangeSet, direction: Direction) {
        match self.write_line(change, direction) {
            Ok(()) => self.written += 1,
            Err(e) => {
                self.failed += 1;
                tracing::error!(
                    description = %change.description,
                    ?direction,
                    "Journal write failed: {}",
                    e
                );
            }
        }
    }
}
