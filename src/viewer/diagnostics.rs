//! In-memory diagnostic log
//!
//! Every lifecycle event worth explaining to a developer (discarded stale
//! results, load and setup failures, ignored commands) is recorded here in
//! addition to going through `log`. The log is bounded; the oldest entries
//! are dropped first.

use std::collections::VecDeque;

use serde::Serialize;

use crate::errors::ViewerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<DiagnosticLevel> for log::Level {
    fn from(level: DiagnosticLevel) -> Self {
        match level {
            DiagnosticLevel::Debug => log::Level::Debug,
            DiagnosticLevel::Info => log::Level::Info,
            DiagnosticLevel::Warn => log::Level::Warn,
            DiagnosticLevel::Error => log::Level::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticEntry {
    /// Monotonic sequence number, unaffected by eviction.
    pub seq: u64,
    pub level: DiagnosticLevel,
    pub animation_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    entries: VecDeque<DiagnosticEntry>,
    capacity: usize,
    next_seq: u64,
}

impl DiagnosticLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            next_seq: 0,
        }
    }

    /// Records an entry and forwards it to the `log` facade.
    pub fn record(
        &mut self,
        level: DiagnosticLevel,
        animation_id: Option<&str>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        let lvl: log::Level = level.into();
        match animation_id {
            Some(id) => log::log!(target: "skinview", lvl, "[{id}] {message}"),
            None => log::log!(target: "skinview", lvl, "{message}"),
        }

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(DiagnosticEntry {
            seq: self.next_seq,
            level,
            animation_id: animation_id.map(str::to_string),
            message,
        });
        self.next_seq += 1;
    }

    pub fn record_error(&mut self, error: &ViewerError) {
        self.record(DiagnosticLevel::Error, error.animation_id(), error.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&DiagnosticEntry> {
        self.entries.back()
    }

    /// Entries at or above `level`.
    pub fn at_least(&self, level: DiagnosticLevel) -> impl Iterator<Item = &DiagnosticEntry> {
        self.entries.iter().filter(move |e| e.level >= level)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new(256)
    }
}
