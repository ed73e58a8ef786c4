//! Events emitted while sending

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use utoipa::ToSchema;

use crate::domain::communication::recipients::RecipientRecord;

/// Log entries kept by [`ActivityLog`]; older ones are dropped first.
const ACTIVITY_LOG_CAPACITY: usize = 1000;

/// Severity of a log line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Info,
    /// A message was delivered
    Success,
    /// Something went wrong
    Error,
}

/// One human readable log line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    /// When the line was written
    pub timestamp: DateTime<Utc>,

    /// The message
    #[schema(example = "Sent to ana@example.com: 200")]
    pub message: String,

    /// Severity
    pub severity: Severity,
}

impl LogEntry {
    /// Create a log entry stamped with the current time
    pub fn now(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            severity,
        }
    }
}

/// Progress of a send
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Progress {
    /// Messages accepted by the backend so far
    pub sent: usize,

    /// Recipients in the session
    pub total: usize,

    /// The session stopped because it was cancelled
    pub cancelled: bool,

    /// The session processed every recipient
    pub done: bool,
}

impl Progress {
    pub(crate) fn sending(sent: usize, total: usize) -> Self {
        Self {
            sent,
            total,
            ..Self::default()
        }
    }

    pub(crate) fn cancelled(sent: usize, total: usize) -> Self {
        Self {
            cancelled: true,
            ..Self::sending(sent, total)
        }
    }

    pub(crate) fn done(sent: usize, total: usize) -> Self {
        Self {
            done: true,
            ..Self::sending(sent, total)
        }
    }
}

/// What happened to one recipient
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend accepted the message
    Sent {
        /// The recipient
        recipient: RecipientRecord,
        /// The backend's response token
        response: String,
    },

    /// The backend failed to deliver the message
    Failed {
        /// The recipient
        recipient: RecipientRecord,
        /// The backend's error message
        error: String,
    },

    /// The recipient was not attempted
    Skipped {
        /// The recipient
        recipient: RecipientRecord,
        /// Why it was skipped
        reason: String,
    },
}

/// Everything the sender reports to its observer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendEvent {
    /// Counters changed or the session reached a terminal state
    Progress(Progress),

    /// A line for the user-facing log
    Log(LogEntry),

    /// A recipient was processed
    Outcome(SendOutcome),
}

/// Receives [`SendEvent`]s. Implementations must not block.
pub trait EventSink: Send + Sync + 'static {
    /// Handle one event
    fn emit(&self, event: SendEvent);
}

impl EventSink for UnboundedSender<SendEvent> {
    fn emit(&self, event: SendEvent) {
        // The receiver going away only means nobody is watching.
        let _ = self.send(event);
    }
}

/// An in-memory, bounded log of the latest send activity.
#[derive(Clone, Debug, Default)]
pub struct ActivityLog {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl ActivityLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line
    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if entries.len() == ACTIVITY_LOG_CAPACITY {
            entries.pop_front();
        }

        entries.push_back(entry);
    }

    /// Append an informational line
    pub fn info(&self, message: impl Into<String>) {
        self.push(LogEntry::now(message, Severity::Info));
    }

    /// Append an error line
    pub fn error(&self, message: impl Into<String>) {
        self.push(LogEntry::now(message, Severity::Error));
    }

    /// A copy of the current lines, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl EventSink for ActivityLog {
    fn emit(&self, event: SendEvent) {
        if let SendEvent::Log(entry) = event {
            self.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_log_keeps_only_log_events() {
        let log = ActivityLog::new();

        log.emit(SendEvent::Progress(Progress::sending(0, 1)));
        log.emit(SendEvent::Log(LogEntry::now("Sending cancelled", Severity::Error)));

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Sending cancelled");
        assert_eq!(entries[0].severity, Severity::Error);
    }

    #[test]
    fn test_activity_log_is_bounded() {
        let log = ActivityLog::new();

        for i in 0..ACTIVITY_LOG_CAPACITY + 5 {
            log.info(format!("line {i}"));
        }

        let entries = log.entries();
        assert_eq!(entries.len(), ACTIVITY_LOG_CAPACITY);
        assert_eq!(entries[0].message, "line 5");
    }

    #[test]
    fn test_severity_serializes_lowercase() -> testresult::TestResult {
        assert_eq!(serde_json::to_string(&Severity::Success)?, r#""success""#);

        Ok(())
    }
}
