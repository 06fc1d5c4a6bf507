//! Import progress logs, streamed via Server-Sent Events (SSE).
//!
//! Every entry is echoed to stderr and broadcast to connected clients.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of the broadcast channel; slow clients lag past this.
const CHANNEL_CAPACITY: usize = 256;

/// Log level for client display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting level for detail lines
    #[serde(default)]
    pub indent: u8,
    /// Import job the entry belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub job_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            job_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all connected SSE clients
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Send a log entry to all subscribers
    pub fn log(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(entry.indent as usize);
        eprintln!("{}{} {}", indent, prefix, entry.message);

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for SSE streaming
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Logger bound to one import job.
#[derive(Debug, Clone)]
pub struct JobLog {
    job_id: String,
}

impl JobLog {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }

    fn emit(&self, entry: LogEntry) {
        LOG_BROADCASTER.log(entry.with_job(self.job_id.clone()));
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.emit(LogEntry::info(msg));
    }

    pub fn success(&self, msg: impl Into<String>) {
        self.emit(LogEntry::success(msg));
    }

    pub fn warning(&self, msg: impl Into<String>) {
        self.emit(LogEntry::warning(msg));
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.emit(LogEntry::error(msg));
    }

    pub fn detail(&self, msg: impl Into<String>) {
        self.emit(LogEntry::info(msg).with_indent(1));
    }
}
