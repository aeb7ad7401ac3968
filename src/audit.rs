//! JSONL audit logging for claude-approve
//!
//! Records every evaluated command and its full decision to a JSONL file.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::engine::Decision;
use crate::input::HookInput;

/// Log level for audit entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Approved,
    Deferred,
}

/// An audit log entry
#[derive(Debug, Serialize)]
pub struct AuditEntry<'a> {
    /// Timestamp of the decision
    pub timestamp: DateTime<Utc>,

    /// APPROVED or DEFERRED
    pub level: LogLevel,

    /// Session ID (if provided)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<&'a str>,

    /// The command exactly as received
    pub command: &'a str,

    /// Evaluation time in microseconds
    pub duration_us: u64,

    #[serde(flatten)]
    pub decision: &'a Decision,
}

impl<'a> AuditEntry<'a> {
    pub fn new(
        input: &'a HookInput,
        command: &'a str,
        decision: &'a Decision,
        elapsed: Duration,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level: if decision.approved {
                LogLevel::Approved
            } else {
                LogLevel::Deferred
            },
            session_id: input.session_id.as_deref(),
            cwd: input.cwd.as_deref(),
            command,
            duration_us: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            decision,
        }
    }
}

/// Audit logger
#[derive(Default)]
pub struct AuditLogger {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Create a new audit logger. An unopenable path disables logging.
    pub fn new(path: Option<&Path>) -> Self {
        let writer = path.and_then(|p| {
            // Ensure parent directory exists
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }

            match OpenOptions::new().create(true).append(true).open(p) {
                Ok(file) => Some(BufWriter::new(file)),
                Err(e) => {
                    log::warn!("audit log {} unavailable: {e}", p.display());
                    None
                }
            }
        });

        Self { writer }
    }

    /// Log an audit entry
    pub fn log(&mut self, entry: &AuditEntry) -> Result<(), std::io::Error> {
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Log a decision
    pub fn log_decision(
        &mut self,
        input: &HookInput,
        command: &str,
        decision: &Decision,
        elapsed: Duration,
    ) -> Result<(), std::io::Error> {
        let entry = AuditEntry::new(input, command, decision, elapsed);
        self.log(&entry)
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }
}
