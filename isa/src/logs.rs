//! Process-wide progress logging.
//!
//! Pipeline steps report through the `log_*` helpers. Entries go to stderr,
//! either as indented human-readable lines or as one JSON object per line
//! (`--log-json`), so stdout stays free for command output.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// How entries are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting level for per-item details
    #[serde(default)]
    pub indent: u8,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
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

    /// Human-readable line (without trailing newline).
    pub fn render_text(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(self.indent as usize);
        format!("{}{} {}", indent, prefix, self.message)
    }
}

/// Global logger
pub static LOGGER: Lazy<Logger> = Lazy::new(Logger::new);

/// Writes log entries to stderr.
pub struct Logger {
    json: AtomicBool,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            json: AtomicBool::new(false),
        }
    }

    pub fn set_format(&self, format: LogFormat) {
        self.json.store(format == LogFormat::Json, Ordering::Relaxed);
    }

    pub fn format(&self) -> LogFormat {
        if self.json.load(Ordering::Relaxed) {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    pub fn log(&self, entry: LogEntry) {
        let line = match self.format() {
            LogFormat::Json => {
                serde_json::to_string(&entry).unwrap_or_else(|_| entry.render_text())
            }
            LogFormat::Text => entry.render_text(),
        };
        // Ignore a closed stderr
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOGGER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOGGER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOGGER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOGGER.log(LogEntry::error(msg));
}

pub fn log_warning_indent(msg: impl Into<String>, indent: u8) {
    LOGGER.log(LogEntry::warning(msg).with_indent(indent));
}

pub fn log_error_indent(msg: impl Into<String>, indent: u8) {
    LOGGER.log(LogEntry::error(msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_rendering_indents() {
        let entry = LogEntry::warning("Unknown column 'cmodel'").with_indent(1);
        assert_eq!(entry.render_text(), "      ⚠️ Unknown column 'cmodel'");
    }

    #[test]
    fn test_json_entry_shape() {
        let entry = LogEntry::error("d2.xml: Malformed XML");
        let json: serde_json::Value = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["level"], "error");
        assert_eq!(json["message"], "d2.xml: Malformed XML");
        assert_eq!(json["indent"], 0);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_format_switch() {
        let logger = Logger::new();
        assert_eq!(logger.format(), LogFormat::Text);
        logger.set_format(LogFormat::Json);
        assert_eq!(logger.format(), LogFormat::Json);
    }
}
