//! Log record representation consumed by the hook.
//!
//! `LogRecord` captures a single event from the host logging framework along
//! with the structured fields and source metadata that the JSON formatter
//! serialises onto the wire.

use std::collections::BTreeMap;
use std::fmt;
use std::thread;
use std::time::SystemTime;

use serde_json::Value;

use crate::level::Level;

/// Additional context associated with a log record.
#[derive(Clone, Debug)]
pub struct RecordMetadata {
    /// Rust module path where the log call originated.
    pub module_path: String,
    /// Source file name for the log call.
    pub filename: String,
    /// Line number in the source file.
    pub line_number: u32,
    /// Time the record was created.
    pub timestamp: SystemTime,
    /// Name of the thread that created the record (if any).
    pub thread_name: Option<String>,
}

impl Default for RecordMetadata {
    fn default() -> Self {
        Self {
            module_path: String::new(),
            filename: String::new(),
            line_number: 0,
            timestamp: SystemTime::now(),
            thread_name: thread::current().name().map(ToString::to_string),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Name of the logger (or `log` target) that created this record.
    pub logger: String,
    /// Severity of the record.
    pub level: Level,
    /// The log message content.
    pub message: String,
    /// Structured key-value fields attached to the record.
    pub fields: BTreeMap<String, Value>,
    /// Contextual metadata for the record.
    pub metadata: RecordMetadata,
}

impl LogRecord {
    /// Construct a new record from logger `name`, `level`, and `message`.
    pub fn new(logger: &str, level: Level, message: &str) -> Self {
        Self::with_metadata(logger, level, message, RecordMetadata::default())
    }

    /// Construct a record with explicit source location.
    pub fn with_metadata(
        logger: &str,
        level: Level,
        message: &str,
        metadata: RecordMetadata,
    ) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            fields: BTreeMap::new(),
            metadata,
        }
    }

    /// Attach a structured field, replacing any previous value for `key`.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
