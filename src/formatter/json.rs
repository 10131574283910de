//! Single-line JSON formatter.
//!
//! Emits one JSON object per record terminated by `\n`. Structured fields are
//! written at the top level next to the reserved `level`, `msg` and `time`
//! keys; a field that collides with a reserved key is renamed to
//! `fields.<key>` so the record metadata always wins. Keys are emitted in
//! sorted order.

use std::{collections::BTreeMap, fmt::Write as _};

use chrono::{DateTime, Local, SecondsFormat, format::Item, format::StrftimeItems};
use serde_json::Value;

use crate::log_record::LogRecord;

use super::{FormatError, LogFormatter};

const KEY_LEVEL: &str = "level";
const KEY_MSG: &str = "msg";
const KEY_TIME: &str = "time";
const KEY_FILE: &str = "file";
const KEY_FUNC: &str = "func";

/// Formatter producing Logentries-friendly JSON bodies.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    timestamp_format: Option<String>,
    report_caller: bool,
}

impl JsonFormatter {
    /// Use a strftime-style `pattern` for the `time` field.
    ///
    /// An empty pattern keeps the RFC 3339 default.
    pub fn with_timestamp_format(mut self, pattern: impl Into<String>) -> Result<Self, FormatError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            self.timestamp_format = None;
            return Ok(self);
        }
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(FormatError::Timestamp { pattern });
        }
        self.timestamp_format = Some(pattern);
        Ok(self)
    }

    /// Include `file` (`path:line`) and `func` (module path) keys.
    pub fn with_report_caller(mut self, enabled: bool) -> Self {
        self.report_caller = enabled;
        self
    }

    pub fn timestamp_format(&self) -> Option<&str> {
        self.timestamp_format.as_deref()
    }

    fn render_time(&self, record: &LogRecord) -> Result<String, FormatError> {
        let local: DateTime<Local> = record.metadata.timestamp.into();
        let Some(pattern) = &self.timestamp_format else {
            return Ok(local.to_rfc3339_opts(SecondsFormat::Secs, false));
        };
        let mut rendered = String::new();
        write!(rendered, "{}", local.format(pattern)).map_err(|_| FormatError::Timestamp {
            pattern: pattern.clone(),
        })?;
        Ok(rendered)
    }

    fn reserved_keys(&self) -> &'static [&'static str] {
        if self.report_caller {
            &[KEY_LEVEL, KEY_MSG, KEY_TIME, KEY_FILE, KEY_FUNC]
        } else {
            &[KEY_LEVEL, KEY_MSG, KEY_TIME]
        }
    }
}

impl LogFormatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        let reserved = self.reserved_keys();
        let mut data = BTreeMap::new();
        for (key, value) in &record.fields {
            if reserved.contains(&key.as_str()) {
                data.insert(format!("fields.{key}"), value.clone());
            } else {
                data.insert(key.clone(), value.clone());
            }
        }

        data.insert(KEY_TIME.into(), Value::String(self.render_time(record)?));
        data.insert(KEY_MSG.into(), Value::String(record.message.clone()));
        data.insert(KEY_LEVEL.into(), Value::String(record.level.wire_name().into()));

        if self.report_caller {
            let meta = &record.metadata;
            data.insert(
                KEY_FILE.into(),
                Value::String(format!("{}:{}", meta.filename, meta.line_number)),
            );
            data.insert(KEY_FUNC.into(), Value::String(meta.module_path.clone()));
        }

        let mut line = serde_json::to_string(&data)?;
        line.push('\n');
        Ok(line)
    }
}
