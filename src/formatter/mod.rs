//! Formatter contract and the bundled JSON implementation.
//!
//! The hook never interprets record fields itself: a [`LogFormatter`] turns a
//! [`LogRecord`] into the JSON body, and the delivery engine only prefixes the
//! account token and checks line framing.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::log_record::LogRecord;

mod json;

pub use json::JsonFormatter;

/// Errors raised while turning a record into a line.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The configured timestamp pattern could not render the record time.
    #[error("timestamp pattern {pattern:?} could not be rendered")]
    Timestamp { pattern: String },
    /// JSON encoding failed.
    #[error("failed to encode record as JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The formatter produced a line break before the end of the body.
    #[error("formatted body contains an embedded line break at byte {offset}")]
    EmbeddedNewline { offset: usize },
}

/// Trait for formatting log records into wire bodies.
///
/// Implementors must be thread-safe (`Send + Sync`) so one formatter can be
/// shared by every thread logging through the hook. Bodies should be a
/// single line; a single trailing `\n` is permitted.
pub trait LogFormatter: Send + Sync {
    /// Format a log record into its wire body.
    fn format(&self, record: &LogRecord) -> Result<String, FormatError>;
}

/// Shared formatter trait object held by the hook.
#[derive(Clone)]
pub struct SharedFormatter {
    inner: Arc<dyn LogFormatter>,
}

impl SharedFormatter {
    /// Create a shared formatter from an owned formatter implementation.
    pub fn new<F>(formatter: F) -> Self
    where
        F: LogFormatter + 'static,
    {
        Self {
            inner: Arc::new(formatter),
        }
    }

    /// Wrap an existing shared formatter trait object.
    pub fn from_arc(inner: Arc<dyn LogFormatter>) -> Self {
        Self { inner }
    }

    /// Format a log record using the wrapped formatter instance.
    pub fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        self.inner.format(record)
    }
}

impl Default for SharedFormatter {
    fn default() -> Self {
        Self::new(JsonFormatter::default())
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedFormatter(<dyn LogFormatter>)")
    }
}

impl LogFormatter for Arc<dyn LogFormatter> {
    fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        (**self).format(record)
    }
}

impl LogFormatter for Box<dyn LogFormatter> {
    fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        (**self).format(record)
    }
}
