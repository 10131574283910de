//! Threshold filter comparing record severity against a priority.

use crate::{filters::RecordFilter, level::Level, log_record::LogRecord};

/// Passes records whose level is at or above `threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelFilter {
    threshold: Level,
}

impl LevelFilter {
    pub fn new(threshold: Level) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    /// Levels this filter lets through, least severe first.
    pub fn levels(&self) -> &'static [Level] {
        self.threshold.at_or_above()
    }
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self::new(Level::default())
    }
}

impl RecordFilter for LevelFilter {
    fn should_deliver(&self, record: &LogRecord) -> bool {
        record.level >= self.threshold
    }
}
