//! Record filtering applied before formatting.
//!
//! Provides the [`RecordFilter`] trait along with the threshold-based
//! [`LevelFilter`] used by the hook.

use crate::log_record::LogRecord;

/// Trait implemented by record filters.
///
/// Filters are `Send + Sync` so a single hook can be shared across threads.
/// Implementations must be pure: no I/O and no failure modes.
pub trait RecordFilter: Send + Sync {
    /// Return `true` if `record` should be delivered.
    fn should_deliver(&self, record: &LogRecord) -> bool;
}

pub mod level_filter;

pub use level_filter::LevelFilter;
