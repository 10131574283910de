//! Diagnostic side channel for the logging bridges.
//!
//! The engine reports its own trouble through the `log` facade under this
//! crate's target. When a bridge is the process-wide logger those records
//! must not be shipped back through the hook, so the bridges divert them
//! here and write them to stderr instead.

use std::fmt;

use crate::{delivery::DeliveryError, rate_limited_warner::RateLimitedWarner};

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Whether `target` names this crate or one of its modules.
pub(crate) fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(CRATE_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

#[cfg(test)]
thread_local! {
    static EMITTED: std::cell::RefCell<Vec<String>> = const { std::cell::RefCell::new(Vec::new()) };
}

/// Write an internal diagnostic to stderr.
pub(crate) fn emit(level: impl fmt::Display, target: &str, message: impl fmt::Display) {
    let line = format!("{target} [{level}] {message}");
    #[cfg(test)]
    EMITTED.with(|emitted| emitted.borrow_mut().push(line.clone()));
    eprintln!("{line}");
}

/// Diagnostics emitted on the current thread since the last call.
#[cfg(test)]
pub(crate) fn take_emitted() -> Vec<String> {
    EMITTED.with(|emitted| std::mem::take(&mut *emitted.borrow_mut()))
}

/// Count a record lost by a bridge and warn at most once per interval.
pub(crate) fn report_drop(warner: &RateLimitedWarner, err: &DeliveryError) {
    warner.record_drop();
    warner.warn_if_due(|count| {
        emit(
            "WARN",
            CRATE_TARGET,
            format_args!("LogentriesHook dropped {count} records; last error: {err}"),
        );
    });
}

/// Report any drops still pending.
pub(crate) fn flush_drops(warner: &RateLimitedWarner) {
    warner.flush(|count| {
        emit(
            "WARN",
            CRATE_TARGET,
            format_args!("LogentriesHook dropped {count} records in the last interval"),
        );
    });
}
