//! Compatibility bridge for the Rust `log` crate.
//!
//! [`HookLogger`] implements `log::Log` by converting each `log::Record` into
//! a [`LogRecord`] and delivering it synchronously through a
//! [`DeliveryHook`]. Structured key-values become JSON fields. Records emitted
//! by this crate itself are written to stderr rather than shipped.
//!
//! The delivery engine reports retries and dropped records through the `log`
//! facade under the `logentries_hook::delivery` target. With [`HookLogger`]
//! installed those records go to stderr. Any other global logger receives
//! them like application records; hosts that keep their own stream clean
//! should filter the `logentries_hook` target out of it.

use std::{collections::BTreeMap, time::Duration};

use log::{
    Metadata, Record,
    kv::{self, VisitSource},
};
use serde_json::{Number, Value};

use crate::{
    diagnostics,
    hook::DeliveryHook,
    level::Level,
    log_record::{LogRecord, RecordMetadata},
    rate_limited_warner::{DEFAULT_WARN_INTERVAL, RateLimitedWarner},
};

/// Adapter implementing the Rust `log::Log` trait.
pub struct HookLogger<H> {
    hook: H,
    warner: RateLimitedWarner,
}

impl<H: DeliveryHook> HookLogger<H> {
    pub fn new(hook: H) -> Self {
        Self::with_warn_interval(hook, DEFAULT_WARN_INTERVAL)
    }

    /// Space dropped-record warnings at least `interval` apart.
    pub fn with_warn_interval(hook: H, interval: Duration) -> Self {
        Self {
            hook,
            warner: RateLimitedWarner::new(interval),
        }
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    fn wants(&self, level: log::Level) -> bool {
        self.hook.levels().contains(&Level::from(level))
    }
}

struct FieldCollector<'a>(&'a mut BTreeMap<String, Value>);

impl<'kvs> VisitSource<'kvs> for FieldCollector<'_> {
    fn visit_pair(&mut self, key: kv::Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        self.0.insert(key.as_str().to_owned(), kv_to_json(&value));
        Ok(())
    }
}

fn kv_to_json(value: &kv::Value<'_>) -> Value {
    if let Some(b) = value.to_bool() {
        Value::Bool(b)
    } else if let Some(n) = value.to_i64() {
        Value::Number(n.into())
    } else if let Some(n) = value.to_u64() {
        Value::Number(n.into())
    } else if let Some(n) = value.to_f64().and_then(Number::from_f64) {
        Value::Number(n)
    } else {
        Value::String(value.to_string())
    }
}

fn convert(record: &Record<'_>) -> LogRecord {
    let metadata = RecordMetadata {
        module_path: record.module_path().unwrap_or_default().to_owned(),
        filename: record.file().unwrap_or_default().to_owned(),
        line_number: record.line().unwrap_or(0),
        ..RecordMetadata::default()
    };
    let mut converted = LogRecord::with_metadata(
        record.target(),
        Level::from(record.level()),
        &record.args().to_string(),
        metadata,
    );
    // A failing visitor only truncates the field set.
    let _ = record
        .key_values()
        .visit(&mut FieldCollector(&mut converted.fields));
    converted
}

impl<H: DeliveryHook> log::Log for HookLogger<H> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        diagnostics::is_own_target(metadata.target()) || self.wants(metadata.level())
    }

    fn log(&self, record: &Record<'_>) {
        if diagnostics::is_own_target(record.target()) {
            diagnostics::emit(record.level(), record.target(), record.args());
            return;
        }
        if !self.wants(record.level()) {
            return;
        }
        if let Err(err) = self.hook.deliver(&convert(record)) {
            diagnostics::report_drop(&self.warner, &err);
        }
    }

    fn flush(&self) {
        diagnostics::flush_drops(&self.warner);
    }
}

/// Most verbose `log` filter needed to cover `levels`.
pub fn max_level_for(levels: &[Level]) -> log::LevelFilter {
    match levels.iter().min() {
        None => log::LevelFilter::Off,
        Some(Level::Trace) => log::LevelFilter::Trace,
        Some(Level::Debug) => log::LevelFilter::Debug,
        Some(Level::Info) => log::LevelFilter::Info,
        Some(Level::Warn) => log::LevelFilter::Warn,
        Some(Level::Error | Level::Fatal | Level::Panic) => log::LevelFilter::Error,
    }
}

/// Install `hook` as the global `log` logger.
///
/// The global max level is set to cover the hook's levels and this crate's
/// own warnings. Fails if another logger is already installed.
pub fn install<H>(hook: H) -> Result<(), log::SetLoggerError>
where
    H: DeliveryHook + 'static,
{
    let filter = max_level_for(hook.levels()).max(log::LevelFilter::Warn);
    log::set_boxed_logger(Box::new(HookLogger::new(hook)))?;
    log::set_max_level(filter);
    Ok(())
}
