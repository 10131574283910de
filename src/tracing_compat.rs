//! Bridge from `tracing` events to a [`DeliveryHook`].
//!
//! [`HookLayer`] is a `tracing_subscriber` layer. Each event at a level the
//! hook wants becomes a [`LogRecord`]; the `message` field supplies the record
//! text and every other field is attached as a JSON value. Spans are ignored.
//! Events emitted by this crate itself are written to stderr rather than
//! shipped.

use std::{collections::BTreeMap, fmt, time::Duration};

use serde_json::{Number, Value};
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::layer::{Context, Layer};

use crate::{
    diagnostics,
    hook::DeliveryHook,
    level::Level,
    log_record::{LogRecord, RecordMetadata},
    rate_limited_warner::{DEFAULT_WARN_INTERVAL, RateLimitedWarner},
};

const MESSAGE_FIELD: &str = "message";

/// Layer delivering `tracing` events through a hook.
pub struct HookLayer<H> {
    hook: H,
    warner: RateLimitedWarner,
}

impl<H: DeliveryHook> HookLayer<H> {
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

    /// Report drops still waiting on the rate limiter.
    pub fn flush(&self) {
        diagnostics::flush_drops(&self.warner);
    }
}

fn level_of(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE => Level::Trace,
        tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Info,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::ERROR => Level::Error,
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: BTreeMap<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == MESSAGE_FIELD {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            self.message = Some(text);
        } else {
            self.fields.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_owned()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::Number(value.into()));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value)
            .map_or_else(|| Value::String(value.to_string()), Value::Number);
        self.insert(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}

fn convert(event: &Event<'_>, level: Level) -> LogRecord {
    let meta = event.metadata();
    let mut visitor = FieldVisitor::default();
    event.record(&mut visitor);
    let metadata = RecordMetadata {
        module_path: meta.module_path().unwrap_or_default().to_owned(),
        filename: meta.file().unwrap_or_default().to_owned(),
        line_number: meta.line().unwrap_or(0),
        ..RecordMetadata::default()
    };
    let mut record = LogRecord::with_metadata(
        meta.target(),
        level,
        visitor.message.as_deref().unwrap_or_default(),
        metadata,
    );
    record.fields = visitor.fields;
    record
}

impl<S, H> Layer<S> for HookLayer<H>
where
    S: Subscriber,
    H: DeliveryHook + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = level_of(meta.level());
        if diagnostics::is_own_target(meta.target()) {
            let record = convert(event, level);
            diagnostics::emit(meta.level(), meta.target(), record.message);
            return;
        }
        if !self.hook.levels().contains(&level) {
            return;
        }
        if let Err(err) = self.hook.deliver(&convert(event, level)) {
            diagnostics::report_drop(&self.warner, &err);
        }
    }
}
