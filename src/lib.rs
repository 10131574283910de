//! Synchronous delivery of log records to Logentries.
//!
//! A [`LogentriesHook`] is built from an account token and optional
//! [`HookOptions`]. For every record at or above the configured priority it
//! formats one JSON line, prefixes the token and writes it to
//! `data.logentries.com` over TLS, plain TCP or UDP. Failed writes are retried
//! a bounded number of times with a fixed delay, redialling before each retry.
//!
//! The hook plugs into the `log` facade through [`log_compat`] and into
//! `tracing` through `tracing_compat` when the matching features are enabled.

mod builder;
mod config;
mod connection;
mod delivery;
#[cfg(any(feature = "log-compat", feature = "tracing-compat"))]
mod diagnostics;
pub mod filters;
pub mod formatter;
mod hook;
mod level;
mod log_record;
mod rate_limited_warner;
pub mod transport;

#[cfg(feature = "log-compat")]
pub mod log_compat;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
#[cfg(feature = "tracing-compat")]
pub mod tracing_compat;

pub use builder::HookBuilder;
pub use config::{
    ConfigError, ConnectionPolicy, DEFAULT_CONNECT_TIMEOUT, DEFAULT_RETRY_COUNT,
    DEFAULT_RETRY_DELAY, DEFAULT_WRITE_TIMEOUT, HookConfig, HookOptions, RetryPolicy,
};
pub use connection::{AttemptError, Connection, ConnectionManager, Dialer, NetworkDialer};
pub use delivery::{
    Delivery, DeliveryEngine, DeliveryError, Sleeper, ThreadSleeper, frame_line,
};
pub use filters::{LevelFilter, RecordFilter};
pub use formatter::{FormatError, JsonFormatter, LogFormatter, SharedFormatter};
pub use hook::{DeliveryHook, LogentriesHook};
pub use level::{Level, ParseLevelError};
pub use log_record::{LogRecord, RecordMetadata};
pub use rate_limited_warner::{DEFAULT_WARN_INTERVAL, RateLimitedWarner};
pub use transport::{Endpoint, RootCertificate, TlsOptions, Transport};
