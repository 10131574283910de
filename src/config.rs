//! Configuration surface and defaults for [`LogentriesHook`](crate::LogentriesHook).
//!
//! [`HookOptions`] mirrors the public option set callers pass to
//! [`LogentriesHook::new`](crate::LogentriesHook::new); [`HookBuilder`](crate::HookBuilder)
//! layers the operational knobs (timeouts, retry budget, connection policy)
//! on top before resolving everything into a [`HookConfig`].

use std::{io, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    level::Level,
    transport::{Endpoint, TlsOptions},
};

/// Default connection timeout applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write timeout applied to socket writes.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);
/// Number of retries attempted after the first failed write.
pub const DEFAULT_RETRY_COUNT: u32 = 3;
/// Fixed pause between a failed write and the next redial.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Errors that abort hook construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The account token was empty.
    #[error("a Logentries token is required")]
    EmptyToken,
    /// A plaintext port outside the published set was requested.
    #[error("invalid unencrypted port {0}; valid ports are 80, 514 and 10000")]
    InvalidPort(u16),
    /// Both plaintext transports were requested at once.
    #[error("unencrypted_stream and unencrypted_datagram are mutually exclusive")]
    ConflictingTransports,
    /// The timestamp pattern cannot be rendered.
    #[error("invalid timestamp format {0:?}")]
    TimestampFormat(String),
    /// Invalid user supplied configuration.
    #[error("invalid hook configuration: {0}")]
    InvalidConfig(String),
    /// The TLS connector could not be built from the security context.
    #[error("failed to build TLS connector: {0}")]
    Tls(#[source] native_tls::Error),
    /// The eager connection attempt failed.
    #[error("failed to connect to Logentries: {0}")]
    Connect(#[source] io::Error),
}

/// Options recognised by [`LogentriesHook::new`](crate::LogentriesHook::new).
///
/// `security_context` is only honoured for the encrypted transport and is
/// skipped when deserialising since certificates are supplied in code.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct HookOptions {
    /// Minimum severity forwarded to Logentries.
    pub priority: Level,
    /// strftime pattern for the `time` field; empty keeps RFC 3339.
    pub timestamp_format: String,
    /// Custom TLS settings such as additional trusted roots.
    #[serde(skip)]
    pub security_context: Option<TlsOptions>,
    /// Send over plain TCP instead of TLS.
    pub unencrypted_stream: bool,
    /// Send over UDP instead of TLS.
    pub unencrypted_datagram: bool,
    /// Port for plaintext transports; defaults to 514.
    pub unencrypted_port: Option<u16>,
}

/// How the connection manager treats the underlying socket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPolicy {
    /// Keep one connection for the lifetime of the hook, redialling on failure.
    Reuse,
    /// Dial a fresh connection for every write and close it afterwards.
    #[default]
    PerWrite,
}

/// Bounded, fixed-delay retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries attempted after the first failure.
    pub retries: u32,
    /// Pause before each redial.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRY_COUNT,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Fully resolved configuration used at runtime.
#[derive(Clone, Debug)]
pub struct HookConfig {
    /// Host, port and transport every connection dials.
    pub endpoint: Endpoint,
    /// Minimum severity forwarded to Logentries.
    pub priority: Level,
    /// Bound on each connect and TLS handshake.
    pub connect_timeout: Duration,
    /// Bound on each socket write.
    pub write_timeout: Duration,
    /// Whether one connection is reused or a fresh one dialled per write.
    pub policy: ConnectionPolicy,
    /// Retry budget and delay after a failed write.
    pub retry: RetryPolicy,
    /// Dial once while building the hook.
    pub eager_connect: bool,
}
