//! Builder for [`LogentriesHook`](crate::LogentriesHook).
//!
//! Exposes the [`HookOptions`] surface plus operational tuning: target host,
//! timeouts, connection policy, retry budget and eager connection. Tests and
//! embedders may also inject the [`Dialer`], [`Sleeper`] and formatter.

use std::{fmt, sync::Arc, time::Duration};

use crate::{
    config::{
        ConfigError, ConnectionPolicy, DEFAULT_CONNECT_TIMEOUT, DEFAULT_WRITE_TIMEOUT, HookConfig,
        HookOptions, RetryPolicy,
    },
    connection::{ConnectionManager, Dialer, NetworkDialer},
    delivery::{DeliveryEngine, Sleeper, ThreadSleeper},
    filters::LevelFilter,
    formatter::{JsonFormatter, LogFormatter, SharedFormatter},
    hook::LogentriesHook,
    level::Level,
    transport::{LOGENTRIES_HOST, TlsOptions, resolve_endpoint},
};

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(ConfigError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`LogentriesHook`] instances.
#[derive(Clone, Default)]
pub struct HookBuilder {
    token: String,
    options: HookOptions,
    host: Option<String>,
    connect_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    policy: ConnectionPolicy,
    eager_connect: bool,
    report_caller: bool,
    formatter: Option<SharedFormatter>,
    dialer: Option<Arc<dyn Dialer>>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl HookBuilder {
    /// Create a builder for the account identified by `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Replace the whole option set.
    pub fn with_options(mut self, options: HookOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the minimum severity forwarded.
    pub fn with_priority(mut self, priority: Level) -> Self {
        self.options.priority = priority;
        self
    }

    /// Set the strftime pattern used for the `time` field.
    pub fn with_timestamp_format(mut self, pattern: impl Into<String>) -> Self {
        self.options.timestamp_format = pattern.into();
        self
    }

    /// Supply the TLS security context for the encrypted transport.
    pub fn with_security_context(mut self, tls: TlsOptions) -> Self {
        self.options.security_context = Some(tls);
        self
    }

    /// Use plain TCP, optionally on one of the published ports.
    pub fn with_unencrypted_stream(mut self, port: Option<u16>) -> Self {
        self.options.unencrypted_stream = true;
        self.options.unencrypted_datagram = false;
        self.options.unencrypted_port = port;
        self
    }

    /// Use UDP, optionally on one of the published ports.
    pub fn with_unencrypted_datagram(mut self, port: Option<u16>) -> Self {
        self.options.unencrypted_datagram = true;
        self.options.unencrypted_stream = false;
        self.options.unencrypted_port = port;
        self
    }

    /// Override the ingestion host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    option_setter!(
        #[doc = "Bound each connect (and TLS handshake) to this many milliseconds."]
        with_connect_timeout_ms,
        connect_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Bound each socket write to this many milliseconds."]
        with_write_timeout_ms,
        write_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Number of retries after the first failed write."]
        with_retries,
        retries,
        u32
    );
    option_setter!(with_retry_delay_ms, retry_delay_ms, u64);

    /// Choose between one reused connection and a fresh one per write.
    pub fn with_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Dial while building so an unreachable endpoint fails construction.
    pub fn with_eager_connect(mut self, eager: bool) -> Self {
        self.eager_connect = eager;
        self
    }

    /// Add `file` and `func` keys to the default JSON formatter.
    pub fn with_report_caller(mut self, enabled: bool) -> Self {
        self.report_caller = enabled;
        self
    }

    /// Replace the default JSON formatter. `timestamp_format` and
    /// `report_caller` only configure the default formatter.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: LogFormatter + 'static,
    {
        self.formatter = Some(SharedFormatter::new(formatter));
        self
    }

    /// Replace the network dialer.
    pub fn with_dialer<D>(mut self, dialer: D) -> Self
    where
        D: Dialer + 'static,
    {
        self.dialer = Some(Arc::new(dialer));
        self
    }

    /// Replace the sleeper used between retries.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Some(Arc::new(sleeper));
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_token()?;
        self.validate_host()?;
        self.validate_timeouts()?;
        Ok(())
    }

    fn validate_token(&self) -> Result<(), ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        Ok(())
    }

    fn validate_host(&self) -> Result<(), ConfigError> {
        match &self.host {
            Some(host) if host.trim().is_empty() => Err(ConfigError::InvalidConfig(
                "host must not be empty".into(),
            )),
            _ => Ok(()),
        }
    }

    fn validate_timeouts(&self) -> Result<(), ConfigError> {
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.write_timeout_ms {
            ensure_positive!(timeout, "write_timeout_ms")?;
        }
        Ok(())
    }

    /// Validate the builder and resolve it into a [`HookConfig`].
    pub fn build_config(&self) -> Result<HookConfig, ConfigError> {
        self.validate()?;
        let host = self.host.as_deref().unwrap_or(LOGENTRIES_HOST);
        let endpoint = resolve_endpoint(host, &self.options)?;
        let mut retry = RetryPolicy::default();
        if let Some(retries) = self.retries {
            retry.retries = retries;
        }
        if let Some(delay) = self.retry_delay_ms {
            retry.delay = Duration::from_millis(delay);
        }
        Ok(HookConfig {
            endpoint,
            priority: self.options.priority,
            connect_timeout: self
                .connect_timeout_ms
                .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_millis),
            write_timeout: self
                .write_timeout_ms
                .map_or(DEFAULT_WRITE_TIMEOUT, Duration::from_millis),
            policy: self.policy,
            retry,
            eager_connect: self.eager_connect,
        })
    }

    fn build_formatter(&self) -> Result<SharedFormatter, ConfigError> {
        if let Some(formatter) = &self.formatter {
            return Ok(formatter.clone());
        }
        let pattern = &self.options.timestamp_format;
        let formatter = JsonFormatter::default()
            .with_timestamp_format(pattern.as_str())
            .map_err(|_| ConfigError::TimestampFormat(pattern.clone()))?
            .with_report_caller(self.report_caller);
        Ok(SharedFormatter::new(formatter))
    }

    fn build_dialer(&self, config: &HookConfig) -> Result<Arc<dyn Dialer>, ConfigError> {
        if let Some(dialer) = &self.dialer {
            return Ok(Arc::clone(dialer));
        }
        let dialer = NetworkDialer::new(
            config.endpoint.clone(),
            config.connect_timeout,
            config.write_timeout,
        )?;
        Ok(Arc::new(dialer))
    }

    /// Build the hook.
    pub fn build(&self) -> Result<LogentriesHook, ConfigError> {
        let config = self.build_config()?;
        let formatter = self.build_formatter()?;
        let connections = ConnectionManager::new(self.build_dialer(&config)?, config.policy);
        if config.eager_connect {
            connections.connect_eagerly().map_err(ConfigError::Connect)?;
        }
        let sleeper = self
            .sleeper
            .clone()
            .unwrap_or_else(|| Arc::new(ThreadSleeper));
        let engine = DeliveryEngine::new(
            self.token.clone(),
            LevelFilter::new(config.priority),
            formatter,
            connections,
            config.retry,
            sleeper,
        );
        Ok(LogentriesHook::from_parts(config, engine))
    }
}

impl fmt::Debug for HookBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookBuilder")
            .field("options", &self.options)
            .field("host", &self.host)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("write_timeout_ms", &self.write_timeout_ms)
            .field("retries", &self.retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("policy", &self.policy)
            .field("eager_connect", &self.eager_connect)
            .field("custom_dialer", &self.dialer.is_some())
            .finish_non_exhaustive()
    }
}
