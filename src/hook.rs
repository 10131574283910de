//! Public hook type exported by the crate.

use std::sync::Arc;

use crate::{
    builder::HookBuilder,
    config::{ConfigError, HookConfig, HookOptions},
    delivery::{Delivery, DeliveryEngine, DeliveryError},
    level::Level,
    log_record::LogRecord,
    transport::Endpoint,
};

/// Interface a host logging framework drives.
///
/// `levels` lists the severities the hook wants to be notified of; `deliver`
/// is called once per emitted record. Implementations are shared across
/// threads.
pub trait DeliveryHook: Send + Sync {
    fn levels(&self) -> &[Level];

    fn deliver(&self, record: &LogRecord) -> Result<(), DeliveryError>;
}

impl<H: DeliveryHook + ?Sized> DeliveryHook for Arc<H> {
    fn levels(&self) -> &[Level] {
        (**self).levels()
    }

    fn deliver(&self, record: &LogRecord) -> Result<(), DeliveryError> {
        (**self).deliver(record)
    }
}

/// Hook forwarding records to Logentries.
#[derive(Debug)]
pub struct LogentriesHook {
    config: HookConfig,
    engine: DeliveryEngine,
}

impl LogentriesHook {
    /// Create a hook for `token` with optional `options`.
    ///
    /// No connection is opened here unless the builder requested an eager
    /// connect; see [`HookBuilder::with_eager_connect`].
    pub fn new(token: &str, options: Option<HookOptions>) -> Result<Self, ConfigError> {
        HookBuilder::new(token)
            .with_options(options.unwrap_or_default())
            .build()
    }

    /// Start a [`HookBuilder`] for `token`.
    pub fn builder(token: impl Into<String>) -> HookBuilder {
        HookBuilder::new(token)
    }

    pub(crate) fn from_parts(config: HookConfig, engine: DeliveryEngine) -> Self {
        Self { config, engine }
    }

    /// Endpoint resolved at construction.
    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    pub fn priority(&self) -> Level {
        self.config.priority
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    /// Deliver `record`, reporting whether it was filtered or written.
    pub fn deliver_record(&self, record: &LogRecord) -> Result<Delivery, DeliveryError> {
        self.engine.deliver(record)
    }

    /// Close any connection held under the reuse policy.
    pub fn close(&self) {
        self.engine.connections().close();
    }
}

impl DeliveryHook for LogentriesHook {
    fn levels(&self) -> &[Level] {
        self.engine.filter().levels()
    }

    fn deliver(&self, record: &LogRecord) -> Result<(), DeliveryError> {
        self.deliver_record(record).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ConnectionPolicy,
        testing::{RecordingSleeper, ScriptedDialer},
        transport::{DEFAULT_PLAINTEXT_PORT, TLS_PORT},
    };
    use rstest::rstest;
    use static_assertions::assert_impl_all;

    #[rstest]
    fn hook_is_send_sync() {
        assert_impl_all!(LogentriesHook: Send, Sync);
        assert_impl_all!(Arc<LogentriesHook>: DeliveryHook);
    }

    #[rstest]
    fn new_without_options_uses_tls() {
        let hook = LogentriesHook::new("tok", None).expect("hook");
        assert_eq!(hook.endpoint().port, TLS_PORT);
        assert!(hook.endpoint().transport.is_encrypted());
        assert_eq!(hook.priority(), Level::Info);
        assert_eq!(hook.config().policy, ConnectionPolicy::PerWrite);
    }

    #[rstest]
    fn new_with_plaintext_defaults_port() {
        let options = HookOptions {
            unencrypted_stream: true,
            ..HookOptions::default()
        };
        let hook = LogentriesHook::new("tok", Some(options)).expect("hook");
        assert_eq!(hook.endpoint().port, DEFAULT_PLAINTEXT_PORT);
    }

    #[rstest]
    fn levels_follow_priority() {
        let options = HookOptions {
            priority: Level::Error,
            ..HookOptions::default()
        };
        let hook = LogentriesHook::new("tok", Some(options)).expect("hook");
        assert_eq!(hook.levels(), &[Level::Error, Level::Fatal, Level::Panic]);
    }

    #[rstest]
    fn close_releases_reused_connection() {
        let dialer = ScriptedDialer::new();
        let hook = LogentriesHook::builder("tok")
            .with_policy(ConnectionPolicy::Reuse)
            .with_dialer(dialer.clone())
            .with_sleeper(RecordingSleeper::new())
            .build()
            .expect("hook");
        hook.deliver(&LogRecord::new("app", Level::Warn, "kept"))
            .expect("delivered");
        assert_eq!(dialer.closed(), 0);
        hook.close();
        assert_eq!(dialer.closed(), 1);
    }
}
