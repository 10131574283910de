//! Transport selection and socket primitives.
//!
//! The selector resolves [`HookOptions`](crate::config::HookOptions) into an
//! [`Endpoint`] once at construction. The connect helpers then turn an
//! endpoint into an [`ActiveConnection`] over TLS, plain TCP or UDP.

mod connect;
mod selector;


pub use connect::{ActiveConnection, RootCertificate, TlsOptions, connect_endpoint};
pub use selector::resolve_endpoint;

/// Logentries ingestion host.
pub const LOGENTRIES_HOST: &str = "data.logentries.com";
/// Port used by the encrypted transport.
pub const TLS_PORT: u16 = 443;
/// Port used by plaintext transports when none is requested.
pub const DEFAULT_PLAINTEXT_PORT: u16 = 514;
/// Ports Logentries accepts plaintext traffic on.
pub const PLAINTEXT_PORTS: [u16; 3] = [80, 514, 10000];

/// Network mechanism used to reach the endpoint.
#[derive(Clone, Debug)]
pub enum Transport {
    /// TLS over TCP with the given security context.
    EncryptedStream(TlsOptions),
    /// Plain TCP.
    PlainStream,
    /// Plain UDP; each line is one datagram.
    PlainDatagram,
}

impl Transport {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Transport::EncryptedStream(_))
    }

    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Transport::EncryptedStream(_) => "tls",
            Transport::PlainStream => "tcp",
            Transport::PlainDatagram => "udp",
        }
    }
}

/// Resolved remote endpoint. Immutable once the hook is built.
#[derive(Clone, Debug)]
pub struct Endpoint {
    /// Hostname or IP address to connect to.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Transport used to reach `host:port`.
    pub transport: Transport,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}", self.transport.name(), self.host, self.port)
    }
}
