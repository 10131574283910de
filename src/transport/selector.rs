//! Resolution of user options into a concrete [`Endpoint`].

use crate::config::{ConfigError, HookOptions};

use super::{DEFAULT_PLAINTEXT_PORT, Endpoint, PLAINTEXT_PORTS, TLS_PORT, Transport};

/// Resolve `options` into the endpoint the hook will dial.
///
/// Without plaintext flags the encrypted transport on [`TLS_PORT`] is used
/// and `security_context` (or the system defaults) applies. Plaintext
/// transports ignore `security_context` and accept only the published
/// ports; `unencrypted_port` is ignored for the encrypted transport.
pub fn resolve_endpoint(host: &str, options: &HookOptions) -> Result<Endpoint, ConfigError> {
    let transport = match (options.unencrypted_stream, options.unencrypted_datagram) {
        (true, true) => return Err(ConfigError::ConflictingTransports),
        (true, false) => Transport::PlainStream,
        (false, true) => Transport::PlainDatagram,
        (false, false) => {
            let tls = options.security_context.clone().unwrap_or_default();
            return Ok(Endpoint {
                host: host.to_owned(),
                port: TLS_PORT,
                transport: Transport::EncryptedStream(tls),
            });
        }
    };

    let port = match options.unencrypted_port {
        None => DEFAULT_PLAINTEXT_PORT,
        Some(port) if PLAINTEXT_PORTS.contains(&port) => port,
        Some(port) => return Err(ConfigError::InvalidPort(port)),
    };

    Ok(Endpoint {
        host: host.to_owned(),
        port,
        transport,
    })
}
