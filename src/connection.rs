//! Connection lifecycle for the delivery engine.
//!
//! A [`Dialer`] opens connections; the [`ConnectionManager`] decides whether
//! a connection outlives a single write according to its
//! [`ConnectionPolicy`]. Under [`ConnectionPolicy::Reuse`] the live
//! connection sits behind a mutex that is held across dial and write so
//! concurrent callers never interleave bytes on one stream.

use std::{fmt, io, sync::Arc, time::Duration};

use native_tls::TlsConnector;
use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    config::{ConfigError, ConnectionPolicy},
    transport::{ActiveConnection, Endpoint, Transport, connect_endpoint},
};

/// A writable, exclusively owned transport session.
pub trait Connection: Send {
    /// Write `line` in full and flush it.
    fn write_line(&mut self, line: &[u8]) -> io::Result<()>;
}

impl Connection for ActiveConnection {
    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.write_all(line)?;
        self.flush()
    }
}

/// Opens new connections to the remote endpoint.
pub trait Dialer: Send + Sync {
    fn dial(&self) -> io::Result<Box<dyn Connection>>;
}

/// Dialer backed by real sockets.
pub struct NetworkDialer {
    endpoint: Endpoint,
    tls: Option<TlsConnector>,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl NetworkDialer {
    /// Build a dialer for `endpoint`, preparing the TLS connector up front.
    pub fn new(
        endpoint: Endpoint,
        connect_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let tls = match &endpoint.transport {
            Transport::EncryptedStream(options) => {
                Some(options.connector().map_err(ConfigError::Tls)?)
            }
            Transport::PlainStream | Transport::PlainDatagram => None,
        };
        Ok(Self {
            endpoint,
            tls,
            connect_timeout,
            write_timeout,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Dialer for NetworkDialer {
    fn dial(&self) -> io::Result<Box<dyn Connection>> {
        let conn = connect_endpoint(
            &self.endpoint,
            self.tls.as_ref(),
            self.connect_timeout,
            self.write_timeout,
        )?;
        Ok(Box::new(conn))
    }
}

impl fmt::Debug for NetworkDialer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkDialer")
            .field("endpoint", &self.endpoint)
            .field("connect_timeout", &self.connect_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

/// Failure of a single dial-and-write attempt.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("dial failed: {0}")]
    Dial(#[source] io::Error),
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
}

impl AttemptError {
    pub fn io_error(&self) -> &io::Error {
        match self {
            AttemptError::Dial(err) | AttemptError::Write(err) => err,
        }
    }
}

/// Owns the dialer and, under the reuse policy, the live connection.
pub struct ConnectionManager {
    dialer: Arc<dyn Dialer>,
    policy: ConnectionPolicy,
    live: Mutex<Option<Box<dyn Connection>>>,
}

impl ConnectionManager {
    pub fn new(dialer: Arc<dyn Dialer>, policy: ConnectionPolicy) -> Self {
        Self {
            dialer,
            policy,
            live: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> ConnectionPolicy {
        self.policy
    }

    /// Open a new connection without storing it.
    pub fn dial(&self) -> io::Result<Box<dyn Connection>> {
        self.dialer.dial()
    }

    /// Dial immediately to validate the endpoint.
    ///
    /// The reuse policy keeps the connection for the first write; the
    /// per-write policy closes the probe straight away.
    pub fn connect_eagerly(&self) -> io::Result<()> {
        let conn = self.dial()?;
        if self.policy == ConnectionPolicy::Reuse {
            *self.live.lock() = Some(conn);
        }
        Ok(())
    }

    /// Write `line`, dialling first if no usable connection exists.
    pub fn write(&self, line: &[u8]) -> Result<(), AttemptError> {
        match self.policy {
            ConnectionPolicy::PerWrite => self.write_fresh(line),
            ConnectionPolicy::Reuse => {
                let mut live = self.live.lock();
                if live.is_none() {
                    *live = Some(self.dial().map_err(AttemptError::Dial)?);
                }
                Self::write_live(&mut live, line)
            }
        }
    }

    /// Write `line` on a connection dialled after the last write failure.
    ///
    /// Under the reuse policy a failed write has already emptied the slot,
    /// so this dials unless another caller has installed a healthy
    /// replacement in the meantime.
    pub fn redial_and_write(&self, line: &[u8]) -> Result<(), AttemptError> {
        match self.policy {
            ConnectionPolicy::PerWrite => self.write_fresh(line),
            ConnectionPolicy::Reuse => {
                let mut live = self.live.lock();
                if live.is_none() {
                    *live = Some(self.dial().map_err(AttemptError::Dial)?);
                }
                Self::write_live(&mut live, line)
            }
        }
    }

    /// Drop the held connection, if any.
    pub fn close(&self) {
        self.live.lock().take();
    }

    /// Whether a reusable connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.live.lock().is_some()
    }

    fn write_fresh(&self, line: &[u8]) -> Result<(), AttemptError> {
        let mut conn = self.dial().map_err(AttemptError::Dial)?;
        conn.write_line(line).map_err(AttemptError::Write)
    }

    fn write_live(live: &mut Option<Box<dyn Connection>>, line: &[u8]) -> Result<(), AttemptError> {
        let Some(conn) = live.as_mut() else {
            return Err(AttemptError::Write(io::Error::new(
                io::ErrorKind::NotConnected,
                "no live connection",
            )));
        };
        conn.write_line(line).map_err(|err| {
            // A failed stream may be half-closed; never write to it again.
            *live = None;
            AttemptError::Write(err)
        })
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("policy", &self.policy)
            .field("connected", &self.is_connected())
            .finish()
    }
}
