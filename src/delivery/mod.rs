//! Delivery engine: filter, format, frame, write, retry.
//!
//! Each call to [`DeliveryEngine::deliver`] runs synchronously on the
//! caller's thread. A record below the threshold is dropped without I/O. A
//! record that cannot be formatted is reported and dropped without a
//! network attempt. A failed write is retried a bounded number of times,
//! pausing a fixed delay and redialling before each retry.

use std::{fmt, io, sync::Arc, thread, time::Duration};

use log::{error, warn};
use thiserror::Error;

use crate::{
    config::RetryPolicy,
    connection::{AttemptError, ConnectionManager},
    filters::{LevelFilter, RecordFilter},
    formatter::{FormatError, SharedFormatter},
    log_record::LogRecord,
};


/// Blocks the calling thread between retries.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        thread::sleep(delay);
    }
}

/// Errors surfaced by a single delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The record could not be turned into a line; nothing was sent.
    #[error("failed to format record: {0}")]
    Format(#[from] FormatError),
    /// A redial failed mid-retry. `source` is the last write-side failure;
    /// the dial error is kept in `redial`.
    #[error("delivery abandoned after {attempts} attempt(s): {source}")]
    Abandoned {
        attempts: u32,
        #[source]
        source: AttemptError,
        redial: io::Error,
    },
    /// Every attempt in the retry budget failed.
    #[error("delivery exhausted after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        /// Body of the undelivered line, without the account token.
        line: String,
        #[source]
        source: AttemptError,
    },
}

/// Successful outcome of [`DeliveryEngine::deliver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The record was below the threshold; no I/O happened.
    Filtered,
    /// The line was written after `attempts` write attempts.
    Delivered { attempts: u32 },
}

/// Prefix `body` with `token`, rejecting line breaks before its end.
///
/// A single trailing `\n` or `\r\n` is kept as the line terminator.
pub fn frame_line(token: &str, body: &str) -> Result<Vec<u8>, FormatError> {
    let content = match body.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => body,
    };
    if let Some(offset) = content.find(['\n', '\r']) {
        return Err(FormatError::EmbeddedNewline { offset });
    }
    let mut line = Vec::with_capacity(token.len() + body.len());
    line.extend_from_slice(token.as_bytes());
    line.extend_from_slice(body.as_bytes());
    Ok(line)
}

pub struct DeliveryEngine {
    token: String,
    filter: LevelFilter,
    formatter: SharedFormatter,
    connections: ConnectionManager,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl DeliveryEngine {
    pub fn new(
        token: String,
        filter: LevelFilter,
        formatter: SharedFormatter,
        connections: ConnectionManager,
        retry: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            token,
            filter,
            formatter,
            connections,
            retry,
            sleeper,
        }
    }

    pub fn filter(&self) -> &LevelFilter {
        &self.filter
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Deliver `record` to the remote endpoint.
    pub fn deliver(&self, record: &LogRecord) -> Result<Delivery, DeliveryError> {
        if !self.filter.should_deliver(record) {
            return Ok(Delivery::Filtered);
        }

        let (body, line) = match self.prepare(record) {
            Ok(prepared) => prepared,
            Err(err) => {
                error!(
                    "LogentriesHook unable to format {} record from {:?}: {err}",
                    record.level, record.logger
                );
                return Err(err.into());
            }
        };

        let attempts = self.send(&line, &body)?;
        Ok(Delivery::Delivered { attempts })
    }

    fn prepare(&self, record: &LogRecord) -> Result<(String, Vec<u8>), FormatError> {
        let body = self.formatter.format(record)?;
        let line = frame_line(&self.token, &body)?;
        Ok((body, line))
    }

    fn send(&self, line: &[u8], body: &str) -> Result<u32, DeliveryError> {
        let mut last = match self.connections.write(line) {
            Ok(()) => return Ok(1),
            Err(err) => err,
        };

        let retries = self.retry.retries;
        for retry in 1..=retries {
            self.sleeper.sleep(self.retry.delay);
            warn!("LogentriesHook trouble writing to conn; retrying {retry} of {retries}: {last}");
            match self.connections.redial_and_write(line) {
                Ok(()) => return Ok(retry + 1),
                Err(AttemptError::Dial(redial)) => {
                    error!("LogentriesHook unable to dial new connection: {redial}");
                    return Err(DeliveryError::Abandoned {
                        attempts: retry,
                        source: last,
                        redial,
                    });
                }
                Err(err) => last = err,
            }
        }

        let attempts = retries + 1;
        error!("LogentriesHook unable to write to conn after {attempts} attempt(s): {last}");
        Err(DeliveryError::Exhausted {
            attempts,
            line: body.trim_end().to_owned(),
            source: last,
        })
    }
}

impl fmt::Debug for DeliveryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryEngine")
            .field("filter", &self.filter)
            .field("formatter", &self.formatter)
            .field("connections", &self.connections)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
