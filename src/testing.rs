//! Deterministic stand-ins for the network and the clock.
//!
//! Available to unit tests and, through the `test-util` feature, to
//! integration tests and benchmarks.

use std::{collections::VecDeque, io, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
    connection::{Connection, Dialer},
    delivery::Sleeper,
};

#[derive(Default)]
struct Script {
    dial_outcomes: VecDeque<bool>,
    write_outcomes: VecDeque<bool>,
    fail_all_writes: bool,
    dials: usize,
    writes: usize,
    closed: usize,
    lines: Vec<Vec<u8>>,
}

/// Dialer whose dial and write outcomes follow a script.
///
/// Each scripted `true` succeeds and `false` fails; once a script runs out
/// every further operation succeeds. Clones share state, so a test can keep
/// one handle while the hook owns another.
#[derive(Clone, Default)]
pub struct ScriptedDialer {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for successive dials.
    pub fn with_dial_script(self, outcomes: impl IntoIterator<Item = bool>) -> Self {
        self.script.lock().dial_outcomes.extend(outcomes);
        self
    }

    /// Queue outcomes for successive writes across all connections.
    pub fn with_write_script(self, outcomes: impl IntoIterator<Item = bool>) -> Self {
        self.script.lock().write_outcomes.extend(outcomes);
        self
    }

    /// Make every write fail.
    pub fn failing_writes(self) -> Self {
        self.script.lock().fail_all_writes = true;
        self
    }

    /// Number of dial attempts, including failed ones.
    pub fn dials(&self) -> usize {
        self.script.lock().dials
    }

    /// Number of write attempts, including failed ones.
    pub fn writes(&self) -> usize {
        self.script.lock().writes
    }

    /// Number of connections dropped so far.
    pub fn closed(&self) -> usize {
        self.script.lock().closed
    }

    /// Lines accepted by successful writes, in order.
    pub fn lines(&self) -> Vec<Vec<u8>> {
        self.script.lock().lines.clone()
    }
}

impl Dialer for ScriptedDialer {
    fn dial(&self) -> io::Result<Box<dyn Connection>> {
        let mut script = self.script.lock();
        script.dials += 1;
        if script.dial_outcomes.pop_front().unwrap_or(true) {
            Ok(Box::new(ScriptedConnection {
                script: Arc::clone(&self.script),
            }))
        } else {
            Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "scripted dial failure",
            ))
        }
    }
}

struct ScriptedConnection {
    script: Arc<Mutex<Script>>,
}

impl Connection for ScriptedConnection {
    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        let mut script = self.script.lock();
        script.writes += 1;
        let scripted = script.write_outcomes.pop_front().unwrap_or(true);
        if script.fail_all_writes || !scripted {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "scripted write failure",
            ));
        }
        script.lines.push(line.to_vec());
        Ok(())
    }
}

impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        self.script.lock().closed += 1;
    }
}

/// Sleeper that records requested delays instead of blocking.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.sleeps.lock().push(delay);
    }
}
