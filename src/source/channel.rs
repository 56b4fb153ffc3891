//! Line-oriented channel over the source process output.
//!
//! # Invariants
//!
//! 1. **Single owner**: the channel lives on the poll thread only; nothing else touches
//!    the process or its output stream.
//! 2. **Self-healing**: EOF, a read error or a vanished reader moves the channel to
//!    `Failed`; the next poll that is allowed to retry spawns a fresh process. No failure
//!    is reported to the caller.
//! 3. **Ordering**: lines come out in the order their terminating line feed arrived,
//!    regardless of how the bytes were chunked.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::source::pty::{PtySpawner, SourceCommand, SourceProcess};

/// Poll wait used by the background loop.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1);

const READ_CHUNK: usize = 4096;

/// Bytes received but not yet terminated by a line feed.
///
/// Carriage returns are rewritten to spaces on the way in, which flattens the
/// "redraw the current line" convention used by progress-style tools.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineAccumulator {
    pending: Vec<u8>,
}

impl LineAccumulator {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly read chunk.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.pending
            .extend(chunk.iter().map(|&b| if b == b'\r' { b' ' } else { b }));
    }

    /// Remove and return the first complete line, without its line feed.
    pub fn take_line(&mut self) -> Option<String> {
        let lf = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=lf).take(lf).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Bytes waiting for a line feed.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }
}

#[derive(Debug)]
enum ReaderMsg {
    Data(Vec<u8>),
    Eof,
    Err(std::io::Error),
}

enum ChannelState {
    Connected {
        rx: mpsc::Receiver<ReaderMsg>,
        process: Box<dyn SourceProcess>,
    },
    Failed,
}

/// Connection to the external line producer, with restart-on-failure.
pub struct TextSourceChannel {
    spawner: Box<dyn PtySpawner>,
    command: SourceCommand,
    state: ChannelState,
    acc: LineAccumulator,
    restart_backoff: Duration,
    last_restart: Option<Instant>,
    restarts: u64,
}

impl std::fmt::Debug for TextSourceChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextSourceChannel")
            .field("command", &self.command)
            .field("connected", &self.is_connected())
            .field("pending_bytes", &self.acc.pending().len())
            .field("restarts", &self.restarts)
            .finish()
    }
}

impl TextSourceChannel {
    /// Build a channel in the failed state; call [`Self::restart`] to connect.
    ///
    /// `restart_backoff` is the minimum spacing between two process spawns.
    pub fn new(spawner: Box<dyn PtySpawner>, command: SourceCommand, restart_backoff: Duration) -> Self {
        Self {
            spawner,
            command,
            state: ChannelState::Failed,
            acc: LineAccumulator::new(),
            restart_backoff,
            last_restart: None,
            restarts: 0,
        }
    }

    /// True while a process is attached.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ChannelState::Connected { .. })
    }

    /// Number of spawn attempts so far.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Bytes waiting for a line feed.
    pub fn pending(&self) -> &[u8] {
        self.acc.pending()
    }

    /// Tear down the current process (if any) and spawn a fresh one.
    ///
    /// Spawn failures leave the channel in the failed state; they are logged, not returned.
    pub fn restart(&mut self) {
        self.disconnect();
        self.restarts += 1;
        self.last_restart = Some(Instant::now());

        match self.spawner.spawn(&self.command) {
            Ok(spawned) => {
                let pid = spawned.process.pid();
                let rx = spawn_reader(spawned.reader);
                self.state = ChannelState::Connected {
                    rx,
                    process: spawned.process,
                };
                tracing::info!(command = %self.command, ?pid, restarts = self.restarts, "text source started");
            }
            Err(e) => {
                tracing::warn!(command = %self.command, error = %e, "failed to start text source");
                self.state = ChannelState::Failed;
            }
        }
    }

    /// Kill the attached process, leaving the channel failed.
    pub fn disconnect(&mut self) {
        let old = std::mem::replace(&mut self.state, ChannelState::Failed);
        if let ChannelState::Connected { mut process, .. } = old {
            process.terminate();
        }
    }

    /// Wait up to `timeout` for output and return the next complete line, if any.
    ///
    /// At most one chunk is consumed per call. A failed read restarts the process and
    /// yields `None` for this call.
    pub fn poll_once(&mut self, timeout: Duration) -> Option<String> {
        let received = match &self.state {
            ChannelState::Connected { rx, .. } => Some(rx.recv_timeout(timeout)),
            ChannelState::Failed => None,
        };

        match received {
            None => {
                if self.may_restart() {
                    self.restart();
                } else {
                    thread::sleep(timeout);
                }
            }
            Some(Ok(ReaderMsg::Data(chunk))) => self.acc.push_chunk(&chunk),
            Some(Ok(ReaderMsg::Eof) | Err(mpsc::RecvTimeoutError::Disconnected)) => {
                tracing::warn!(command = %self.command, "text source closed its output");
                self.fail();
                return None;
            }
            Some(Ok(ReaderMsg::Err(e))) => {
                tracing::warn!(command = %self.command, error = %e, "text source read failed");
                self.fail();
                return None;
            }
            Some(Err(mpsc::RecvTimeoutError::Timeout)) => {}
        }

        self.acc.take_line()
    }

    fn fail(&mut self) {
        if self.may_restart() {
            self.restart();
        } else {
            self.disconnect();
        }
    }

    fn may_restart(&self) -> bool {
        self.last_restart
            .is_none_or(|t| t.elapsed() >= self.restart_backoff)
    }
}

impl Drop for TextSourceChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Forward blocking reads into a channel so polling can use a timeout.
fn spawn_reader(mut reader: Box<dyn std::io::Read + Send>) -> mpsc::Receiver<ReaderMsg> {
    let (tx, rx) = mpsc::channel::<ReaderMsg>();
    let spawned = thread::Builder::new()
        .name("tickerfx-source-reader".to_string())
        .spawn(move || {
            let mut buf = [0u8; READ_CHUNK];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        let _ = tx.send(ReaderMsg::Eof);
                        break;
                    }
                    Ok(n) => {
                        if tx.send(ReaderMsg::Data(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        let _ = tx.send(ReaderMsg::Err(e));
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "failed to start source reader thread");
    }
    // On spawn failure the sender is already dropped, so the next poll sees a disconnect.
    rx
}

#[cfg(test)]
#[path = "../../tests/unit/source/channel.rs"]
mod tests;
