use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::source::channel::TextSourceChannel;
use crate::ticker::buffer::LineBuffer;
use crate::ticker::telemetry::CpuTracker;

/// Producer side of the ticker: moves lines from the source channel into the buffer.
///
/// Runs until the shared stop flag is raised. The loop never blocks longer than the
/// poll timeout, so stopping is prompt.
pub struct PollLoop {
    channel: TextSourceChannel,
    buffer: Arc<LineBuffer>,
    tracker: Box<dyn CpuTracker>,
    stop: Arc<AtomicBool>,
    poll_timeout: Duration,
}

impl std::fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("channel", &self.channel)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl PollLoop {
    /// Assemble a loop; nothing runs until [`Self::run`] or [`Self::spawn`].
    pub fn new(
        channel: TextSourceChannel,
        buffer: Arc<LineBuffer>,
        tracker: Box<dyn CpuTracker>,
        stop: Arc<AtomicBool>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            channel,
            buffer,
            tracker,
            stop,
            poll_timeout,
        }
    }

    /// Poll until stopped, then tear down the source process.
    pub fn run(mut self) {
        let mut accepted = 0u64;
        while !self.stop.load(Ordering::Acquire) {
            if let Some(line) = self.channel.poll_once(self.poll_timeout)
                && !line.is_empty()
            {
                accepted += 1;
                tracing::debug!(line = %line, accepted, "ticker line received");
                self.buffer.push(line);
            }
            self.tracker.track();
        }
        self.channel.disconnect();
        tracing::info!(accepted, restarts = self.channel.restarts(), "ticker poll loop stopped");
    }

    /// Run the loop on a dedicated, named thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("tickerfx-poll".to_string())
            .spawn(move || self.run())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ticker/poller.rs"]
mod tests;
