//! The video filter: owns the background poll thread and composites each frame.
//!
//! A [`ScrollFilter`] is fed frames by the host pipeline through [`ScrollFilter::apply`].
//! Lines arrive asynchronously from the source process; every frame draws whatever is
//! buffered at that moment.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::config::TickerConfig;
use crate::foundation::core::FrameMut;
use crate::foundation::error::{TickerError, TickerResult};
use crate::render::text::{ParleyRasterizer, TextRasterizer};
use crate::source::channel::{DEFAULT_POLL_TIMEOUT, TextSourceChannel};
use crate::source::pty::{NativePtySpawner, PtySpawner};
use crate::text::expand::{FeedExpander, PlaceholderExpander};
use crate::ticker::buffer::LineBuffer;
use crate::ticker::compositor::ScrollCompositor;
use crate::ticker::poller::PollLoop;
use crate::ticker::telemetry::{CpuTracker, ProcessCpuTracker};

/// Text ticker overlay for RGB8 frames.
pub struct ScrollFilter {
    compositor: ScrollCompositor,
    buffer: Arc<LineBuffer>,
    stop: Arc<AtomicBool>,
    poller: Option<JoinHandle<()>>,
    warned_bad_frame: bool,
}

impl std::fmt::Debug for ScrollFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollFilter")
            .field("compositor", &self.compositor)
            .field("buffered", &self.buffer.len())
            .field("running", &self.poller.is_some())
            .finish()
    }
}

impl ScrollFilter {
    /// Build a filter with the native PTY spawner, a Parley rasterizer for
    /// `config.font_path`, the configured static feeds and process CPU telemetry.
    #[tracing::instrument(skip(config), fields(font = %config.font_path.display()))]
    pub fn new(config: &TickerConfig) -> TickerResult<Self> {
        config.validate()?;
        let rasterizer = ParleyRasterizer::from_font_path(&config.font_path)?;
        let expander = FeedExpander::new().with_static_feeds(&config.feeds);
        Self::with_parts(
            config,
            Box::new(NativePtySpawner::default()),
            Box::new(rasterizer),
            Box::new(expander),
            Box::new(ProcessCpuTracker::default()),
        )
    }

    /// Build a filter from explicit collaborators.
    ///
    /// Starts the source process and the `tickerfx-poll` thread before returning.
    #[tracing::instrument(skip_all, fields(command = ?config.command, n_lines = config.n_lines))]
    pub fn with_parts(
        config: &TickerConfig,
        spawner: Box<dyn PtySpawner>,
        rasterizer: Box<dyn TextRasterizer>,
        expander: Box<dyn PlaceholderExpander>,
        tracker: Box<dyn CpuTracker>,
    ) -> TickerResult<Self> {
        config.validate()?;
        let command = config.command.to_source_command()?;

        let buffer = Arc::new(LineBuffer::new(config.n_lines));
        let stop = Arc::new(AtomicBool::new(false));

        let mut channel = TextSourceChannel::new(spawner, command, config.restart_backoff());
        channel.restart();

        let poller = PollLoop::new(
            channel,
            buffer.clone(),
            tracker,
            stop.clone(),
            DEFAULT_POLL_TIMEOUT,
        )
        .spawn()
        .map_err(|e| TickerError::source(format!("failed to start poll thread: {e}")))?;

        tracing::info!("ticker filter started");
        Ok(Self {
            compositor: ScrollCompositor::new(
                config.geometry(),
                config.text_style(),
                rasterizer,
                expander,
            ),
            buffer,
            stop,
            poller: Some(poller),
            warned_bad_frame: false,
        })
    }

    /// Draw the ticker onto `in_out`, a `width * height` RGB8 frame, for a frame at
    /// `timestamp_us`.
    ///
    /// `_prev` is the previous frame and is not consulted. A zero-sized frame or a
    /// buffer shorter than `width * height * 3` leaves `in_out` untouched.
    pub fn apply(&mut self, timestamp_us: u64, width: usize, height: usize, _prev: &[u8], in_out: &mut [u8]) {
        let frame = if width == 0 || height == 0 {
            Err(TickerError::validation("frame has zero size"))
        } else {
            FrameMut::new(in_out, width, height)
        };
        match frame {
            Ok(mut frame) => self.compositor.composite(&self.buffer, timestamp_us, &mut frame),
            Err(e) => {
                if !self.warned_bad_frame {
                    self.warned_bad_frame = true;
                    tracing::warn!(width, height, error = %e, "frame rejected; ticker not drawn");
                }
            }
        }
    }

    /// Stop the poll thread and the source process. Safe to call more than once.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.poller.take() {
            if handle.join().is_err() {
                tracing::warn!("ticker poll thread panicked");
            }
            tracing::info!("ticker filter stopped");
        }
    }

    /// True until [`Self::stop`] has run.
    pub fn is_running(&self) -> bool {
        self.poller.is_some()
    }

    /// Texts currently buffered, oldest first.
    pub fn snapshot_lines(&self) -> Vec<String> {
        self.buffer.texts()
    }

    /// Scroll offset the next frame starts with.
    pub fn scroll_position(&self) -> usize {
        self.compositor.scroll_position()
    }
}

impl Drop for ScrollFilter {
    fn drop(&mut self) {
        self.stop();
        self.buffer.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ticker/filter.rs"]
mod tests;
