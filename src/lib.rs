//! tickerfx draws a text ticker onto raw RGB8 video frames.
//!
//! Lines come from an external command attached to a pseudo-terminal. A background
//! thread collects them into a bounded buffer; each frame handed to
//! [`ScrollFilter::apply`] renders the buffer either as one strip scrolling right to
//! left or as lines stacked top to bottom.
//!
//! # Data flow
//!
//! 1. **Source**: [`TextSourceChannel`] reads the command's output, splitting it on line
//!    feeds and restarting the command whenever its output ends.
//! 2. **Buffer**: [`PollLoop`] pushes every non-empty line into a [`LineBuffer`] that
//!    keeps the newest `n_lines` entries.
//! 3. **Composite**: [`ScrollCompositor`] rasterizes entries through a
//!    [`TextRasterizer`] and blits them onto the frame.
//!
//! Per-frame work never fails: a misbehaving source is restarted and unrenderable text
//! is skipped, both with a `tracing` event.
#![forbid(unsafe_code)]

mod config;
mod foundation;
mod render;
mod source;
mod text;
mod ticker;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
mod test_support;

pub use config::{MAX_SCROLL_SPEED, TickerCommand, TickerConfig};
pub use foundation::core::{BYTES_PER_PIXEL, FrameMut, Rgb8, RgbBitmap, resolve_edge_relative};
pub use foundation::error::{TickerError, TickerResult};
pub use render::blit::blit;
pub use render::text::{
    CoverageMask, ParleyRasterizer, TextRasterizer, TextStyle, draw_mask_onto, mask_to_bitmap,
};
pub use source::channel::{DEFAULT_POLL_TIMEOUT, LineAccumulator, TextSourceChannel};
pub use source::pty::{NativePtySpawner, PtySpawner, SourceCommand, SourceProcess, SpawnedSource};
pub use text::expand::{
    FeedExpander, PlaceholderExpander, SharedFeed, StaticFeed, TextFeed, split_display_lines,
};
pub use ticker::buffer::{LineBuffer, ScrollEntry};
pub use ticker::compositor::{ScrollCompositor, TickerGeometry, TickerMode, scroll_offset};
pub use ticker::filter::ScrollFilter;
pub use ticker::poller::PollLoop;
pub use ticker::telemetry::{CpuTracker, NoopCpuTracker, ProcessCpuTracker};
