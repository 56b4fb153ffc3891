use crate::foundation::core::{FrameMut, RgbBitmap, resolve_edge_relative};
use crate::render::blit::blit;
use crate::render::text::{TextRasterizer, TextStyle};
use crate::text::expand::{PlaceholderExpander, split_display_lines};
use crate::ticker::buffer::{LineBuffer, ScrollEntry};

/// How buffered lines are laid out on the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickerMode {
    /// One horizontal strip moving right to left, cycling through the buffer.
    #[default]
    Scroll,
    /// Lines stacked top to bottom, re-rendered every frame.
    Static,
}

/// Where and how the ticker is placed on the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickerGeometry {
    /// Left edge; negative values count back from the right edge.
    pub x: i32,
    /// Top edge; negative values count back from the bottom edge.
    pub y: i32,
    /// Ticker width in pixels, `-1` for the full frame width.
    pub width: i32,
    /// Font size in pixels; static mode advances `font_size + 1` per line.
    pub font_size: u32,
    /// Scroll speed in pixels per second.
    pub scroll_speed: u32,
    /// Layout mode.
    pub mode: TickerMode,
}

/// Horizontal scroll offset for a frame at `timestamp_us`.
///
/// Always in `[0, head_width)`; zero when the head entry has no width.
pub fn scroll_offset(timestamp_us: u64, scroll_speed: u32, head_width: usize) -> usize {
    if head_width == 0 {
        return 0;
    }
    let step_us = (1_000_000 / u64::from(scroll_speed.max(1))).max(1);
    ((timestamp_us / step_us) % head_width as u64) as usize
}

/// Draws the buffered lines onto frames.
///
/// Owned by the frame path; the only state carried between frames is the scroll
/// offset, which starts at 0.
pub struct ScrollCompositor {
    geometry: TickerGeometry,
    style: TextStyle,
    rasterizer: Box<dyn TextRasterizer>,
    expander: Box<dyn PlaceholderExpander>,
    cur_x_pos: usize,
}

impl std::fmt::Debug for ScrollCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollCompositor")
            .field("geometry", &self.geometry)
            .field("style", &self.style)
            .field("cur_x_pos", &self.cur_x_pos)
            .finish()
    }
}

impl ScrollCompositor {
    /// Build a compositor; `style.max_width_px` is ignored and derived per mode.
    pub fn new(
        geometry: TickerGeometry,
        style: TextStyle,
        rasterizer: Box<dyn TextRasterizer>,
        expander: Box<dyn PlaceholderExpander>,
    ) -> Self {
        Self {
            geometry,
            style,
            rasterizer,
            expander,
            cur_x_pos: 0,
        }
    }

    /// Scroll offset that the next frame will start with.
    pub fn scroll_position(&self) -> usize {
        self.cur_x_pos
    }

    /// Layout settings.
    pub fn geometry(&self) -> &TickerGeometry {
        &self.geometry
    }

    /// Draw the buffer onto `frame` for a frame at `timestamp_us`.
    pub fn composite(&mut self, buffer: &LineBuffer, timestamp_us: u64, frame: &mut FrameMut<'_>) {
        match self.geometry.mode {
            TickerMode::Scroll => self.composite_scrolling(buffer, timestamp_us, frame),
            TickerMode::Static => self.composite_static(buffer, timestamp_us, frame),
        }
    }

    fn ticker_width(&self, frame_width: usize) -> i64 {
        if self.geometry.width < 0 {
            frame_width as i64
        } else {
            i64::from(self.geometry.width)
        }
    }

    fn composite_scrolling(&mut self, buffer: &LineBuffer, timestamp_us: u64, frame: &mut FrameMut<'_>) {
        let work_x = resolve_edge_relative(self.geometry.x, frame.width);
        let work_y = resolve_edge_relative(self.geometry.y, frame.height);
        let use_w = self.ticker_width(frame.width);
        let style = TextStyle {
            max_width_px: None,
            ..self.style
        };

        let Self {
            rasterizer,
            expander,
            cur_x_pos,
            geometry,
            ..
        } = self;

        buffer.with_entries(|entries| {
            if entries.is_empty() {
                return;
            }

            let mut total_w = 0usize;
            for entry in entries {
                let bm = entry.bitmap_or_render(|text| {
                    render_entry(&mut **rasterizer, &**expander, text, timestamp_us, &style)
                });
                total_w += bm.width;
            }

            if total_w > 0 {
                let mut x = work_x;
                let mut nr = 0usize;
                let mut first = true;
                while x - work_x < use_w {
                    let offset_x = if first { *cur_x_pos } else { 0 };
                    first = false;

                    let entry: &ScrollEntry = &entries[nr];
                    if let Some(bm) = entry.bitmap() {
                        blit(
                            &mut *frame.data,
                            frame.width,
                            frame.height,
                            x - offset_x as i64,
                            work_y,
                            bm,
                            offset_x,
                            0,
                        );
                    }
                    x += entry.width() as i64 - offset_x as i64;

                    nr += 1;
                    if nr >= entries.len() {
                        nr = 0;
                    }
                }
            }

            *cur_x_pos = scroll_offset(timestamp_us, geometry.scroll_speed, entries[0].width());
        });
    }

    fn composite_static(&mut self, buffer: &LineBuffer, timestamp_us: u64, frame: &mut FrameMut<'_>) {
        let work_x = resolve_edge_relative(self.geometry.x, frame.width);
        let mut work_y = resolve_edge_relative(self.geometry.y, frame.height);
        let style = TextStyle {
            max_width_px: Some(self.ticker_width(frame.width).max(1) as f32),
            ..self.style
        };
        let advance = i64::from(self.geometry.font_size) + 1;

        let Self {
            rasterizer,
            expander,
            ..
        } = self;

        buffer.for_each_entry(|entry| {
            let text = expander.expand(entry.text(), timestamp_us);
            for line in split_display_lines(&text) {
                if let Err(e) = rasterizer.draw_onto(frame, work_x, work_y, line, &style) {
                    tracing::debug!(error = %e, line, "failed to draw ticker line");
                }
                work_y += advance;
            }
        });
    }
}

fn render_entry(
    rasterizer: &mut dyn TextRasterizer,
    expander: &dyn PlaceholderExpander,
    text: &str,
    timestamp_us: u64,
    style: &TextStyle,
) -> RgbBitmap {
    let expanded = expander.expand(text, timestamp_us);
    match rasterizer.rasterize(&expanded, style) {
        Ok(bm) => bm,
        Err(e) => {
            tracing::warn!(error = %e, text = %expanded, "failed to rasterize ticker line");
            RgbBitmap::empty()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ticker/compositor.rs"]
mod tests;
