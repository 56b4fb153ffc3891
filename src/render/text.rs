use std::path::Path;

use crate::foundation::core::{BYTES_PER_PIXEL, FrameMut, Rgb8, RgbBitmap};
use crate::foundation::error::{TickerError, TickerResult};
use crate::render::blit::blit;

/// Styling shared by every line a ticker renders.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size_px: f32,
    /// Glyph color.
    pub fg: Rgb8,
    /// Box fill behind the glyphs. `None` means black in bitmaps and "leave the frame
    /// alone" when drawing straight onto a frame.
    pub bg: Option<Rgb8>,
    /// Draw glyphs as the inverse of whatever lies beneath them instead of in `fg`.
    pub invert: bool,
    /// Wrap width in pixels; `None` keeps every line unbroken.
    pub max_width_px: Option<f32>,
}

/// 8-bit glyph coverage for one laid-out piece of text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageMask {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Row-major coverage, `width * height` long.
    pub alpha: Vec<u8>,
}

impl CoverageMask {
    /// True when the mask has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Turns text into pixels.
///
/// Implementors only provide glyph coverage; turning coverage into an RGB bitmap or
/// drawing it onto a frame is shared.
pub trait TextRasterizer: Send {
    /// Shape and rasterize `text` into a coverage mask.
    fn coverage(&mut self, text: &str, style: &TextStyle) -> TickerResult<CoverageMask>;

    /// Render `text` into an owned RGB bitmap sized to the text.
    fn rasterize(&mut self, text: &str, style: &TextStyle) -> TickerResult<RgbBitmap> {
        let mask = self.coverage(text, style)?;
        Ok(mask_to_bitmap(&mask, style))
    }

    /// Render `text` directly onto `frame` with its top-left corner at `(x, y)`.
    fn draw_onto(
        &mut self,
        frame: &mut FrameMut<'_>,
        x: i64,
        y: i64,
        text: &str,
        style: &TextStyle,
    ) -> TickerResult<()> {
        let mask = self.coverage(text, style)?;
        draw_mask_onto(frame, x, y, &mask, style);
        Ok(())
    }
}

/// Flatten coverage over the style's background (black when unset).
pub fn mask_to_bitmap(mask: &CoverageMask, style: &TextStyle) -> RgbBitmap {
    if mask.is_empty() {
        return RgbBitmap::empty();
    }
    let under = style.bg.unwrap_or(Rgb8::black());
    let mut data = Vec::with_capacity(mask.alpha.len() * BYTES_PER_PIXEL);
    for &a in &mask.alpha {
        data.extend_from_slice(&shade(under, a, style));
    }
    RgbBitmap {
        width: mask.width,
        height: mask.height,
        data,
    }
}

/// Composite coverage onto a frame, clipped to its bounds.
pub fn draw_mask_onto(frame: &mut FrameMut<'_>, x: i64, y: i64, mask: &CoverageMask, style: &TextStyle) {
    if mask.is_empty() {
        return;
    }
    if style.bg.is_some() {
        let bitmap = mask_to_bitmap(mask, style);
        blit(&mut *frame.data, frame.width, frame.height, x, y, &bitmap, 0, 0);
        return;
    }

    for my in 0..mask.height {
        let ty = y + my as i64;
        if ty >= frame.height as i64 {
            break;
        }
        if ty < 0 {
            continue;
        }
        for mx in 0..mask.width {
            let tx = x + mx as i64;
            if tx < 0 || tx >= frame.width as i64 {
                continue;
            }
            let a = mask.alpha[my * mask.width + mx];
            if a == 0 {
                continue;
            }
            let o = (ty as usize * frame.width + tx as usize) * BYTES_PER_PIXEL;
            let Some(px) = frame.data.get_mut(o..o + BYTES_PER_PIXEL) else {
                return;
            };
            let out = shade(Rgb8::new(px[0], px[1], px[2]), a, style);
            px.copy_from_slice(&out);
        }
    }
}

fn shade(under: Rgb8, coverage: u8, style: &TextStyle) -> [u8; 3] {
    let ink = if style.invert { under.inverted() } else { style.fg }.to_array();
    let under = under.to_array();
    let a = u16::from(coverage);
    let inv = 255 - a;
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = ((u16::from(ink[i]) * a + u16::from(under[i]) * inv + 127) / 255) as u8;
    }
    out
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TextBrush;

/// [`TextRasterizer`] backed by Parley for shaping/line breaking and `vello_cpu` for
/// glyph rasterization.
pub struct ParleyRasterizer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
    ctx: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for ParleyRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParleyRasterizer")
            .field("family_name", &self.family_name)
            .finish()
    }
}

impl ParleyRasterizer {
    /// Load a font file from disk.
    pub fn from_font_path(path: impl AsRef<Path>) -> TickerResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            TickerError::raster(format!("failed to read font '{}': {e}", path.display()))
        })?;
        Self::from_font_bytes(bytes)
    }

    /// Register raw TrueType/OpenType bytes as the only font used for rendering.
    pub fn from_font_bytes(bytes: Vec<u8>) -> TickerResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| TickerError::raster("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| TickerError::raster("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
            ctx: None,
        })
    }

    fn layout(&mut self, text: &str, style: &TextStyle) -> TickerResult<parley::Layout<TextBrush>> {
        if !style.size_px.is_finite() || style.size_px <= 0.0 {
            return Err(TickerError::raster("text size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(style.max_width_px);
        Ok(layout)
    }
}

impl TextRasterizer for ParleyRasterizer {
    fn coverage(&mut self, text: &str, style: &TextStyle) -> TickerResult<CoverageMask> {
        let layout = self.layout(text, style)?;

        let mut w = 0.0f32;
        let mut h = 0.0f32;
        for line in layout.lines() {
            let m = line.metrics();
            w = w.max(m.advance);
            h += m.ascent + m.descent + m.leading;
        }
        let width = (w.ceil() as usize).min(usize::from(u16::MAX));
        let height = (h.ceil() as usize).min(usize::from(u16::MAX));
        if width == 0 || height == 0 {
            return Ok(CoverageMask::default());
        }

        let (w16, h16) = (width as u16, height as u16);
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w16 && ctx.height() == h16 => ctx,
            _ => vello_cpu::RenderContext::new(w16, h16),
        };
        ctx.reset();
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        // White paint, so premultiplied alpha is the coverage.
        let alpha = pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .map(|px| px[3])
            .collect();
        Ok(CoverageMask {
            width,
            height,
            alpha,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
