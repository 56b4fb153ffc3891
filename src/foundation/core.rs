use crate::foundation::error::{TickerError, TickerResult};

/// Bytes per pixel of every frame and bitmap handled by the filter (interleaved RGB).
pub const BYTES_PER_PIXEL: usize = 3;

/// Straight (opaque) RGB8 color.
///
/// Deserializes from either `[r, g, b]` or a `"#rrggbb"` hex string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RgbRepr", into = "[u8; 3]")]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Opaque black.
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Opaque white.
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Per-channel inversion (`255 - c`).
    pub const fn inverted(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Channels as an array in `r, g, b` order.
    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Parse `#rrggbb` (leading `#` optional).
    pub fn parse_hex(s: &str) -> TickerResult<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(TickerError::validation(format!(
                "color '{s}' must have the form #rrggbb"
            )));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| TickerError::validation(format!("color '{s}' is not valid hex")))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<Rgb8> for [u8; 3] {
    fn from(c: Rgb8) -> Self {
        c.to_array()
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RgbRepr {
    Array([u8; 3]),
    Hex(String),
}

impl TryFrom<RgbRepr> for Rgb8 {
    type Error = TickerError;

    fn try_from(value: RgbRepr) -> Result<Self, Self::Error> {
        match value {
            RgbRepr::Array([r, g, b]) => Ok(Self::new(r, g, b)),
            RgbRepr::Hex(s) => Self::parse_hex(&s),
        }
    }
}

/// Owned, tightly packed RGB8 pixel buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RgbBitmap {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Row-major pixel bytes, `width * height * 3` long.
    pub data: Vec<u8>,
}

impl RgbBitmap {
    /// Bitmap of the given size filled with one color.
    pub fn filled(width: usize, height: usize, color: Rgb8) -> Self {
        let mut data = Vec::with_capacity(width * height * BYTES_PER_PIXEL);
        for _ in 0..width * height {
            data.extend_from_slice(&color.to_array());
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Zero-sized bitmap; blitting it is a no-op.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap existing bytes, checking the length against the dimensions.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> TickerResult<Self> {
        if data.len() != width * height * BYTES_PER_PIXEL {
            return Err(TickerError::raster(format!(
                "bitmap byte len {} does not match {width}x{height} rgb",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// True when the bitmap has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel at `(x, y)`, if inside the bitmap.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * BYTES_PER_PIXEL;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }
}

/// Mutable view over a caller-owned RGB frame.
#[derive(Debug)]
pub struct FrameMut<'a> {
    /// Row-major pixel bytes; at least `width * height * 3` long.
    pub data: &'a mut [u8],
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl<'a> FrameMut<'a> {
    /// Wrap a frame buffer, rejecting buffers too short for the dimensions.
    pub fn new(data: &'a mut [u8], width: usize, height: usize) -> TickerResult<Self> {
        let need = width
            .checked_mul(height)
            .and_then(|px| px.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| TickerError::validation("frame dimensions overflow"))?;
        if data.len() < need {
            return Err(TickerError::validation(format!(
                "frame buffer holds {} bytes, {width}x{height} rgb needs {need}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Pixel at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * BYTES_PER_PIXEL;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }
}

/// Resolve a configured coordinate against a frame extent.
///
/// Negative positions are measured back from the right (or bottom) edge.
pub fn resolve_edge_relative(pos: i32, extent: usize) -> i64 {
    let pos = i64::from(pos);
    if pos < 0 { pos + extent as i64 } else { pos }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
