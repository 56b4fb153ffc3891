use crate::foundation::core::{BYTES_PER_PIXEL, RgbBitmap};

/// Copy `src` into the RGB frame `dst` (`dst_w` x `dst_h`), clipped to the frame.
///
/// Source pixel `(sx, sy)` for `sx >= offset_x`, `sy >= offset_y` lands at
/// `(x + sx, y + sy)`. Pixels are copied verbatim; whatever was in the frame is
/// overwritten.
///
/// Rows are visited top to bottom, so the first row at or past the bottom edge ends
/// the copy. A `dst` slice shorter than `dst_w * dst_h * 3` is treated as ending the
/// frame early.
#[allow(clippy::too_many_arguments)]
pub fn blit(
    dst: &mut [u8],
    dst_w: usize,
    dst_h: usize,
    x: i64,
    y: i64,
    src: &RgbBitmap,
    offset_x: usize,
    offset_y: usize,
) {
    if src.is_empty() || dst_w == 0 || dst_h == 0 {
        return;
    }

    // Horizontal clip is identical for every row.
    let col_start = (offset_x as i64).max(-x);
    let col_end = (src.width as i64).min(dst_w as i64 - x);
    if col_start >= col_end {
        return;
    }
    let (col_start, col_end) = (col_start as usize, col_end as usize);
    let run = (col_end - col_start) * BYTES_PER_PIXEL;

    for sy in offset_y..src.height {
        let target_y = y + sy as i64;
        if target_y >= dst_h as i64 {
            break;
        }
        if target_y < 0 {
            continue;
        }

        let target_x = (x + col_start as i64) as usize;
        let out_offset = (target_y as usize * dst_w + target_x) * BYTES_PER_PIXEL;
        let in_offset = (sy * src.width + col_start) * BYTES_PER_PIXEL;

        let Some(out) = dst.get_mut(out_offset..out_offset + run) else {
            break;
        };
        out.copy_from_slice(&src.data[in_offset..in_offset + run]);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blit.rs"]
mod tests;
