use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

use super::*;
use crate::foundation::core::Rgb8;
use crate::test_support::ByteRasterizer;
use crate::text::expand::FeedExpander;

fn style() -> TextStyle {
    TextStyle {
        size_px: 5.0,
        fg: Rgb8::white(),
        bg: None,
        invert: false,
        max_width_px: None,
    }
}

fn geometry(mode: TickerMode) -> TickerGeometry {
    TickerGeometry {
        x: 0,
        y: 0,
        width: -1,
        font_size: 5,
        scroll_speed: 10,
        mode,
    }
}

fn compositor(geometry: TickerGeometry, height: usize) -> (ScrollCompositor, Arc<AtomicUsize>) {
    let rasterizer = ByteRasterizer::new(height);
    let calls = rasterizer.calls.clone();
    let c = ScrollCompositor::new(
        geometry,
        style(),
        Box::new(rasterizer),
        Box::new(FeedExpander::new()),
    );
    (c, calls)
}

fn row(buf: &[u8], width: usize, y: usize) -> Vec<u8> {
    (0..width).map(|x| buf[(y * width + x) * 3]).collect()
}

fn run(c: &mut ScrollCompositor, lines: &LineBuffer, ts: u64, w: usize, h: usize) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 3];
    let mut frame = FrameMut::new(&mut buf, w, h).unwrap();
    c.composite(lines, ts, &mut frame);
    buf
}

#[test]
fn scroll_offset_follows_timestamp() {
    assert_eq!(scroll_offset(0, 10, 4), 0);
    assert_eq!(scroll_offset(300_000, 10, 4), 3);
    assert_eq!(scroll_offset(400_000, 10, 4), 0);
    assert_eq!(scroll_offset(123, 10, 0), 0);
    assert_eq!(scroll_offset(5, 1_000_000, 7), 5);
}

#[test]
fn scrolling_tiles_entries_across_the_ticker() {
    let lines = LineBuffer::new(4);
    lines.push("AB");
    lines.push("CD");
    let (mut c, _) = compositor(geometry(TickerMode::Scroll), 2);

    let buf = run(&mut c, &lines, 0, 10, 2);
    assert_eq!(row(&buf, 10, 0), b"AABBCCDDAA".to_vec());
    assert_eq!(row(&buf, 10, 1), b"AABBCCDDAA".to_vec());
    assert_eq!(c.scroll_position(), 0);
}

#[test]
fn scroll_offset_shifts_the_first_entry_left() {
    let lines = LineBuffer::new(4);
    lines.push("AB");
    lines.push("CD");
    let (mut c, _) = compositor(geometry(TickerMode::Scroll), 1);

    run(&mut c, &lines, 300_000, 10, 1);
    assert_eq!(c.scroll_position(), 3);

    let buf = run(&mut c, &lines, 300_000, 10, 1);
    assert_eq!(row(&buf, 10, 0), b"BCCDDAABBC".to_vec());
}

#[test]
fn bitmaps_are_rasterized_once() {
    let lines = LineBuffer::new(4);
    lines.push("AB");
    let (mut c, calls) = compositor(geometry(TickerMode::Scroll), 1);

    run(&mut c, &lines, 0, 8, 1);
    run(&mut c, &lines, 100_000, 8, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    lines.push("CD");
    run(&mut c, &lines, 200_000, 8, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    lines.with_entries(|e| assert!(e.iter().all(|e| e.bitmap().is_some())));
}

#[test]
fn empty_buffer_draws_nothing_and_keeps_offset() {
    let lines = LineBuffer::new(4);
    lines.push("AB");
    let (mut c, _) = compositor(geometry(TickerMode::Scroll), 1);
    run(&mut c, &lines, 100_000, 8, 1);
    assert_eq!(c.scroll_position(), 1);

    lines.clear();
    let buf = run(&mut c, &lines, 200_000, 8, 1);
    assert!(buf.iter().all(|b| *b == 0));
    assert_eq!(c.scroll_position(), 1);
}

#[test]
fn zero_capacity_buffer_draws_nothing() {
    let lines = LineBuffer::new(0);
    lines.push("AB");
    let (mut c, calls) = compositor(geometry(TickerMode::Scroll), 1);
    let buf = run(&mut c, &lines, 0, 8, 1);
    assert!(buf.iter().all(|b| *b == 0));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn zero_width_entries_do_not_stall() {
    let lines = LineBuffer::new(4);
    lines.push("");
    let (mut c, _) = compositor(geometry(TickerMode::Scroll), 1);
    let buf = run(&mut c, &lines, 0, 8, 1);
    assert!(buf.iter().all(|b| *b == 0));
    assert_eq!(c.scroll_position(), 0);
}

#[test]
fn negative_position_is_relative_to_far_edges() {
    let lines = LineBuffer::new(4);
    lines.push("AB");
    let (mut c, _) = compositor(
        TickerGeometry {
            x: -3,
            y: -1,
            ..geometry(TickerMode::Scroll)
        },
        1,
    );
    let buf = run(&mut c, &lines, 0, 8, 3);
    assert_eq!(row(&buf, 8, 0), vec![0; 8]);
    assert_eq!(row(&buf, 8, 1), vec![0; 8]);
    assert_eq!(row(&buf, 8, 2), b"\0\0\0\0\0AAB".to_vec());
}

#[test]
fn ticker_width_limits_the_strip() {
    let lines = LineBuffer::new(4);
    lines.push("A");
    let (mut c, _) = compositor(
        TickerGeometry {
            width: 4,
            ..geometry(TickerMode::Scroll)
        },
        1,
    );
    let buf = run(&mut c, &lines, 0, 8, 1);
    assert_eq!(row(&buf, 8, 0), b"AAAA\0\0\0\0".to_vec());
}

#[test]
fn static_mode_splits_on_escaped_newline() {
    let lines = LineBuffer::new(4);
    lines.push("L1\\nL2");
    let (mut c, calls) = compositor(geometry(TickerMode::Static), 1);

    let buf = run(&mut c, &lines, 0, 4, 8);
    assert_eq!(row(&buf, 4, 0), b"LL11".to_vec());
    for y in 1..6 {
        assert_eq!(row(&buf, 4, y), vec![0; 4]);
    }
    assert_eq!(row(&buf, 4, 6), b"LL22".to_vec());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Static mode never caches.
    run(&mut c, &lines, 0, 4, 8);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    lines.with_entries(|e| assert!(e[0].bitmap().is_none()));
}

#[test]
fn static_mode_stacks_entries_and_prefers_real_newlines() {
    let lines = LineBuffer::new(4);
    lines.push("a\\nb\nc");
    lines.push("d");
    let (mut c, _) = compositor(geometry(TickerMode::Static), 1);

    let buf = run(&mut c, &lines, 0, 8, 13);
    assert_eq!(&row(&buf, 8, 0)[..6], b"aa\\\\nn");
    assert_eq!(&row(&buf, 8, 6)[..2], b"cc");
    assert_eq!(&row(&buf, 8, 12)[..2], b"dd");
}

proptest! {
    #[test]
    fn scroll_offset_stays_within_head_width(ts in any::<u64>(), speed in 1u32..=1_000_000, width in 1usize..5_000) {
        prop_assert!(scroll_offset(ts, speed, width) < width);
    }
}
