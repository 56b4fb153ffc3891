use std::sync::Arc;

use proptest::prelude::*;

use super::*;
use crate::foundation::core::Rgb8;

#[test]
fn oldest_line_is_evicted_first() {
    let buf = LineBuffer::new(2);
    buf.push("A");
    buf.push("B");
    buf.push("C");
    assert_eq!(buf.texts(), vec!["B", "C"]);
    assert_eq!(buf.text_at(0).as_deref(), Some("B"));
    assert_eq!(buf.text_at(2), None);
}

#[test]
fn zero_capacity_stays_empty() {
    let buf = LineBuffer::new(0);
    buf.push("A");
    assert!(buf.is_empty());
    let mut visited = 0;
    buf.for_each_entry(|_| visited += 1);
    assert_eq!(visited, 0);
}

#[test]
fn bitmap_is_rendered_once() {
    let entry = ScrollEntry::new("hi");
    assert!(entry.bitmap().is_none());
    assert_eq!(entry.width(), 0);

    let mut calls = 0;
    let bm = entry.bitmap_or_render(|text| {
        calls += 1;
        RgbBitmap::filled(text.len() * 3, 2, Rgb8::white())
    });
    assert_eq!(bm.width, 6);
    entry.bitmap_or_render(|_| {
        calls += 1;
        RgbBitmap::empty()
    });
    assert_eq!(calls, 1);
    assert_eq!((entry.width(), entry.height()), (6, 2));
}

#[test]
fn concurrent_pushes_respect_capacity() {
    let buf = Arc::new(LineBuffer::new(8));
    let producer = {
        let buf = buf.clone();
        std::thread::spawn(move || {
            for i in 0..2_000 {
                buf.push(format!("line {i}"));
            }
        })
    };
    for _ in 0..2_000 {
        buf.with_entries(|entries| assert!(entries.len() <= 8));
    }
    producer.join().unwrap();

    let texts = buf.texts();
    assert_eq!(texts.len(), 8);
    assert_eq!(texts.last().map(String::as_str), Some("line 1999"));
}

proptest! {
    #[test]
    fn keeps_most_recent_lines_in_order(capacity in 0usize..6, count in 0usize..20) {
        let buf = LineBuffer::new(capacity);
        for i in 0..count {
            buf.push(i.to_string());
            prop_assert!(buf.len() <= capacity);
        }
        let want: Vec<String> = (count.saturating_sub(capacity)..count).map(|i| i.to_string()).collect();
        prop_assert_eq!(buf.texts(), want);
    }
}
