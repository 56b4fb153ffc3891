use std::time::{Duration, Instant};

use super::*;
use crate::config::TickerCommand;
use crate::test_support::{ByteRasterizer, FakeSpawner};
use crate::ticker::telemetry::NoopCpuTracker;

fn config() -> TickerConfig {
    let mut cfg = TickerConfig::new("unused.ttf", TickerCommand::Shell("fake".to_string()));
    cfg.n_lines = 4;
    cfg.scroll_speed = 10;
    cfg.restart_backoff_ms = 0;
    cfg
}

fn filter(cfg: &TickerConfig, spawner: &FakeSpawner) -> ScrollFilter {
    ScrollFilter::with_parts(
        cfg,
        Box::new(spawner.clone()),
        Box::new(ByteRasterizer::new(1)),
        Box::new(FeedExpander::new()),
        Box::new(NoopCpuTracker),
    )
    .unwrap()
}

fn wait_for_lines(f: &ScrollFilter, n: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while f.snapshot_lines().len() < n {
        assert!(Instant::now() < deadline, "lines never arrived");
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn lines_from_the_source_are_drawn() {
    let spawner = FakeSpawner::default();
    let tx = spawner.add_feed();
    let mut f = filter(&config(), &spawner);

    tx.send(b"AB\n".to_vec()).unwrap();
    wait_for_lines(&f, 1);
    assert_eq!(f.snapshot_lines(), vec!["AB".to_string()]);

    let mut frame = vec![0u8; 6 * 3];
    f.apply(0, 6, 1, &[], &mut frame);
    let reds: Vec<u8> = frame.chunks(3).map(|px| px[0]).collect();
    assert_eq!(reds, b"AABBAA".to_vec());

    f.apply(300_000, 6, 1, &[], &mut frame);
    assert_eq!(f.scroll_position(), 3);
}

#[test]
fn short_or_empty_frames_are_left_untouched() {
    let spawner = FakeSpawner::default();
    let tx = spawner.add_feed();
    let mut f = filter(&config(), &spawner);
    tx.send(b"AB\n".to_vec()).unwrap();
    wait_for_lines(&f, 1);

    let mut short = vec![7u8; 5];
    f.apply(0, 2, 1, &[], &mut short);
    assert_eq!(short, vec![7u8; 5]);

    let mut empty: Vec<u8> = Vec::new();
    f.apply(0, 0, 0, &[], &mut empty);
    assert_eq!(f.scroll_position(), 0);
}

#[test]
fn stop_is_idempotent_and_kills_the_source() {
    let spawner = FakeSpawner::default();
    let _tx = spawner.add_feed();
    let mut f = filter(&config(), &spawner);
    assert!(f.is_running());

    f.stop();
    f.stop();
    assert!(!f.is_running());
    assert_eq!(spawner.terminate_count(), 1);
    drop(f);
    assert_eq!(spawner.terminate_count(), 1);
}

#[test]
fn drop_stops_the_poll_thread() {
    let spawner = FakeSpawner::default();
    let _tx = spawner.add_feed();
    let f = filter(&config(), &spawner);
    drop(f);
    assert_eq!(spawner.terminate_count(), 1);
}

#[test]
fn invalid_config_is_rejected_before_spawning() {
    let spawner = FakeSpawner::default();
    let mut cfg = config();
    cfg.scroll_speed = 0;
    let err = ScrollFilter::with_parts(
        &cfg,
        Box::new(spawner.clone()),
        Box::new(ByteRasterizer::new(1)),
        Box::new(FeedExpander::new()),
        Box::new(NoopCpuTracker),
    )
    .unwrap_err();
    assert!(matches!(err, TickerError::Validation(_)));
    assert_eq!(spawner.spawn_count(), 0);
}

#[test]
fn missing_font_fails_construction() {
    let err = ScrollFilter::new(&config()).unwrap_err();
    assert!(matches!(err, TickerError::Raster(_)));
}
