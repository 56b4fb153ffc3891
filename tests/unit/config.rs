use super::*;

fn base() -> TickerConfig {
    TickerConfig::new("font.ttf", TickerCommand::Shell("date".to_string()))
}

#[test]
fn minimal_json_fills_defaults() {
    let cfg = TickerConfig::from_json_str(r#"{"font_path": "f.ttf", "command": "uptime"}"#).unwrap();
    assert_eq!(cfg.width, -1);
    assert_eq!(cfg.n_lines, 8);
    assert_eq!(cfg.font_size, 20);
    assert_eq!(cfg.scroll_speed, 100);
    assert_eq!(cfg.mode, TickerMode::Scroll);
    assert_eq!(cfg.fg, Rgb8::white());
    assert_eq!(cfg.bg, None);
    assert_eq!(cfg.restart_backoff(), Duration::from_millis(250));
    assert_eq!(
        cfg.command.to_source_command().unwrap(),
        SourceCommand::shell("uptime")
    );
}

#[test]
fn full_json_round_trips_fields() {
    let cfg = TickerConfig::from_json_str(
        r##"{
            "font_path": "f.ttf",
            "x": -10, "y": -30, "width": 200, "n_lines": 3, "font_size": 14,
            "command": ["tail", "-f", "/var/log/syslog"],
            "mode": "static",
            "bg": "#102030",
            "scroll_speed": 250,
            "fg": [1, 2, 3],
            "invert": true,
            "feeds": {"station": "KXYZ"},
            "restart_backoff_ms": 0
        }"##,
    )
    .unwrap();

    let g = cfg.geometry();
    assert_eq!((g.x, g.y, g.width, g.font_size, g.scroll_speed), (-10, -30, 200, 14, 250));
    assert_eq!(g.mode, TickerMode::Static);

    let style = cfg.text_style();
    assert_eq!(style.size_px, 14.0);
    assert_eq!(style.bg, Some(Rgb8::new(0x10, 0x20, 0x30)));
    assert_eq!(style.fg, Rgb8::new(1, 2, 3));
    assert!(style.invert);

    let cmd = cfg.command.to_source_command().unwrap();
    assert_eq!(cmd.program, "tail");
    assert_eq!(cmd.args, vec!["-f", "/var/log/syslog"]);
    assert_eq!(cfg.feeds.get("station").map(String::as_str), Some("KXYZ"));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = TickerConfig::from_json_str(r#"{"font_path": "f", "command": "x", "colour": 1}"#)
        .unwrap_err();
    assert!(matches!(err, TickerError::Serde(_)));
}

#[test]
fn validate_rejects_bad_font_size() {
    let mut cfg = base();
    cfg.font_size = 0;
    assert!(matches!(cfg.validate(), Err(TickerError::Validation(_))));
}

#[test]
fn validate_bounds_scroll_speed() {
    let mut cfg = base();
    cfg.scroll_speed = 0;
    assert!(cfg.validate().is_err());
    cfg.scroll_speed = MAX_SCROLL_SPEED + 1;
    assert!(cfg.validate().is_err());
    cfg.scroll_speed = MAX_SCROLL_SPEED;
    assert!(cfg.validate().is_ok());
}

#[test]
fn validate_rejects_bad_width() {
    let mut cfg = base();
    for w in [0, -2, -100] {
        cfg.width = w;
        assert!(cfg.validate().is_err(), "width {w}");
    }
    cfg.width = 1;
    assert!(cfg.validate().is_ok());
}

#[test]
fn validate_rejects_empty_commands() {
    for command in [
        TickerCommand::Shell("   ".to_string()),
        TickerCommand::Argv(vec![]),
        TickerCommand::Argv(vec![String::new(), "x".to_string()]),
    ] {
        let cfg = TickerConfig::new("f", command.clone());
        assert!(cfg.validate().is_err(), "{command:?}");
        assert!(command.to_source_command().is_err());
    }
}

#[test]
fn bad_color_is_a_serde_error() {
    let err = TickerConfig::from_json_str(r##"{"font_path": "f", "command": "x", "fg": "#zz0000"}"##)
        .unwrap_err();
    assert!(matches!(err, TickerError::Serde(_)));
}

#[test]
fn missing_file_is_reported() {
    let err = TickerConfig::from_json_path("definitely/missing/ticker.json").unwrap_err();
    assert!(err.to_string().contains("ticker.json"));
}
