use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{TickerError, TickerResult};
use crate::render::text::TextStyle;
use crate::source::pty::SourceCommand;
use crate::ticker::compositor::{TickerGeometry, TickerMode};

/// Upper bound for `scroll_speed`; the per-pixel step must stay at least 1 µs.
pub const MAX_SCROLL_SPEED: i64 = 1_000_000;

/// Process that produces ticker lines.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum TickerCommand {
    /// Command line run through `/bin/sh -c`.
    Shell(String),
    /// Program followed by its arguments, executed directly.
    Argv(Vec<String>),
}

impl TickerCommand {
    fn is_empty(&self) -> bool {
        match self {
            Self::Shell(line) => line.trim().is_empty(),
            Self::Argv(argv) => argv.first().is_none_or(|p| p.is_empty()),
        }
    }

    /// Resolve into the program/args pair handed to the spawner.
    pub fn to_source_command(&self) -> TickerResult<SourceCommand> {
        if self.is_empty() {
            return Err(TickerError::validation("command must be non-empty"));
        }
        match self {
            Self::Shell(line) => Ok(SourceCommand::shell(line.clone())),
            Self::Argv(argv) => SourceCommand::from_argv(argv)
                .ok_or_else(|| TickerError::validation("command must be non-empty")),
        }
    }
}

/// Everything needed to build a [`crate::ScrollFilter`].
///
/// Loaded from JSON; fields other than `font_path` and `command` have defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TickerConfig {
    /// TrueType/OpenType font used for every line.
    pub font_path: PathBuf,
    /// Left edge in pixels; negative counts back from the right edge.
    #[serde(default)]
    pub x: i32,
    /// Top edge in pixels; negative counts back from the bottom edge.
    #[serde(default)]
    pub y: i32,
    /// Ticker width in pixels, `-1` for the full frame width.
    #[serde(default = "default_width")]
    pub width: i32,
    /// Line buffer capacity.
    #[serde(default = "default_n_lines")]
    pub n_lines: usize,
    /// Font size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: i32,
    /// Text source command.
    pub command: TickerCommand,
    /// Scrolling strip or stacked static lines.
    #[serde(default)]
    pub mode: TickerMode,
    /// Fill behind the glyphs; transparent when unset.
    #[serde(default)]
    pub bg: Option<Rgb8>,
    /// Pixels per second in scroll mode.
    #[serde(default = "default_scroll_speed")]
    pub scroll_speed: i64,
    /// Glyph color.
    #[serde(default = "default_fg")]
    pub fg: Rgb8,
    /// Paint glyphs as the inverse of the pixels beneath them instead of `fg`.
    #[serde(default)]
    pub invert: bool,
    /// `$name$` placeholders and the text they expand to.
    #[serde(default)]
    pub feeds: BTreeMap<String, String>,
    /// Minimum spacing between two spawns of the source process.
    #[serde(default = "default_restart_backoff_ms")]
    pub restart_backoff_ms: u64,
}

fn default_width() -> i32 {
    -1
}

fn default_n_lines() -> usize {
    8
}

fn default_font_size() -> i32 {
    20
}

fn default_scroll_speed() -> i64 {
    100
}

fn default_fg() -> Rgb8 {
    Rgb8::white()
}

fn default_restart_backoff_ms() -> u64 {
    250
}

impl TickerConfig {
    /// Config with defaults for everything but the font and the command.
    pub fn new(font_path: impl Into<PathBuf>, command: TickerCommand) -> Self {
        Self {
            font_path: font_path.into(),
            x: 0,
            y: 0,
            width: default_width(),
            n_lines: default_n_lines(),
            font_size: default_font_size(),
            command,
            mode: TickerMode::default(),
            bg: None,
            scroll_speed: default_scroll_speed(),
            fg: default_fg(),
            invert: false,
            feeds: BTreeMap::new(),
            restart_backoff_ms: default_restart_backoff_ms(),
        }
    }

    /// Parse a JSON document and validate it.
    pub fn from_json_str(s: &str) -> TickerResult<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| TickerError::serde(format!("ticker config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_path(path: impl AsRef<Path>) -> TickerResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            TickerError::serde(format!("failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    /// Reject values the filter cannot run with.
    pub fn validate(&self) -> TickerResult<()> {
        if self.font_size <= 0 {
            return Err(TickerError::validation("font_size must be > 0"));
        }
        if self.scroll_speed <= 0 || self.scroll_speed > MAX_SCROLL_SPEED {
            return Err(TickerError::validation(format!(
                "scroll_speed must be in 1..={MAX_SCROLL_SPEED}"
            )));
        }
        if self.width == 0 || self.width < -1 {
            return Err(TickerError::validation(
                "width must be > 0, or -1 for the full frame width",
            ));
        }
        if self.command.is_empty() {
            return Err(TickerError::validation("command must be non-empty"));
        }
        Ok(())
    }

    /// Placement and motion; call after [`Self::validate`].
    pub fn geometry(&self) -> TickerGeometry {
        TickerGeometry {
            x: self.x,
            y: self.y,
            width: self.width,
            font_size: self.font_size.max(1) as u32,
            scroll_speed: self.scroll_speed.clamp(1, MAX_SCROLL_SPEED) as u32,
            mode: self.mode,
        }
    }

    /// Text styling shared by every line.
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            size_px: self.font_size.max(1) as f32,
            fg: self.fg,
            bg: self.bg,
            invert: self.invert,
            max_width_px: None,
        }
    }

    /// `restart_backoff_ms` as a duration.
    pub fn restart_backoff(&self) -> Duration {
        Duration::from_millis(self.restart_backoff_ms)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
