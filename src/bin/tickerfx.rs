use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tickerfx", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the source for a while, then render one frame as a PNG.
    ///
    /// The frame is stamped with the current time since the Unix epoch.
    Frame(FrameArgs),
    /// Run the source for a while, then print the buffered lines.
    Lines(LinesArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Ticker configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Frame width in pixels.
    #[arg(long)]
    width: u32,

    /// Frame height in pixels.
    #[arg(long)]
    height: u32,

    /// How long to collect lines before rendering.
    #[arg(long, default_value_t = 1000)]
    after_ms: u64,

    /// Frame fill color (`#rrggbb`) under the ticker.
    #[arg(long, default_value = "#000000")]
    fill: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct LinesArgs {
    /// Ticker configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// How long to collect lines before printing.
    #[arg(long, default_value_t = 1000)]
    after_ms: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Lines(args) => cmd_lines(args),
    }
}

fn load_config(path: &std::path::Path) -> anyhow::Result<tickerfx::TickerConfig> {
    tickerfx::TickerConfig::from_json_path(path)
        .with_context(|| format!("load ticker config '{}'", path.display()))
}

fn start_filter(config: &tickerfx::TickerConfig, after_ms: u64) -> anyhow::Result<tickerfx::ScrollFilter> {
    let filter = tickerfx::ScrollFilter::new(config).with_context(|| "start ticker filter")?;
    std::thread::sleep(Duration::from_millis(after_ms));
    Ok(filter)
}

/// Wall-clock frame timestamp, so `%H`/`%Y` and friends show the current UTC time.
fn frame_timestamp_us(now: SystemTime) -> u64 {
    now.duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;
    let fill = tickerfx::Rgb8::parse_hex(&args.fill).with_context(|| "parse --fill")?;
    anyhow::ensure!(args.width > 0 && args.height > 0, "frame width/height must be > 0");

    let (width, height) = (args.width as usize, args.height as usize);
    let mut frame = tickerfx::RgbBitmap::filled(width, height, fill);

    let mut filter = start_filter(&config, args.after_ms)?;
    filter.apply(frame_timestamp_us(SystemTime::now()), width, height, &[], &mut frame.data);
    filter.stop();

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        args.width,
        args.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_lines(args: LinesArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;
    let mut filter = start_filter(&config, args.after_ms)?;
    filter.stop();
    for line in filter.snapshot_lines() {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/bin/tickerfx.rs"]
mod tests;
