//! gesture-control - drive desktop actions from hand landmarks.
//!
//! Reads landmark records (one s-expression per line) from a file or stdin
//! and writes action events to stdout.  Logs go to stderr.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, info, warn};

use gesture_control::hand::SwipeStrategy;
use gesture_control::ipc::format_event;
use gesture_control::source::DEFAULT_FRAME_WIDTH;
use gesture_control::{
    GestureConfig, LandmarkSource, Pipeline, SexpDispatcher, SexpSource, SourceError, TickReport,
};

#[derive(Parser, Debug)]
#[command(name = "gesture-control", about = "Hand-gesture desktop control")]
struct Cli {
    /// Landmark record file (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Config plist file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Swipe strategy: hold or velocity (overrides the config file)
    #[arg(long)]
    swipe_strategy: Option<String>,

    /// Camera frame width in pixels
    #[arg(long, default_value_t = DEFAULT_FRAME_WIDTH)]
    frame_width: u32,

    /// Start with gesture mode enabled
    #[arg(long)]
    active: bool,

    /// Emit per-tick HUD status and gesture change events
    #[arg(long)]
    hud: bool,

    /// Ignore record timestamps and use the local clock
    #[arg(long)]
    wall_clock: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("gesture-control {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing; stdout carries events only.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_control=info".into()),
        )
        .init();

    info!("gesture-control v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    debug!("config: {}", config.config_sexp());

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening landmark input {}", path.display()))?;
            info!("reading landmarks from {}", path.display());
            Box::new(BufReader::new(file))
        }
        None => {
            info!("reading landmarks from stdin");
            Box::new(io::stdin().lock())
        }
    };
    let mut source = SexpSource::new(reader, cli.frame_width);

    run(&mut source, config, cli.hud, cli.wall_clock)
}

fn load_config(cli: &Cli) -> anyhow::Result<GestureConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let config = GestureConfig::from_sexp(&raw)
                .with_context(|| format!("loading config {}", path.display()))?;
            info!("config loaded from {}", path.display());
            config
        }
        None => GestureConfig::default(),
    };

    if let Some(name) = &cli.swipe_strategy {
        let Some(strategy) = SwipeStrategy::parse(name) else {
            bail!("unknown swipe strategy {:?}: use hold or velocity", name);
        };
        config.swipe_strategy = strategy;
    }
    if cli.active {
        config.start_active = true;
    }
    Ok(config)
}

fn run<S: LandmarkSource>(
    source: &mut S,
    config: GestureConfig,
    hud: bool,
    wall_clock: bool,
) -> anyhow::Result<()> {
    let mut pipeline = Pipeline::new(config, SexpDispatcher::new(io::stdout()));
    let started = Instant::now();
    let mut ticks: u64 = 0;
    let mut skipped: u64 = 0;
    let mut last_t = 0.0;

    loop {
        let sample = match source.next_sample() {
            Ok(Some(sample)) => sample,
            Ok(None) => break,
            Err(SourceError::Parse { line, reason }) => {
                warn!("skipping landmark line {}: {}", line, reason);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e).context("reading landmark input"),
        };

        let timestamp_s = match sample.timestamp_s {
            Some(t) if !wall_clock => t,
            _ => started.elapsed().as_secs_f64(),
        };

        let report = pipeline.tick(sample.frame.as_ref(), timestamp_s, source.frame_width());
        ticks += 1;
        last_t = timestamp_s;

        if hud {
            write_hud(&mut io::stdout().lock(), &report).context("writing HUD events")?;
        }
    }

    info!(
        "input ended after {} ticks ({} lines skipped, {} dispatch failures, {:.1} fps)",
        ticks,
        skipped,
        pipeline.dispatch_failures(),
        pipeline.fps(),
    );
    debug!("final status: {}", pipeline.status_sexp(last_t));
    Ok(())
}

/// Gesture change (if any) and status events for one tick.
fn write_hud<W: Write>(out: &mut W, report: &TickReport) -> io::Result<()> {
    if let Some(gesture) = report.gesture_changed {
        writeln!(
            out,
            "{}",
            format_event("gesture", &[("name", &format!(":{}", gesture.as_str()))])
        )?;
    }
    writeln!(out, "{}", report.status_sexp())
}
