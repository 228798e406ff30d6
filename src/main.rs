use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn, LevelFilter};
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

use mindwrite_stream::binarize::{self, BinarizeOptions};
use mindwrite_stream::config::Config;
use mindwrite_stream::link::{open_serial, LogStatusSink};
use mindwrite_stream::pattern;
use mindwrite_stream::scheduler::{StreamScheduler, TickOutcome};

#[derive(Parser)]
#[command(name = "mindwrite-stream")]
#[command(about = "Streams a packed 1bpp test pattern to a Pico-driven e-paper display over USB serial.", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON); flags below take precedence
    #[arg(long)]
    config: Option<String>,

    /// Serial port to the display (e.g. /dev/ttyACM0 or COM5)
    #[arg(long)]
    port: Option<String>,

    #[arg(long)]
    baud: Option<u32>,

    /// Maximum send rate offered to the display
    #[arg(long)]
    send_fps: Option<f64>,

    /// Seconds to wait for the device's "OK"
    #[arg(long)]
    ack_timeout: Option<f64>,

    /// Wire format: mwf1 or legacy
    #[arg(long)]
    protocol: Option<String>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Invert wire polarity (rare; panel quirk)
    #[arg(long)]
    invert: bool,

    /// Disable the headset mirror correction
    #[arg(long)]
    no_mirror: bool,

    /// Send a single frame and exit
    #[arg(long)]
    once: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path))?;
            serde_json::from_str(&data)
                .with_context(|| format!("failed to parse config file {}", path))?
        }
        None => Config::default(),
    };

    if let Some(port) = &cli.port {
        config.link.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        config.link.baud_rate = baud;
    }
    if let Some(fps) = cli.send_fps {
        config.link.send_fps = fps;
    }
    if let Some(timeout) = cli.ack_timeout {
        config.link.ack_timeout_secs = timeout;
    }
    if let Some(protocol) = &cli.protocol {
        config.link.protocol = protocol.clone();
    }
    if let Some(width) = cli.width {
        config.display.width = width;
    }
    if let Some(height) = cli.height {
        config.display.height = height;
    }
    if cli.invert {
        config.display.invert = true;
    }
    if cli.no_mirror {
        config.display.mirror = false;
    }

    if config.link.port.is_empty() {
        anyhow::bail!("no serial port configured (use --port or a config file)");
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        level,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let config = load_config(&cli)?;

    let frame_bytes = binarize::frame_bytes(config.display.width, config.display.height);
    let link = open_serial(&config.link, frame_bytes, Box::new(LogStatusSink))?;

    let options = BinarizeOptions {
        invert: config.display.invert,
        mirror: config.display.mirror,
    };
    let mut scheduler = StreamScheduler::new(link, options, config.link.send_interval());

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::Relaxed)) {
            warn!("could not set Ctrl-C handler: {}", e);
        }
    }

    info!(
        "streaming {}x{} test pattern at up to {} fps (Ctrl-C to stop)",
        config.display.width, config.display.height, config.link.send_fps
    );

    let started = Instant::now();
    let mut phase = 0;
    let mut canvas = pattern::test_pattern(config.display.width, config.display.height, phase);

    while running.load(Ordering::Relaxed) {
        // The pattern advances once a second; regenerate the canvas only when
        // the scene actually changes, like the real compositor would.
        let now_phase = started.elapsed().as_secs() as usize;
        if now_phase != phase {
            phase = now_phase;
            canvas = pattern::test_pattern(config.display.width, config.display.height, phase);
        }

        match scheduler.tick(&canvas, Instant::now()) {
            TickOutcome::Sent(outcome) => {
                debug!("frame sent: {:?}", outcome);
                if cli.once {
                    break;
                }
            }
            TickOutcome::Offline => {
                info!("link down, stopping");
                break;
            }
            TickOutcome::NotDue | TickOutcome::Unchanged => {}
        }

        // Render-loop cadence; the scheduler's own gate limits actual sends.
        thread::sleep(Duration::from_millis(16));
    }

    info!("stopped");
    Ok(())
}
