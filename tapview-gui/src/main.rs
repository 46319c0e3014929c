//! tapview: entry point.
//!
//! ```text
//! tapview                        View the default adb device
//! tapview --config <path>        Use custom config TOML
//! tapview --serial <serial>      Pick a device when several are attached
//! tapview --stream               Start with periodic capture on
//! tapview --gen-config           Dump default config and exit
//! tapview --init-config          Write default config to --config and exit
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tapview_core::{Session, SessionEvent, Size};

use tapview_gui::config::ViewerConfig;
use tapview_gui::display::DisplayRenderer;
use tapview_gui::input::translate_event;
use tapview_gui::window::{NativeWindow, WindowEvent};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tapview", about = "Remote touch viewer for adb-connected devices")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "tapview.toml")]
    config: PathBuf,

    /// adb device serial (overrides config).
    #[arg(short, long)]
    serial: Option<String>,

    /// Start with streaming enabled.
    #[arg(long)]
    stream: bool,

    /// Streaming interval in milliseconds (overrides config).
    #[arg(short, long)]
    interval: Option<u64>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Write the default configuration to the --config path and exit.
    #[arg(long)]
    init_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ViewerConfig::default())?;
        println!("{text}");
        return Ok(());
    }
    if cli.init_config {
        ViewerConfig::write_default(&cli.config)?;
        println!("wrote {}", cli.config.display());
        return Ok(());
    }

    let mut config = ViewerConfig::load(&cli.config);
    if let Some(serial) = cli.serial {
        config.device.serial = serial;
    }
    if cli.stream {
        config.stream.start_streaming = true;
    }
    if let Some(ms) = cli.interval {
        config.stream.interval_ms = ms;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("tapview v{}", env!("CARGO_PKG_VERSION"));

    let session_config = config.session_config()?;
    info!(
        "device {} via {}",
        session_config.resolution,
        if config.device.serial.is_empty() {
            "default adb device"
        } else {
            config.device.serial.as_str()
        },
    );

    // ── 1. Create the window ────────────────────────────────────

    let window = NativeWindow::create(
        "tapview",
        config.display.width,
        config.display.height,
    )?;
    let mut renderer = DisplayRenderer::new(
        window.hwnd(),
        config.display.width,
        config.display.height,
    );

    // ── 2. Start the session ────────────────────────────────────

    let transport = Arc::new(config.transport());
    let mut session = Session::new(transport, session_config);

    let (cw, ch) = window.client_size();
    renderer.resize(cw, ch);
    if let Ok(viewport) = Size::new(cw, ch) {
        session.handle(SessionEvent::Resize(viewport), Instant::now()).await;
    }

    if !session.refresh().await {
        warn!("initial snapshot failed; press R to retry");
    }
    if config.stream.start_streaming {
        session.start_streaming(Instant::now());
    }

    // ── 3. Event loop ───────────────────────────────────────────

    'running: loop {
        for ev in window.poll_events() {
            match ev {
                WindowEvent::Close => break 'running,
                WindowEvent::Resize(w, h) => renderer.resize(w, h),
                _ => {}
            }

            if let Some(event) = translate_event(&ev) {
                session.handle(event, Instant::now()).await;
            }
        }

        session.tick(Instant::now()).await;

        if let Some(frame) = session.frame_if_dirty() {
            if let Err(e) = renderer.render(&frame) {
                warn!("render error: {e}");
            }
        }

        // Yield briefly so the loop does not spin.
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // ── 4. Shutdown ─────────────────────────────────────────────

    info!("shutting down");
    drop(session);
    drop(window);

    Ok(())
}
