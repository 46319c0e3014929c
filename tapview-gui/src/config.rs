//! Viewer configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tapview_core::{
    AdbTransport, GestureConfig, ResampleFilter, SessionConfig, Size, TapError, TransportTimeouts,
};

/// Top-level configuration for the viewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Controlled device.
    pub device: DeviceConfig,
    /// Window and rendering.
    pub display: DisplayConfig,
    /// Periodic capture.
    pub stream: StreamConfig,
    /// Gesture translation.
    pub input: InputConfig,
    /// Per-command deadlines.
    pub timeouts: TimeoutConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Device settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Native screen width in pixels (portrait orientation).
    pub width: u32,
    /// Native screen height in pixels.
    pub height: u32,
    /// adb serial; empty targets adb's default device.
    pub serial: String,
    /// Path or name of the adb executable.
    pub adb_path: String,
    /// Scratch file for screen captures on the device.
    pub remote_path: String,
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Letterbox color, RGB.
    pub background: [u8; 3],
    /// Resampling filter for the scaled snapshot.
    pub filter: ResampleFilter,
}

/// Streaming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Interval between periodic captures.
    pub interval_ms: u64,
    /// Start with streaming enabled.
    pub start_streaming: bool,
}

/// Gesture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Pointer travel (viewport px) before a drag segment is sent.
    pub drag_threshold: f64,
    /// Duration of each drag swipe.
    pub drag_duration_ms: u64,
    /// Length (device px) of the swipe sent per wheel notch.
    pub scroll_distance: u32,
    /// Duration of the wheel swipe.
    pub scroll_duration_ms: u64,
}

/// Transport deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub capture_ms: u64,
    pub pull_ms: u64,
    pub cleanup_ms: u64,
    pub tap_ms: u64,
    pub swipe_ms: u64,
    pub key_ms: u64,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (overridden by `RUST_LOG`).
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 854,
            serial: String::new(),
            adb_path: "adb".into(),
            remote_path: "/sdcard/screen.png".into(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 900,
            background: [0, 0, 0],
            filter: ResampleFilter::Lanczos3,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            start_streaming: false,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        let g = GestureConfig::default();
        Self {
            drag_threshold: g.drag_threshold,
            drag_duration_ms: g.drag_duration.as_millis() as u64,
            scroll_distance: g.scroll_distance,
            scroll_duration_ms: g.scroll_duration.as_millis() as u64,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        let t = TransportTimeouts::default();
        Self {
            capture_ms: t.capture.as_millis() as u64,
            pull_ms: t.pull.as_millis() as u64,
            cleanup_ms: t.cleanup.as_millis() as u64,
            tap_ms: t.tap.as_millis() as u64,
            swipe_ms: t.swipe.as_millis() as u64,
            key_ms: t.key.as_millis() as u64,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ViewerConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    // ── Conversion into engine types ─────────────────────────────

    pub fn timeouts(&self) -> TransportTimeouts {
        let t = &self.timeouts;
        TransportTimeouts {
            capture: Duration::from_millis(t.capture_ms),
            pull: Duration::from_millis(t.pull_ms),
            cleanup: Duration::from_millis(t.cleanup_ms),
            tap: Duration::from_millis(t.tap_ms),
            swipe: Duration::from_millis(t.swipe_ms),
            key: Duration::from_millis(t.key_ms),
        }
    }

    pub fn gestures(&self) -> GestureConfig {
        GestureConfig {
            drag_threshold: self.input.drag_threshold,
            drag_duration: Duration::from_millis(self.input.drag_duration_ms),
            scroll_distance: self.input.scroll_distance,
            scroll_duration: Duration::from_millis(self.input.scroll_duration_ms),
        }
    }

    /// The adb transport described by `[device]` and `[timeouts]`.
    pub fn transport(&self) -> AdbTransport {
        AdbTransport::new(&self.device.adb_path)
            .with_serial(self.device.serial.clone())
            .with_timeouts(self.timeouts())
    }

    /// Session settings; fails on zero sizes or a zero interval.
    pub fn session_config(&self) -> Result<SessionConfig, TapError> {
        if self.stream.interval_ms == 0 {
            return Err(TapError::Other("stream.interval_ms must be positive".into()));
        }
        let resolution = Size::new(self.device.width, self.device.height)?;
        let viewport = Size::new(self.display.width, self.display.height)?;

        let mut config = SessionConfig::new(resolution, viewport);
        config.interval = Duration::from_millis(self.stream.interval_ms);
        config.gestures = self.gestures();
        config.remote_path = self.device.remote_path.clone();
        config.background = self.display.background;
        config.filter = self.display.filter;
        Ok(config)
    }
}

// ── Tests ────────────────────────────────────────────────────────
