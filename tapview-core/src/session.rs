//! Session controller: owns rotation and streaming state, and sequences
//! capture → display surface → repaint.
//!
//! ```text
//!            toggle                      toggle / manual refresh
//!   Idle ─────────────► Streaming(next_due) ─────────────────────► Idle
//!    ▲                    │      ▲
//!    │                    └──────┘ deadline reached → capture, re-arm
//! ```
//!
//! Manual refresh always drops back to `Idle` before capturing. Streaming
//! is a cooperative deadline polled from the event loop through
//! [`Session::tick`]; nothing runs on another thread, so capture, geometry
//! and input handling are strictly serialized.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::device::{DeviceCommand, DeviceTransport, KEYCODE_ENTER, SnapshotSource};
use crate::error::TapError;
use crate::geometry::{DeviceResolution, Rotation, ViewportSize};
use crate::view::{
    DisplaySurface, Frame, GestureConfig, InputRouter, PointerEvent, ResampleFilter, ViewMapping,
};

/// Shortest streaming interval accepted.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

// ── StreamState ──────────────────────────────────────────────────

/// Whether periodic capture is armed.
///
/// The interval itself lives on the session; only the next deadline is
/// part of the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming { next_due: Instant },
}

impl StreamState {
    pub fn is_streaming(&self) -> bool {
        matches!(self, StreamState::Streaming { .. })
    }
}

/// Snapshot of the user-visible session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub streaming: bool,
    pub interval_ms: u64,
}

// ── Inputs ───────────────────────────────────────────────────────

/// Explicit user actions (bound to keys by the front end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Refresh,
    ToggleStreaming,
    Rotate,
    SendEnter,
}

/// Everything the event loop feeds into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Pointer(PointerEvent),
    Action(UserAction),
    Resize(ViewportSize),
    /// The window needs its contents drawn again.
    Expose,
}

// ── SessionConfig ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub resolution: DeviceResolution,
    pub viewport: ViewportSize,
    pub interval: Duration,
    pub gestures: GestureConfig,
    pub remote_path: String,
    pub background: [u8; 3],
    pub filter: ResampleFilter,
}

impl SessionConfig {
    /// Defaults for a device of the given resolution.
    pub fn new(resolution: DeviceResolution, viewport: ViewportSize) -> Self {
        Self {
            resolution,
            viewport,
            interval: Duration::from_millis(1000),
            gestures: GestureConfig::default(),
            remote_path: crate::device::snapshot::DEFAULT_REMOTE_PATH.to_string(),
            background: [0, 0, 0],
            filter: ResampleFilter::default(),
        }
    }
}

// ── Session ──────────────────────────────────────────────────────

/// The single owner of all mutable viewer state.
pub struct Session<T: DeviceTransport + ?Sized> {
    transport: Arc<T>,
    source: SnapshotSource<T>,
    surface: DisplaySurface,
    router: InputRouter,
    resolution: DeviceResolution,
    rotation: Rotation,
    stream: StreamState,
    interval: Duration,
}

impl<T: DeviceTransport + ?Sized> Session<T> {
    pub fn new(transport: Arc<T>, config: SessionConfig) -> Self {
        let interval = if config.interval < MIN_INTERVAL {
            warn!("streaming interval {:?} too small; using {MIN_INTERVAL:?}", config.interval);
            MIN_INTERVAL
        } else {
            config.interval
        };

        let source =
            SnapshotSource::new(Arc::clone(&transport)).with_remote_path(config.remote_path);
        let surface = DisplaySurface::new(config.resolution, config.viewport)
            .with_background(config.background)
            .with_filter(config.filter);

        Self {
            transport,
            source,
            surface,
            router: InputRouter::new(config.gestures),
            resolution: config.resolution,
            rotation: Rotation::Deg0,
            stream: StreamState::Idle,
            interval,
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn stream_state(&self) -> StreamState {
        self.stream
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            streaming: self.stream.is_streaming(),
            interval_ms: self.interval.as_millis() as u64,
        }
    }

    pub fn surface(&self) -> &DisplaySurface {
        &self.surface
    }

    /// When the next periodic capture is due, if streaming.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.stream {
            StreamState::Idle => None,
            StreamState::Streaming { next_due } => Some(next_due),
        }
    }

    fn mapping(&self) -> ViewMapping {
        ViewMapping {
            rect: self.surface.fitted_rect(),
            resolution: self.resolution,
            rotation: self.rotation,
        }
    }

    // ── Event entry point ────────────────────────────────────────

    /// Apply one event from the event loop.
    pub async fn handle(&mut self, event: SessionEvent, now: Instant) {
        match event {
            SessionEvent::Pointer(pointer) => self.handle_pointer(pointer).await,
            SessionEvent::Action(action) => self.handle_action(action, now).await,
            SessionEvent::Resize(viewport) => {
                self.surface.resize(viewport);
            }
            SessionEvent::Expose => self.surface.invalidate(),
        }
    }

    pub async fn handle_action(&mut self, action: UserAction, now: Instant) {
        match action {
            UserAction::Refresh => {
                self.manual_refresh().await;
            }
            UserAction::ToggleStreaming => self.toggle_streaming(now),
            UserAction::Rotate => self.rotate(),
            UserAction::SendEnter => {
                if let Err(e) = self.send(DeviceCommand::Key(KEYCODE_ENTER)).await {
                    warn!("failed to send Enter key: {e}");
                }
            }
        }
    }

    /// Route a pointer event, send any resulting command, refresh if asked.
    pub async fn handle_pointer(&mut self, event: PointerEvent) {
        let mapping = self.mapping();
        let routed = self.router.handle(event, &mapping);
        let mut refresh = routed.refresh;

        if let Some(gesture) = routed.gesture {
            let command = self.router.command_for(&gesture, self.resolution);
            match self.send(command).await {
                Ok(()) => refresh |= gesture.refreshes_view(),
                Err(e) => warn!("failed to send {command}: {e}"),
            }
        }

        if refresh {
            self.refresh().await;
        }
    }

    async fn send(&self, command: DeviceCommand) -> Result<(), TapError> {
        debug!("sending {command}");
        command.send(self.transport.as_ref()).await
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Single-shot capture outside the periodic schedule.
    ///
    /// On failure the error is logged and the previous bitmap stays.
    pub async fn refresh(&mut self) -> bool {
        match self.source.capture().await {
            Ok(bitmap) => {
                self.surface.set_bitmap(bitmap);
                debug!("snapshot updated");
                true
            }
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }

    /// Refresh requested by the user. Disarms streaming first.
    pub async fn manual_refresh(&mut self) -> bool {
        if self.stream.is_streaming() {
            self.stream = StreamState::Idle;
            info!("streaming off due to manual refresh");
        }
        self.refresh().await
    }

    pub fn toggle_streaming(&mut self, now: Instant) {
        if self.stream.is_streaming() {
            self.stop_streaming();
        } else {
            self.start_streaming(now);
        }
    }

    /// Arm periodic capture; the first one is due one interval from `now`.
    pub fn start_streaming(&mut self, now: Instant) {
        self.stream = StreamState::Streaming {
            next_due: now + self.interval,
        };
        info!("streaming on, interval {} ms", self.interval.as_millis());
    }

    pub fn stop_streaming(&mut self) {
        if self.stream.is_streaming() {
            self.stream = StreamState::Idle;
            info!("streaming off");
        }
    }

    /// Change the streaming interval. Takes effect at the next re-arm.
    pub fn set_interval(&mut self, interval: Duration) -> Result<(), TapError> {
        if interval < MIN_INTERVAL {
            return Err(TapError::Other(format!(
                "streaming interval must be at least {MIN_INTERVAL:?}"
            )));
        }
        self.interval = interval;
        Ok(())
    }

    /// Rotate the view 90° further and refit.
    pub fn rotate(&mut self) {
        self.rotation = self.rotation.next();
        self.surface.set_rotation(self.rotation);
        info!("rotated view to {}", self.rotation);
    }

    /// Run the periodic capture if its deadline has passed.
    ///
    /// Returns `true` if a capture was attempted.
    pub async fn tick(&mut self, now: Instant) -> bool {
        let StreamState::Streaming { next_due } = self.stream else {
            return false;
        };
        if now < next_due {
            return false;
        }

        self.refresh().await;
        self.stream = StreamState::Streaming {
            next_due: now + self.interval,
        };
        true
    }

    /// Compose the frame to show, if anything changed since the last one.
    pub fn frame_if_dirty(&mut self) -> Option<Frame<'_>> {
        if self.surface.needs_repaint() {
            Some(self.surface.repaint())
        } else {
            None
        }
    }
}
