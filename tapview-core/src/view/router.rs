//! Input router: turns viewport pointer events into device gestures.
//!
//! ```text
//!            press inside rect              release (no drag)
//!   Idle ─────────────────────► Pressed ──────────────────────► Idle + Tap
//!    │                           │  ▲
//!    │ press outside rect        │  │ move ≥ threshold → Drag(last, now)
//!    ▼                           └──┘ move < threshold → ignored
//!  Dropped ── release ──► Idle (refresh only)
//! ```
//!
//! The router only stores viewport positions. Device coordinates are
//! derived at the moment a gesture is emitted, from the [`ViewMapping`]
//! passed with each event, so a rotation between press and release never
//! leaks stale device coordinates into a command.

use std::time::Duration;

use tracing::debug;

use crate::device::DeviceCommand;
use crate::geometry::{
    DevicePoint, DeviceResolution, FittedRect, Point, Rotation, viewport_point_to_device,
};

// ── Config ───────────────────────────────────────────────────────

/// Gesture thresholds and the fixed parameters of synthesized swipes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Minimum pointer travel, in viewport pixels, before a drag segment
    /// is emitted.
    pub drag_threshold: f64,
    /// Swipe duration for each drag segment.
    pub drag_duration: Duration,
    /// Length, in device pixels, of the vertical swipe a wheel notch sends.
    pub scroll_distance: u32,
    pub scroll_duration: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 5.0,
            drag_duration: Duration::from_millis(300),
            scroll_distance: 150,
            scroll_duration: Duration::from_millis(150),
        }
    }
}

// ── Events and gestures ──────────────────────────────────────────

/// Primary-button pointer input in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press(Point),
    Move(Point),
    Release(Point),
    /// Wheel rotation; positive `delta` is away from the user.
    Wheel { at: Point, delta: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// A classified pointer interaction in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap(DevicePoint),
    Drag { from: DevicePoint, to: DevicePoint },
    Scroll {
        direction: ScrollDirection,
        magnitude: u32,
    },
}

impl Gesture {
    /// Taps and drags change what is on screen, so they ask for a refresh.
    pub fn refreshes_view(&self) -> bool {
        matches!(self, Gesture::Tap(_) | Gesture::Drag { .. })
    }
}

/// What the router decided for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Routed {
    pub gesture: Option<Gesture>,
    /// A release ended a press: refresh the bitmap even if nothing was sent.
    pub refresh: bool,
}

/// Geometry needed to resolve viewport points, borrowed from the display
/// surface and session for the duration of one event.
#[derive(Debug, Clone, Copy)]
pub struct ViewMapping {
    /// `None` until a bitmap is shown; every point is then out of bounds.
    pub rect: Option<FittedRect>,
    pub resolution: DeviceResolution,
    pub rotation: Rotation,
}

impl ViewMapping {
    pub fn to_device(&self, p: Point) -> Option<DevicePoint> {
        let rect = self.rect.as_ref()?;
        viewport_point_to_device(p, rect, self.resolution, self.rotation)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.rect.is_some_and(|r| r.contains(p))
    }
}

// ── Router ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum PressState {
    Idle,
    Pressed {
        origin: Point,
        last: Point,
        dragged: bool,
    },
    /// Press landed outside the image; swallow until release.
    Dropped,
}

/// Press/move/release state machine plus wheel translation.
#[derive(Debug, Clone)]
pub struct InputRouter {
    config: GestureConfig,
    state: PressState,
}

impl InputRouter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: PressState::Idle,
        }
    }

    /// Whether a press is in progress.
    pub fn is_pressed(&self) -> bool {
        !matches!(self.state, PressState::Idle)
    }

    /// Handle one pointer event.
    pub fn handle(&mut self, event: PointerEvent, mapping: &ViewMapping) -> Routed {
        match event {
            PointerEvent::Press(at) => {
                self.state = if mapping.contains(at) {
                    PressState::Pressed {
                        origin: at,
                        last: at,
                        dragged: false,
                    }
                } else {
                    debug!("press at {at:?} outside image, dropped");
                    PressState::Dropped
                };
                Routed::default()
            }
            PointerEvent::Move(at) => self.on_move(at, mapping),
            PointerEvent::Release(_) => self.on_release(mapping),
            PointerEvent::Wheel { at, delta } => Routed {
                gesture: self.on_wheel(at, delta, mapping),
                refresh: false,
            },
        }
    }

    fn on_move(&mut self, at: Point, mapping: &ViewMapping) -> Routed {
        let PressState::Pressed { last, dragged, .. } = &mut self.state else {
            return Routed::default();
        };
        if last.distance_to(at) < self.config.drag_threshold {
            return Routed::default();
        }
        // Past the threshold this press is no longer a tap.
        *dragged = true;

        match (mapping.to_device(*last), mapping.to_device(at)) {
            (Some(from), Some(to)) => {
                *last = at;
                Routed {
                    gesture: Some(Gesture::Drag { from, to }),
                    refresh: false,
                }
            }
            _ => {
                debug!("drag segment to {at:?} leaves the image, dropped");
                Routed::default()
            }
        }
    }

    fn on_release(&mut self, mapping: &ViewMapping) -> Routed {
        let state = std::mem::replace(&mut self.state, PressState::Idle);
        match state {
            PressState::Idle => Routed::default(),
            PressState::Dropped => Routed {
                gesture: None,
                refresh: true,
            },
            PressState::Pressed { dragged: true, .. } => Routed {
                gesture: None,
                refresh: true,
            },
            PressState::Pressed { origin, .. } => Routed {
                gesture: mapping.to_device(origin).map(Gesture::Tap),
                refresh: true,
            },
        }
    }

    fn on_wheel(&self, at: Point, delta: i32, mapping: &ViewMapping) -> Option<Gesture> {
        if delta == 0 || !mapping.contains(at) {
            return None;
        }
        let direction = if delta > 0 {
            ScrollDirection::Up
        } else {
            ScrollDirection::Down
        };
        Some(Gesture::Scroll {
            direction,
            magnitude: self.config.scroll_distance,
        })
    }

    /// The device command that performs `gesture`.
    ///
    /// A scroll becomes a vertical swipe of `magnitude` pixels through the
    /// device's center; scrolling up drags the content downward.
    pub fn command_for(&self, gesture: &Gesture, resolution: DeviceResolution) -> DeviceCommand {
        match *gesture {
            Gesture::Tap(at) => DeviceCommand::Tap(at),
            Gesture::Drag { from, to } => DeviceCommand::Swipe {
                from,
                to,
                duration: self.config.drag_duration,
            },
            Gesture::Scroll {
                direction,
                magnitude,
            } => {
                let x = (resolution.width() / 2) as i32;
                let mid = (resolution.height() / 2) as i32;
                let half = (magnitude / 2) as i32;
                let max_y = resolution.height() as i32 - 1;
                let upper = (mid - half).clamp(0, max_y);
                let lower = (mid + half).clamp(0, max_y);
                let (start, end) = match direction {
                    ScrollDirection::Up => (upper, lower),
                    ScrollDirection::Down => (lower, upper),
                };
                DeviceCommand::Swipe {
                    from: DevicePoint::new(x, start),
                    to: DevicePoint::new(x, end),
                    duration: self.config.scroll_duration,
                }
            }
        }
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

// ── Tests ────────────────────────────────────────────────────────
