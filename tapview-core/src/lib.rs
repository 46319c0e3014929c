//! # tapview-core
//!
//! Engine of the tapview remote touch viewer: shows periodic snapshots of
//! an adb-connected device and turns pointer gestures on the picture into
//! device taps and swipes.
//!
//! This crate contains:
//! - **Geometry**: fitting the device bitmap into the viewport and mapping
//!   viewport points back to device pixels under rotation
//! - **Device**: `DeviceTransport` trait, the `adb` transport, and the
//!   capture → pull → cleanup `SnapshotSource`
//! - **View**: `DisplaySurface` (bitmap + fitted rect + composed frame) and
//!   `InputRouter` (tap / drag / scroll classification)
//! - **Session**: the `Session` controller owning rotation and the
//!   Idle/Streaming state machine
//! - **Error**: `TapError`, a `thiserror`-based error hierarchy

pub mod device;
pub mod error;
pub mod geometry;
pub mod session;
pub mod view;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use device::{
    AdbTransport, Bitmap, DeviceCommand, DeviceTransport, KEYCODE_ENTER, SnapshotSource,
    TransportTimeouts,
};
pub use error::TapError;
pub use geometry::{
    DevicePoint, DeviceResolution, FittedRect, Point, Rotation, Size, ViewportSize,
    compute_fitted_rect, device_point_to_viewport, fit_device, viewport_point_to_device,
};
pub use session::{Session, SessionConfig, SessionEvent, SessionState, StreamState, UserAction};
pub use view::{
    DisplaySurface, Frame, Gesture, GestureConfig, InputRouter, PointerEvent, ResampleFilter,
    Routed, ScrollDirection, ViewMapping,
};
