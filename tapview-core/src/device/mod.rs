//! Device side of the viewer: the command transport and snapshot source.
//!
//! ## Sub-modules
//!
//! | Module     | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | `adb`      | [`DeviceTransport`] backed by the `adb` executable    |
//! | `snapshot` | capture → pull → cleanup sequence producing a bitmap |
//!
//! Every transport command is bounded by a timeout and reports failure
//! with the diagnostic text the device (or the host tool) produced.

pub mod adb;
pub mod snapshot;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TapError;
use crate::geometry::DevicePoint;

pub use adb::AdbTransport;
pub use snapshot::{Bitmap, SnapshotSource};

/// Android `KEYCODE_ENTER`.
pub const KEYCODE_ENTER: u32 = 66;

// ── DeviceTransport ──────────────────────────────────────────────

/// Command/result channel to the controlled device.
///
/// Implementations own their timeouts; a command that overruns must
/// resolve to [`TapError::Timeout`] rather than hang.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Ask the device to write a screen bitmap to `remote_path`.
    async fn capture_screen(&self, remote_path: &str) -> Result<(), TapError>;

    /// Fetch the file at `remote_path` into memory.
    async fn pull_file(&self, remote_path: &str) -> Result<Vec<u8>, TapError>;

    /// Delete `remote_path` on the device.
    async fn remove_file(&self, remote_path: &str) -> Result<(), TapError>;

    /// Inject a single tap.
    async fn send_tap(&self, at: DevicePoint) -> Result<(), TapError>;

    /// Inject a swipe from `from` to `to` lasting `duration`.
    async fn send_swipe(
        &self,
        from: DevicePoint,
        to: DevicePoint,
        duration: Duration,
    ) -> Result<(), TapError>;

    /// Inject a key event by Android key code.
    async fn send_key_event(&self, code: u32) -> Result<(), TapError>;
}

// ── DeviceCommand ────────────────────────────────────────────────

/// An input command ready to be sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Tap(DevicePoint),
    Swipe {
        from: DevicePoint,
        to: DevicePoint,
        duration: Duration,
    },
    Key(u32),
}

impl DeviceCommand {
    /// Deliver this command over `transport`.
    pub async fn send<T>(&self, transport: &T) -> Result<(), TapError>
    where
        T: DeviceTransport + ?Sized,
    {
        match *self {
            DeviceCommand::Tap(at) => transport.send_tap(at).await,
            DeviceCommand::Swipe { from, to, duration } => {
                transport.send_swipe(from, to, duration).await
            }
            DeviceCommand::Key(code) => transport.send_key_event(code).await,
        }
    }
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceCommand::Tap(at) => write!(f, "tap {at}"),
            DeviceCommand::Swipe { from, to, duration } => {
                write!(f, "swipe {from} → {to} over {}ms", duration.as_millis())
            }
            DeviceCommand::Key(code) => write!(f, "keyevent {code}"),
        }
    }
}

// ── TransportTimeouts ────────────────────────────────────────────

/// Per-command deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    pub capture: Duration,
    pub pull: Duration,
    /// Shorter than the others because its result is discarded.
    pub cleanup: Duration,
    pub tap: Duration,
    pub swipe: Duration,
    pub key: Duration,
}

impl Default for TransportTimeouts {
    fn default() -> Self {
        Self {
            capture: Duration::from_secs(10),
            pull: Duration::from_secs(10),
            cleanup: Duration::from_secs(5),
            tap: Duration::from_secs(5),
            swipe: Duration::from_secs(10),
            key: Duration::from_secs(5),
        }
    }
}
