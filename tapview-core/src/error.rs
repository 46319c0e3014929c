//! Domain-specific error types for the tapview engine.
//!
//! All fallible operations return `Result<T, TapError>`. Nothing here is
//! fatal to the viewer: callers log the error and keep the last good view.
//!
//! A pointer landing outside the fitted rectangle is *not* an error; the
//! geometry layer reports it as `None` and the gesture is dropped.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for tapview.
#[derive(Debug, Error)]
pub enum TapError {
    // ── Transport Errors ─────────────────────────────────────────
    /// A device command exited with a non-zero status.
    #[error("{command} failed: {message}")]
    CommandFailed {
        /// Short command name, e.g. `"screencap"`.
        command: &'static str,
        /// Diagnostic text reported by the transport (usually stderr).
        message: String,
    },

    /// A device command exceeded its deadline.
    #[error("{command} timed out after {timeout:?}")]
    Timeout {
        command: &'static str,
        timeout: Duration,
    },

    /// Spawning or talking to the transport process failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Snapshot Errors ──────────────────────────────────────────
    /// A snapshot could not be acquired; the previous bitmap stays shown.
    #[error("capture failed during {stage}: {source}")]
    Capture {
        /// The capture step that failed (`"screencap"` or `"pull"`).
        stage: &'static str,
        #[source]
        source: Box<TapError>,
    },

    /// The pulled bytes are not a decodable bitmap.
    #[error("bitmap decode error: {0}")]
    Decode(#[from] image::ImageError),

    // ── Geometry Errors ──────────────────────────────────────────
    /// A size with a zero dimension was supplied.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl TapError {
    /// Wrap `self` as a capture failure at the given stage.
    pub fn at_capture_stage(self, stage: &'static str) -> Self {
        TapError::Capture {
            stage,
            source: Box::new(self),
        }
    }

    /// Returns `true` for snapshot acquisition failures.
    pub fn is_capture_failure(&self) -> bool {
        matches!(self, TapError::Capture { .. } | TapError::Decode(_))
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for TapError {
    fn from(s: String) -> Self {
        TapError::Other(s)
    }
}

impl From<&str> for TapError {
    fn from(s: &str) -> Self {
        TapError::Other(s.to_string())
    }
}
