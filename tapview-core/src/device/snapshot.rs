//! Snapshot source: acquire the device's current screen as a bitmap.
//!
//! ```text
//! screencap <remote_path>   (device writes PNG to its storage)
//!        ↓
//! pull <remote_path>        (bytes streamed into memory)
//!        ↓
//! rm <remote_path>          (best effort, result ignored)
//!        ↓
//! decode in memory → Bitmap
//! ```
//!
//! A failure in the first two steps or in decoding yields an error and no
//! bitmap; callers keep showing the previous one.

use std::sync::Arc;

use tracing::{debug, warn};

use super::DeviceTransport;
use crate::error::TapError;

/// A decoded device snapshot, RGBA8, at the device's native resolution.
pub type Bitmap = image::RgbaImage;

/// Default on-device scratch path for screen captures.
pub const DEFAULT_REMOTE_PATH: &str = "/sdcard/screen.png";

/// Produces [`Bitmap`]s on demand from a [`DeviceTransport`].
pub struct SnapshotSource<T: ?Sized> {
    transport: Arc<T>,
    remote_path: String,
}

impl<T: DeviceTransport + ?Sized> SnapshotSource<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            remote_path: DEFAULT_REMOTE_PATH.to_string(),
        }
    }

    /// Use a different on-device scratch file.
    pub fn with_remote_path(mut self, path: impl Into<String>) -> Self {
        self.remote_path = path.into();
        self
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    /// Capture, transfer, clean up and decode one snapshot.
    pub async fn capture(&self) -> Result<Bitmap, TapError> {
        self.transport
            .capture_screen(&self.remote_path)
            .await
            .map_err(|e| e.at_capture_stage("screencap"))?;

        let pulled = self.transport.pull_file(&self.remote_path).await;

        if let Err(e) = self.transport.remove_file(&self.remote_path).await {
            debug!("cleanup of {} failed: {e}", self.remote_path);
        }

        let bytes = pulled.map_err(|e| e.at_capture_stage("pull"))?;
        let bitmap = image::load_from_memory(&bytes)
            .inspect_err(|e| warn!("pulled {} bytes that do not decode: {e}", bytes.len()))?
            .to_rgba8();

        debug!(
            "captured {}x{} snapshot ({} bytes)",
            bitmap.width(),
            bitmap.height(),
            bytes.len()
        );
        Ok(bitmap)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

    use super::*;
    use crate::geometry::DevicePoint;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    /// Scripted transport: each step either succeeds or fails.
    #[derive(Default)]
    struct Scripted {
        fail_capture: bool,
        fail_pull: bool,
        fail_remove: bool,
        payload: Vec<u8>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Scripted {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn step(&self, name: &'static str, fail: bool) -> Result<(), TapError> {
            self.calls.lock().unwrap().push(name);
            if fail {
                Err(TapError::CommandFailed {
                    command: name,
                    message: "device offline".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DeviceTransport for Scripted {
        async fn capture_screen(&self, _path: &str) -> Result<(), TapError> {
            self.step("screencap", self.fail_capture)
        }

        async fn pull_file(&self, _path: &str) -> Result<Vec<u8>, TapError> {
            self.step("pull", self.fail_pull)?;
            Ok(self.payload.clone())
        }

        async fn remove_file(&self, _path: &str) -> Result<(), TapError> {
            self.step("rm", self.fail_remove)
        }

        async fn send_tap(&self, _at: DevicePoint) -> Result<(), TapError> {
            unreachable!()
        }

        async fn send_swipe(
            &self,
            _from: DevicePoint,
            _to: DevicePoint,
            _duration: Duration,
        ) -> Result<(), TapError> {
            unreachable!()
        }

        async fn send_key_event(&self, _code: u32) -> Result<(), TapError> {
            unreachable!()
        }
    }

    #[test]
    fn capture_runs_all_three_steps_in_order() {
        let transport = Arc::new(Scripted {
            payload: png(48, 85),
            ..Default::default()
        });
        let source = SnapshotSource::new(transport.clone());

        let bitmap = tokio_test::block_on(source.capture()).unwrap();
        assert_eq!(bitmap.dimensions(), (48, 85));
        assert_eq!(bitmap.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(transport.calls(), vec!["screencap", "pull", "rm"]);
    }

    #[test]
    fn cleanup_failure_does_not_fail_capture() {
        let transport = Arc::new(Scripted {
            payload: png(4, 4),
            fail_remove: true,
            ..Default::default()
        });
        let source = SnapshotSource::new(transport);
        assert!(tokio_test::block_on(source.capture()).is_ok());
    }

    #[test]
    fn screencap_failure_stops_before_pull() {
        let transport = Arc::new(Scripted {
            fail_capture: true,
            ..Default::default()
        });
        let source = SnapshotSource::new(transport.clone());

        let err = tokio_test::block_on(source.capture()).unwrap_err();
        assert!(err.is_capture_failure());
        assert!(err.to_string().contains("device offline"));
        assert_eq!(transport.calls(), vec!["screencap"]);
    }

    #[test]
    fn pull_failure_still_cleans_up() {
        let transport = Arc::new(Scripted {
            fail_pull: true,
            ..Default::default()
        });
        let source = SnapshotSource::new(transport.clone());

        let err = tokio_test::block_on(source.capture()).unwrap_err();
        assert!(matches!(err, TapError::Capture { stage: "pull", .. }));
        assert_eq!(transport.calls(), vec!["screencap", "pull", "rm"]);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let transport = Arc::new(Scripted {
            payload: b"not a png".to_vec(),
            ..Default::default()
        });
        let source = SnapshotSource::new(transport).with_remote_path("/data/local/tmp/s.png");
        assert_eq!(source.remote_path(), "/data/local/tmp/s.png");

        let err = tokio_test::block_on(source.capture()).unwrap_err();
        assert!(matches!(err, TapError::Decode(_)));
    }
}
