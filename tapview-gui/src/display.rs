//! Display renderer: blits composed session frames to the window.
//!
//! Frames arrive already letterboxed to the client size, so the GDI
//! `StretchDIBits` call copies them 1:1.

use tapview_core::Frame;

fn check_frame(frame: &Frame<'_>) -> Result<(), String> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.bgra.len() < expected {
        return Err(format!(
            "frame buffer too small: {} < {}",
            frame.bgra.len(),
            expected,
        ));
    }
    Ok(())
}

#[cfg(target_os = "windows")]
mod platform {
    use windows::Win32::Foundation::*;
    use windows::Win32::Graphics::Gdi::*;

    use tapview_core::Frame;

    /// Renders BGRA8 frames into an HWND using GDI.
    pub struct DisplayRenderer {
        hwnd: HWND,
        width: u32,
        height: u32,
    }

    impl DisplayRenderer {
        /// Create a renderer targeting the given window.
        pub fn new(hwnd: HWND, width: u32, height: u32) -> Self {
            Self { hwnd, width, height }
        }

        /// Update the target size (call after WM_SIZE).
        pub fn resize(&mut self, width: u32, height: u32) {
            self.width = width;
            self.height = height;
        }

        /// Draw `frame` at the client origin.
        pub fn render(&self, frame: &Frame<'_>) -> Result<(), String> {
            if frame.bgra.is_empty() || self.width == 0 || self.height == 0 {
                return Ok(());
            }
            super::check_frame(frame)?;

            if frame.width != self.width || frame.height != self.height {
                tracing::debug!(
                    "frame {}x{} does not match client {}x{}",
                    frame.width,
                    frame.height,
                    self.width,
                    self.height,
                );
            }

            unsafe {
                let hdc = GetDC(self.hwnd);
                if hdc.is_invalid() {
                    return Err("GetDC failed".into());
                }

                let bmi = BITMAPINFO {
                    bmiHeader: BITMAPINFOHEADER {
                        biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                        biWidth: frame.width as i32,
                        // Negative height = top-down DIB (origin at top-left).
                        biHeight: -(frame.height as i32),
                        biPlanes: 1,
                        biBitCount: 32,
                        biCompression: BI_RGB.0,
                        ..Default::default()
                    },
                    bmiColors: [RGBQUAD::default(); 1],
                };

                StretchDIBits(
                    hdc,
                    0,
                    0,
                    frame.width as i32,
                    frame.height as i32,
                    0,
                    0,
                    frame.width as i32,
                    frame.height as i32,
                    Some(frame.bgra.as_ptr() as *const _),
                    &bmi,
                    DIB_RGB_COLORS,
                    SRCCOPY,
                );

                ReleaseDC(self.hwnd, hdc);
            }

            Ok(())
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::*;

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
pub mod stub {
    use tapview_core::Frame;

    pub struct DisplayRenderer;

    impl DisplayRenderer {
        pub fn new(_hwnd: (), _w: u32, _h: u32) -> Self {
            Self
        }

        pub fn resize(&mut self, _w: u32, _h: u32) {}

        pub fn render(&self, frame: &Frame<'_>) -> Result<(), String> {
            super::check_frame(frame)?;
            Err("Display rendering is only supported on Windows".into())
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::*;
