//! Display surface: the current bitmap, where it goes, and the composed
//! frame the window renderer blits.
//!
//! The composed frame is a top-down BGRA8 buffer the size of the viewport:
//! background everywhere, the rotated and resampled bitmap inside the
//! fitted rect. It is rebuilt lazily on [`DisplaySurface::repaint`].

use image::RgbaImage;
use image::imageops;
use tracing::{debug, warn};

use super::ResampleFilter;
use crate::device::Bitmap;
use crate::geometry::{DeviceResolution, FittedRect, Rotation, ViewportSize, fit_device};

/// A composed frame ready for the window.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, BGRA, rows top to bottom.
    pub bgra: &'a [u8],
}

/// Owns the bitmap and the fitted rectangle it is drawn into.
pub struct DisplaySurface {
    resolution: DeviceResolution,
    rotation: Rotation,
    viewport: ViewportSize,
    background: [u8; 3],
    filter: ResampleFilter,

    bitmap: Option<Bitmap>,
    fitted: Option<FittedRect>,
    /// Bitmap rotated and resampled to `fitted`'s size.
    scaled: Option<RgbaImage>,

    frame: Vec<u8>,
    dirty: bool,
    warned_mismatch: bool,
}

impl DisplaySurface {
    pub fn new(resolution: DeviceResolution, viewport: ViewportSize) -> Self {
        Self {
            resolution,
            rotation: Rotation::Deg0,
            viewport,
            background: [0, 0, 0],
            filter: ResampleFilter::default(),
            bitmap: None,
            fitted: None,
            scaled: None,
            frame: Vec::new(),
            dirty: true,
            warned_mismatch: false,
        }
    }

    /// Background color as RGB.
    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }

    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn resolution(&self) -> DeviceResolution {
        self.resolution
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.bitmap.as_ref()
    }

    /// Where the bitmap is drawn; `None` until the first bitmap arrives.
    pub fn fitted_rect(&self) -> Option<FittedRect> {
        self.fitted
    }

    /// Whether the composed frame is stale.
    pub fn needs_repaint(&self) -> bool {
        self.dirty
    }

    // ── Updates ──────────────────────────────────────────────────

    /// Replace the bitmap wholesale.
    pub fn set_bitmap(&mut self, bitmap: Bitmap) {
        let (w, h) = bitmap.dimensions();
        if (w, h) != (self.resolution.width(), self.resolution.height()) && !self.warned_mismatch {
            warn!(
                "snapshot is {w}x{h} but device resolution is {}; touches use the configured resolution",
                self.resolution
            );
            self.warned_mismatch = true;
        }
        self.bitmap = Some(bitmap);
        self.recompute();
    }

    /// New viewport size. Returns `false` if nothing changed.
    pub fn resize(&mut self, viewport: ViewportSize) -> bool {
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        self.recompute();
        true
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        if rotation == self.rotation {
            return;
        }
        self.rotation = rotation;
        self.recompute();
    }

    /// Force a repaint without changing any state (e.g. window exposed).
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    fn recompute(&mut self) {
        self.dirty = true;
        let Some(bitmap) = &self.bitmap else {
            return;
        };

        let rect = fit_device(self.resolution, self.rotation, self.viewport);
        let rotated = match self.rotation {
            Rotation::Deg0 => None,
            // Orientation matches `viewport_point_to_device`.
            Rotation::Deg90 => Some(imageops::rotate270(bitmap)),
            Rotation::Deg180 => Some(imageops::rotate180(bitmap)),
            Rotation::Deg270 => Some(imageops::rotate90(bitmap)),
        };
        let source = rotated.as_ref().unwrap_or(bitmap);

        let scaled = if source.dimensions() == (rect.width, rect.height) {
            source.clone()
        } else {
            imageops::resize(source, rect.width, rect.height, self.filter.filter_type())
        };

        debug!(
            "fitted {} into {} at ({}, {}) size {}x{}",
            self.rotation, self.viewport, rect.x, rect.y, rect.width, rect.height
        );
        self.fitted = Some(rect);
        self.scaled = Some(scaled);
    }

    // ── Repaint ──────────────────────────────────────────────────

    /// Compose the frame: clear to the background, blit the bitmap.
    pub fn repaint(&mut self) -> Frame<'_> {
        let (vw, vh) = (self.viewport.width(), self.viewport.height());

        if self.dirty {
            let [r, g, b] = self.background;
            let len = vw as usize * vh as usize * 4;
            self.frame.clear();
            self.frame.reserve(len);
            for _ in 0..(vw as usize * vh as usize) {
                self.frame.extend_from_slice(&[b, g, r, 255]);
            }

            if let (Some(rect), Some(scaled)) = (&self.fitted, &self.scaled) {
                let stride = vw as usize * 4;
                for (row, pixels) in scaled.rows().enumerate() {
                    let y = rect.y as usize + row;
                    let start = y * stride + rect.x as usize * 4;
                    let dst = &mut self.frame[start..start + rect.width as usize * 4];
                    for (out, px) in dst.chunks_exact_mut(4).zip(pixels) {
                        let [r, g, b, a] = px.0;
                        out.copy_from_slice(&[b, g, r, a]);
                    }
                }
            }
            self.dirty = false;
        }

        Frame {
            width: vw,
            height: vh,
            bgra: &self.frame,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
