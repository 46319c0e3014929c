//! Geometry engine: fitting the device bitmap into the viewport and
//! mapping viewport pointer positions back to device pixels.
//!
//! ```text
//!  viewport (vw × vh)
//! ┌──────────────────────────────────┐
//! │        ┌──────────────┐          │
//! │ slack  │  FittedRect  │  slack   │   aspect = effective device aspect
//! │        │ (x, y, w, h) │          │   x = (vw - w) / 2, y = (vh - h) / 2
//! │        └──────────────┘          │
//! └──────────────────────────────────┘
//! ```
//!
//! Everything in this module is pure: no I/O and no hidden state, so two
//! calls with identical arguments always produce identical results.

use crate::error::TapError;

// ── Size ─────────────────────────────────────────────────────────

/// A pixel extent with both dimensions strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    width: u32,
    height: u32,
}

/// Physical pixel grid of the controlled device, before rotation.
pub type DeviceResolution = Size;

/// Current size of the drawing surface.
pub type ViewportSize = Size;

impl Size {
    /// Create a size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, TapError> {
        if width == 0 || height == 0 {
            return Err(TapError::InvalidGeometry("size dimensions must be positive"));
        }
        Ok(Self { width, height })
    }

    pub const fn width(self) -> u32 {
        self.width
    }

    pub const fn height(self) -> u32 {
        self.height
    }

    /// Width divided by height.
    pub fn aspect(self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// The same extent with the axes exchanged.
    pub const fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ── Points ───────────────────────────────────────────────────────

/// A position on the viewport, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`, in viewport pixels.
    pub fn distance_to(self, other: Point) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx.hypot(dy)
    }
}

/// A position on the device's native pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DevicePoint {
    pub x: i32,
    pub y: i32,
}

impl DevicePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for DevicePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

// ── Rotation ─────────────────────────────────────────────────────

/// Rotation applied to the displayed bitmap, in 90° steps.
///
/// The angle is what the user cycles through with the rotate action;
/// [`viewport_point_to_device`] defines how each angle relates display
/// space to device space, and the display surface rotates the bitmap to
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// All four rotations in cycling order.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// The angle in degrees.
    pub const fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Parse a multiple of 90 (taken modulo 360).
    pub const fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// The next rotation, 90° further, wrapping at 360°.
    pub const fn next(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// `true` for 90° and 270°, where width and height trade places.
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Device resolution as seen on screen under this rotation.
    pub const fn effective_size(self, resolution: DeviceResolution) -> Size {
        if self.swaps_axes() {
            resolution.transposed()
        } else {
            resolution
        }
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

// ── FittedRect ───────────────────────────────────────────────────

/// The centered, aspect-preserving sub-rectangle of the viewport into
/// which the device bitmap is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FittedRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl FittedRect {
    /// Whether `p` lies on or inside the rectangle.
    ///
    /// The last pixel column and row (`x + width - 1`, `y + height - 1`)
    /// are inside; `x + width` and `y + height` are not.
    pub fn contains(&self, p: Point) -> bool {
        let (px, py) = (p.x as i64, p.y as i64);
        let (x, y) = (self.x as i64, self.y as i64);
        px >= x && px < x + self.width as i64 && py >= y && py < y + self.height as i64
    }

    /// The pixel at the middle of the rectangle.
    pub fn center(&self) -> Point {
        Point::new(
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }

    /// Size of the rectangle, or `None` if it is degenerate.
    pub fn size(&self) -> Option<Size> {
        Size::new(self.width, self.height).ok()
    }
}

// ── Fitting ──────────────────────────────────────────────────────

/// Largest rectangle with `effective`'s aspect ratio that fits inside
/// `viewport`, centered on both axes.
///
/// A viewport wider than the device aspect is height-limited, otherwise
/// width-limited. The free dimension is rounded to the nearest pixel, and
/// the slack is split with floor division.
pub fn compute_fitted_rect(effective: Size, viewport: ViewportSize) -> FittedRect {
    let device_aspect = effective.aspect();

    let (width, height) = if viewport.aspect() > device_aspect {
        let height = viewport.height;
        let width = (height as f64 * device_aspect).round() as u32;
        (width.clamp(1, viewport.width), height)
    } else {
        let width = viewport.width;
        let height = (width as f64 / device_aspect).round() as u32;
        (width, height.clamp(1, viewport.height))
    };

    FittedRect {
        x: ((viewport.width - width) / 2) as i32,
        y: ((viewport.height - height) / 2) as i32,
        width,
        height,
    }
}

/// [`compute_fitted_rect`] for a device resolution under `rotation`.
pub fn fit_device(
    resolution: DeviceResolution,
    rotation: Rotation,
    viewport: ViewportSize,
) -> FittedRect {
    compute_fitted_rect(rotation.effective_size(resolution), viewport)
}

// ── Mapping ──────────────────────────────────────────────────────

/// Map a viewport position to the device pixel under it.
///
/// Returns `None` when `point` is outside `rect`; callers drop the
/// gesture silently. Otherwise the point is made rect-local, scaled to
/// device pixels along the on-screen axes, then rotated back into the
/// device frame:
///
/// | rotation | device point                   |
/// |----------|--------------------------------|
/// | 0°       | `(x, y)`                       |
/// | 90°      | `(dev_w - y, x)`               |
/// | 180°     | `(dev_w - x, dev_h - y)`       |
/// | 270°     | `(y, dev_h - x)`               |
///
/// Both axes are clamped to `[0, dimension - 1]` afterwards, so the result
/// is always addressable on the device.
pub fn viewport_point_to_device(
    point: Point,
    rect: &FittedRect,
    resolution: DeviceResolution,
    rotation: Rotation,
) -> Option<DevicePoint> {
    if !rect.contains(point) {
        return None;
    }

    // On-screen axes carry the device axes swapped at 90°/270°.
    let effective = rotation.effective_size(resolution);
    let local_x = (point.x - rect.x) as f64;
    let local_y = (point.y - rect.y) as f64;
    let x = local_x * effective.width as f64 / rect.width as f64;
    let y = local_y * effective.height as f64 / rect.height as f64;

    let dev_w = resolution.width as f64;
    let dev_h = resolution.height as f64;
    let (dev_x, dev_y) = match rotation {
        Rotation::Deg0 => (x, y),
        Rotation::Deg90 => (dev_w - y, x),
        Rotation::Deg180 => (dev_w - x, dev_h - y),
        Rotation::Deg270 => (y, dev_h - x),
    };

    Some(DevicePoint {
        x: clamp_axis(dev_x, resolution.width),
        y: clamp_axis(dev_y, resolution.height),
    })
}

/// Forward mapping: where a device pixel appears on the viewport.
///
/// This is the inverse of [`viewport_point_to_device`] up to rounding.
pub fn device_point_to_viewport(
    point: DevicePoint,
    rect: &FittedRect,
    resolution: DeviceResolution,
    rotation: Rotation,
) -> Point {
    let effective = rotation.effective_size(resolution);
    let dx = point.x as f64;
    let dy = point.y as f64;
    let dev_w = resolution.width as f64;
    let dev_h = resolution.height as f64;

    let (x, y) = match rotation {
        Rotation::Deg0 => (dx, dy),
        Rotation::Deg90 => (dy, dev_w - dx),
        Rotation::Deg180 => (dev_w - dx, dev_h - dy),
        Rotation::Deg270 => (dev_h - dy, dx),
    };

    Point {
        x: rect.x + (x * rect.width as f64 / effective.width as f64).round() as i32,
        y: rect.y + (y * rect.height as f64 / effective.height as f64).round() as i32,
    }
}

fn clamp_axis(value: f64, dimension: u32) -> i32 {
    (value.floor() as i64).clamp(0, dimension as i64 - 1) as i32
}

// ── Tests ────────────────────────────────────────────────────────
