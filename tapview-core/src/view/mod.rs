//! Viewer-side state: what is drawn and how pointer input becomes
//! device gestures.
//!
//! | Module    | Purpose                                                 |
//! |-----------|---------------------------------------------------------|
//! | `surface` | owns the bitmap and fitted rect, composes repaint frames |
//! | `router`  | press/move/release/wheel state machine → [`Gesture`]s    |

pub mod router;
pub mod surface;

use serde::{Deserialize, Serialize};

pub use router::{
    Gesture, GestureConfig, InputRouter, PointerEvent, Routed, ScrollDirection, ViewMapping,
};
pub use surface::{DisplaySurface, Frame};

// ── ResampleFilter ───────────────────────────────────────────────

/// Filter used when scaling the bitmap into the fitted rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    #[default]
    Lanczos3,
}

impl ResampleFilter {
    pub fn filter_type(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}
