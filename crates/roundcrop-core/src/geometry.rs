//! Display geometry for the crop viewport.
//!
//! Two pure functions connect what the user sees to what gets exported:
//!
//! - [`forward`] places the source image inside the viewport (cover-fit,
//!   centred, then zoomed and panned).
//! - [`inverse`] maps the viewport square back to the rectangle of source
//!   pixels it shows.
//!
//! Both are evaluated from the same [`TransformState`], so the preview and the
//! exported bitmap always agree. Nothing in the crate caches a
//! [`DisplayGeometry`]; it is recomputed on every read.
//!
//! # Coordinate System
//!
//! - Viewport space: pixels, origin at the viewport's top-left, `(size, size)`
//!   at the bottom-right.
//! - Source space: pixels of the decoded image, origin at its top-left.
//! - Pan is a screen-space translation in viewport pixels, applied after
//!   centring.

use serde::{Deserialize, Serialize};

/// The square crop window shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Edge length in pixels.
    pub size: u32,
}

impl Viewport {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    #[inline]
    fn edge(self) -> f64 {
        self.size as f64
    }
}

/// Screen-space pan offset, in viewport pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pan {
    pub x: f64,
    pub y: f64,
}

impl Pan {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Current zoom factor and pan offset.
///
/// Zoom is kept inside the configured bounds by the interaction controller;
/// pan is deliberately unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    pub zoom: f64,
    pub pan: Pan,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Pan::default(),
        }
    }
}

impl TransformState {
    /// Create the rest state: zoom 1, no pan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this is the rest state.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Where the source image sits inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    /// Cover-fit scale at zoom 1.
    pub base_scale: f64,
    /// Effective scale (`base_scale * zoom`), source pixel to viewport pixel.
    pub scale: f64,
    /// Displayed image width in viewport pixels.
    pub display_width: f64,
    /// Displayed image height in viewport pixels.
    pub display_height: f64,
    /// Viewport x of the image's top-left corner.
    pub origin_x: f64,
    /// Viewport y of the image's top-left corner.
    pub origin_y: f64,
}

impl DisplayGeometry {
    /// Map a viewport point to source pixel coordinates.
    #[inline]
    pub fn viewport_to_source(&self, vx: f64, vy: f64) -> (f64, f64) {
        ((vx - self.origin_x) / self.scale, (vy - self.origin_y) / self.scale)
    }

    /// Map a source pixel coordinate to a viewport point.
    #[inline]
    pub fn source_to_viewport(&self, sx: f64, sy: f64) -> (f64, f64) {
        (sx * self.scale + self.origin_x, sy * self.scale + self.origin_y)
    }

    /// True when the displayed image covers the whole viewport.
    pub fn covers(&self, viewport: Viewport) -> bool {
        let edge = viewport.edge();
        self.origin_x <= 0.0
            && self.origin_y <= 0.0
            && self.origin_x + self.display_width >= edge
            && self.origin_y + self.display_height >= edge
    }
}

/// Axis-aligned rectangle in source pixel coordinates.
///
/// The raw rectangle may extend past the image when the user has panned far
/// enough to reveal background; see [`SourceRect::clamp_to`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceRect {
    /// Viewport origin that would produce this rectangle at `scale`.
    pub fn origin_for(&self, scale: f64) -> (f64, f64) {
        (-self.x * scale, -self.y * scale)
    }

    /// Intersect with the image bounds `(0, 0)-(width, height)`.
    ///
    /// Returns `None` when the rectangle lies entirely outside the image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<SourceRect> {
        let left = self.x.max(0.0);
        let top = self.y.max(0.0);
        let right = (self.x + self.width).min(width as f64);
        let bottom = (self.y + self.height).min(height as f64);

        if right <= left || bottom <= top {
            return None;
        }

        Some(SourceRect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        })
    }
}

/// Cover-fit scale: the larger of the two axis ratios, so the image fills
/// the viewport at zoom 1.
#[inline]
pub fn base_scale(natural_width: u32, natural_height: u32, viewport: Viewport) -> f64 {
    let edge = viewport.edge();
    (edge / natural_width as f64).max(edge / natural_height as f64)
}

/// Place an image of the given natural size inside the viewport.
///
/// # Arguments
///
/// * `natural` - Source image `(width, height)` in pixels, both non-zero
/// * `viewport` - The crop window
/// * `transform` - Current zoom and pan
pub fn forward(natural: (u32, u32), viewport: Viewport, transform: &TransformState) -> DisplayGeometry {
    let (natural_width, natural_height) = natural;
    let base_scale = base_scale(natural_width, natural_height, viewport);
    let scale = base_scale * transform.zoom;

    let display_width = natural_width as f64 * scale;
    let display_height = natural_height as f64 * scale;

    let edge = viewport.edge();
    let origin_x = (edge - display_width) / 2.0 + transform.pan.x;
    let origin_y = (edge - display_height) / 2.0 + transform.pan.y;

    DisplayGeometry {
        base_scale,
        scale,
        display_width,
        display_height,
        origin_x,
        origin_y,
    }
}

/// Source rectangle visible through the viewport.
///
/// Evaluates the inverse of [`forward`] at the viewport corners `(0, 0)` and
/// `(size, size)`. No rounding is applied.
pub fn inverse(geometry: &DisplayGeometry, viewport: Viewport) -> SourceRect {
    let (x, y) = geometry.viewport_to_source(0.0, 0.0);
    let side = viewport.edge() / geometry.scale;

    SourceRect {
        x,
        y,
        width: side,
        height: side,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
