//! Rasterization of the visible crop into the exported bitmap.
//!
//! # Algorithm
//!
//! 1. Derive the [`SourceRect`] from the transform via
//!    [`geometry::forward`] and [`geometry::inverse`].
//! 2. Allocate a fully transparent `edge × edge` RGBA surface.
//! 3. For every output pixel with non-zero coverage under the inscribed
//!    [`CircleMask`], map its centre straight into the source rect and sample:
//!
//! ```text
//! src_x = rect.x + (u + 0.5) * rect.width  / edge
//! src_y = rect.y + (v + 0.5) * rect.height / edge
//! ```
//!
//! This is a single rect-to-rect resample; there is no intermediate crop.
//! Pixels outside the circle are left transparent, and coverage on the rim
//! scales the sampled alpha.

mod mask;
mod sample;

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::config::OutputSpec;
use crate::encode::{encode_payload, Payload};
use crate::error::CropError;
use crate::geometry::{self, SourceRect, TransformState, Viewport};
use crate::source::ImageSource;

pub use mask::CircleMask;
pub use sample::{sample, sample_bilinear, sample_lanczos3, InterpolationFilter};

/// The source rectangle currently visible through the viewport.
pub fn visible_rect(source: &ImageSource, viewport: Viewport, transform: &TransformState) -> SourceRect {
    let display = geometry::forward(source.natural_size(), viewport, transform);
    geometry::inverse(&display, viewport)
}

/// Resample `rect` of the source onto an `edge × edge` circular cut-out.
pub fn render_rect(
    source: &ImageSource,
    rect: &SourceRect,
    edge: u32,
    filter: InterpolationFilter,
) -> RgbaImage {
    let mut output = RgbaImage::new(edge, edge);
    if edge == 0 {
        return output;
    }

    let mask = CircleMask::inscribed(edge);
    let step_x = rect.width / edge as f64;
    let step_y = rect.height / edge as f64;
    let pixels = source.pixels();

    for v in 0..edge {
        let src_y = rect.y + (v as f64 + 0.5) * step_y;

        for u in 0..edge {
            let coverage = mask.coverage(u, v);
            if coverage <= 0.0 {
                continue;
            }

            let src_x = rect.x + (u as f64 + 0.5) * step_x;
            let mut px = sample(pixels, src_x, src_y, filter);
            if coverage < 1.0 {
                px[3] = (px[3] as f64 * coverage).round() as u8;
            }
            output.put_pixel(u, v, Rgba(px));
        }
    }

    output
}

/// Render the current crop without encoding it.
pub fn render(
    source: &ImageSource,
    viewport: Viewport,
    transform: &TransformState,
    edge: u32,
    filter: InterpolationFilter,
) -> RgbaImage {
    let rect = visible_rect(source, viewport, transform);
    debug!(
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        edge,
        "Rendering crop"
    );
    render_rect(source, &rect, edge, filter)
}

/// Render and encode the current crop.
///
/// Deterministic: identical inputs always produce byte-identical payloads.
pub fn rasterize(
    source: &ImageSource,
    viewport: Viewport,
    transform: &TransformState,
    spec: &OutputSpec,
) -> Result<Payload, CropError> {
    let bitmap = render(source, viewport, transform, spec.edge, spec.filter);
    Ok(encode_payload(&bitmap, spec.format, spec.background)?)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
