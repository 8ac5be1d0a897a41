//! Source sampling for the rect-to-rect resample.
//!
//! Coordinates are continuous source-pixel positions: pixel `(i, j)` covers
//! `[i, i+1) × [j, j+1)` and its centre is `(i + 0.5, j + 0.5)`. Positions
//! outside `[0, width) × [0, height)` sample as fully transparent, which is
//! what the viewport shows when the image has been panned past its edge.
//!
//! Interpolation runs on premultiplied alpha so transparent source pixels do
//! not bleed their colour into neighbours.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Interpolation filter for the export resample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationFilter {
    /// Four-tap bilinear interpolation.
    #[default]
    Bilinear,
    /// 6x6 Lanczos3 kernel; sharper, slower.
    Lanczos3,
}

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Sample the source at a continuous position with the given filter.
#[inline]
pub fn sample(image: &RgbaImage, x: f64, y: f64, filter: InterpolationFilter) -> [u8; 4] {
    match filter {
        InterpolationFilter::Bilinear => sample_bilinear(image, x, y),
        InterpolationFilter::Lanczos3 => sample_lanczos3(image, x, y),
    }
}

#[inline]
fn outside(image: &RgbaImage, x: f64, y: f64) -> bool {
    !(x >= 0.0 && y >= 0.0 && x < image.width() as f64 && y < image.height() as f64)
}

/// Premultiplied pixel as [r*a, g*a, b*a, a] with a in 0..=1.
#[inline]
fn premultiplied(image: &RgbaImage, px: i64, py: i64) -> [f64; 4] {
    let px = px.clamp(0, image.width() as i64 - 1) as u32;
    let py = py.clamp(0, image.height() as i64 - 1) as u32;
    let [r, g, b, a] = image.get_pixel(px, py).0;
    let alpha = a as f64 / 255.0;
    [r as f64 * alpha, g as f64 * alpha, b as f64 * alpha, alpha]
}

/// Convert an accumulated premultiplied value back to straight RGBA8.
#[inline]
fn unpremultiply(acc: [f64; 4]) -> [u8; 4] {
    let alpha = acc[3].clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return TRANSPARENT;
    }
    [
        (acc[0] / alpha).clamp(0.0, 255.0).round() as u8,
        (acc[1] / alpha).clamp(0.0, 255.0).round() as u8,
        (acc[2] / alpha).clamp(0.0, 255.0).round() as u8,
        (alpha * 255.0).round() as u8,
    ]
}

/// Bilinear interpolation between the four pixel centres around `(x, y)`.
///
/// Near the image border the outermost row/column is repeated, so the edge
/// of the picture stays sharp instead of fading into transparency.
pub fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    if outside(image, x, y) {
        return TRANSPARENT;
    }

    // Shift to pixel-centre lattice
    let cx = x - 0.5;
    let cy = y - 0.5;
    let x0 = cx.floor() as i64;
    let y0 = cy.floor() as i64;
    let fx = cx - x0 as f64;
    let fy = cy - y0 as f64;

    let p00 = premultiplied(image, x0, y0);
    let p10 = premultiplied(image, x0 + 1, y0);
    let p01 = premultiplied(image, x0, y0 + 1);
    let p11 = premultiplied(image, x0 + 1, y0 + 1);

    let mut acc = [0.0f64; 4];
    for i in 0..4 {
        acc[i] = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
    }

    unpremultiply(acc)
}

/// Lanczos3 interpolation over the 6x6 neighbourhood of `(x, y)`.
pub fn sample_lanczos3(image: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    if outside(image, x, y) {
        return TRANSPARENT;
    }

    let cx = x - 0.5;
    let cy = y - 0.5;
    let x0 = cx.floor() as i64;
    let y0 = cy.floor() as i64;

    let mut acc = [0.0f64; 4];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;
            let weight = lanczos_weight(cx - px as f64, 3.0) * lanczos_weight(cy - py as f64, 3.0);

            let pixel = premultiplied(image, px, py);
            for i in 0..4 {
                acc[i] += pixel[i] * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum.abs() < f64::EPSILON {
        return sample_bilinear(image, x, y);
    }
    for v in acc.iter_mut() {
        *v /= weight_sum;
    }

    unpremultiply(acc)
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;

    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}
