//! JPEG encoding for the exported crop.
//!
//! JPEG has no alpha channel, so the circular cut-out is flattened onto a
//! solid background first (see [`flatten_rgba`]). With the default black
//! background this matches what a browser canvas produces for a JPEG export
//! of a transparent-cornered drawing.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::io::Cursor;

use super::EncodeError;

/// Composite an RGBA bitmap over a solid RGB background.
///
/// Returns packed RGB bytes (3 per pixel, row-major).
pub fn flatten_rgba(image: &RgbaImage, background: [u8; 3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.width() as usize * image.height() as usize * 3);

    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let alpha = a as u32;
        let inv = 255 - alpha;
        // Integer blend with rounding: (src * a + bg * (255 - a) + 127) / 255
        out.push(((r as u32 * alpha + background[0] as u32 * inv + 127) / 255) as u8);
        out.push(((g as u32 * alpha + background[1] as u32 * inv + 127) / 255) as u8);
        out.push(((b as u32 * alpha + background[2] as u32 * inv + 127) / 255) as u8);
    }

    out
}

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality (1-100, clamped)
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let quality = quality.clamp(1, 100);

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);

    encoder
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}
