//! Payload encoding for the exported crop.
//!
//! The rasterizer produces an RGBA bitmap; this module turns it into the
//! compressed bytes handed to the export sink.
//!
//! - JPEG (reference): alpha flattened onto a background colour, lossy at
//!   the configured quality.
//! - PNG: alpha kept, so the area outside the circle stays transparent.
//!
//! Both encoders are deterministic: the same bitmap and settings always give
//! the same bytes.

mod jpeg;
mod png;

use image::RgbaImage;
use thiserror::Error;

use crate::config::OutputFormat;

pub use jpeg::{encode_jpeg, flatten_rgba};
pub use png::encode_png;

/// Errors that can occur while encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encoded crop, ready for the export sink.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    /// Compressed image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub media_type: &'static str,
    /// Edge length of the square image, in pixels.
    pub edge: u32,
}

impl Payload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload")
            .field("media_type", &self.media_type)
            .field("edge", &self.edge)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Encode a square RGBA bitmap in the requested format.
pub fn encode_payload(
    image: &RgbaImage,
    format: OutputFormat,
    background: [u8; 3],
) -> Result<Payload, EncodeError> {
    let (width, height) = image.dimensions();

    let bytes = match format {
        OutputFormat::Jpeg { quality } => {
            let rgb = flatten_rgba(image, background);
            encode_jpeg(&rgb, width, height, quality)?
        }
        OutputFormat::Png => encode_png(image.as_raw(), width, height)?,
    };

    Ok(Payload {
        bytes,
        media_type: format.media_type(),
        edge: width,
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn pixels_strategy(edge: u32) -> impl Strategy<Value = Vec<u8>> {
        let size = (edge as usize) * (edge as usize) * 4;
        prop::collection::vec(any::<u8>(), size..=size)
    }

    proptest! {
        /// Property: Same bitmap always encodes to the same bytes.
        #[test]
        fn prop_deterministic_output(
            (edge, pixels) in (1u32..=16).prop_flat_map(|e| (Just(e), pixels_strategy(e))),
            quality in 1u8..=100,
            png in any::<bool>(),
        ) {
            let img = RgbaImage::from_raw(edge, edge, pixels).unwrap();
            let format = if png { OutputFormat::Png } else { OutputFormat::Jpeg { quality } };

            let a = encode_payload(&img, format, [0, 0, 0]).unwrap();
            let b = encode_payload(&img, format, [0, 0, 0]).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Property: Flattening always yields three bytes per pixel.
        #[test]
        fn prop_flatten_length(
            (edge, pixels) in (1u32..=16).prop_flat_map(|e| (Just(e), pixels_strategy(e))),
            background in any::<[u8; 3]>(),
        ) {
            let img = RgbaImage::from_raw(edge, edge, pixels).unwrap();
            prop_assert_eq!(flatten_rgba(&img, background).len(), (edge * edge * 3) as usize);
        }
    }
}
