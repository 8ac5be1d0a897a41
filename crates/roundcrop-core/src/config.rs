//! Constructor-time configuration for a crop session.
//!
//! Every value here is fixed for the lifetime of a [`CropSession`](crate::CropSession).
//! The defaults are the reference profile-photo settings: a 280px viewport,
//! a 400px JPEG output at quality 90, zoom between 1x and 3x in 0.05 steps,
//! and a 10 MiB ceiling on selected files.
//!
//! The struct derives serde with `#[serde(default)]`, so a host can send a
//! partial object (e.g. only `viewport_size`) and get reference values for
//! the rest.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Viewport;
use crate::interaction::ZoomBounds;
use crate::raster::InterpolationFilter;

/// 10 MiB, the reference ceiling for selected files.
pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Largest accepted output edge. The RGBA surface is `edge² × 4` bytes and
/// must stay addressable on 32-bit targets.
pub const MAX_OUTPUT_EDGE: u32 = 8192;

/// Largest accepted viewport edge.
pub const MAX_VIEWPORT_SIZE: u32 = 8192;

/// Errors reported by [`CropConfig::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Viewport edge must be at least one pixel.
    #[error("Invalid viewport size: {0} (must be non-zero)")]
    ZeroViewport(u32),

    /// Viewport edge above [`MAX_VIEWPORT_SIZE`].
    #[error("Viewport too large: {size} (limit {limit})")]
    ViewportTooLarge { size: u32, limit: u32 },

    /// Output edge must be at least one pixel.
    #[error("Invalid output edge: {0} (must be non-zero)")]
    ZeroOutputEdge(u32),

    /// Output edge above [`MAX_OUTPUT_EDGE`].
    #[error("Output edge too large: {edge} (limit {limit})")]
    OutputEdgeTooLarge { edge: u32, limit: u32 },

    /// Zoom bounds must be finite, positive and ordered.
    #[error("Invalid zoom bounds: min {min}, max {max}")]
    InvalidZoomBounds { min: f64, max: f64 },

    /// Zoom step must be finite and positive.
    #[error("Invalid zoom step: {0}")]
    InvalidZoomStep(f64),

    /// File size ceiling must be non-zero.
    #[error("Invalid file size limit: 0 bytes")]
    ZeroFileLimit,

    /// JPEG quality must be within 1-100.
    #[error("Invalid JPEG quality: {0} (must be 1-100)")]
    InvalidQuality(u8),
}

/// Encoding of the exported bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG. Pixels outside the circle are flattened onto the background.
    Jpeg {
        /// Quality factor 1-100 (90 corresponds to a canvas quality of 0.9).
        quality: u8,
    },
    /// Lossless PNG with the circle's alpha preserved.
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Jpeg { quality: 90 }
    }
}

impl OutputFormat {
    /// MIME type of payloads produced with this format.
    pub fn media_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

/// Square edge and encoding of the exported bitmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSpec {
    /// Output edge length in pixels.
    pub edge: u32,
    /// Output encoding.
    pub format: OutputFormat,
    /// RGB colour used where the encoding cannot carry transparency.
    pub background: [u8; 3],
    /// Resampling filter for the rect-to-rect draw.
    pub filter: InterpolationFilter,
}

/// Crop session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Edge length of the square preview viewport, in pixels.
    pub viewport_size: u32,
    /// Edge length of the square exported bitmap, in pixels.
    pub output_edge: u32,
    /// Smallest allowed zoom factor.
    pub min_zoom: f64,
    /// Largest allowed zoom factor.
    pub max_zoom: f64,
    /// Zoom change per wheel tick.
    pub zoom_step: f64,
    /// Largest accepted file, in bytes.
    pub max_file_bytes: usize,
    /// Output encoding.
    pub output_format: OutputFormat,
    /// Flatten colour for encodings without alpha.
    pub background: [u8; 3],
    /// Resampling filter used at commit.
    pub filter: InterpolationFilter,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            viewport_size: 280,
            output_edge: 400,
            min_zoom: 1.0,
            max_zoom: 3.0,
            zoom_step: 0.05,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            output_format: OutputFormat::default(),
            background: [0, 0, 0],
            filter: InterpolationFilter::default(),
        }
    }
}

impl CropConfig {
    /// Create a configuration with the reference values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport_size == 0 {
            return Err(ConfigError::ZeroViewport(self.viewport_size));
        }
        if self.viewport_size > MAX_VIEWPORT_SIZE {
            return Err(ConfigError::ViewportTooLarge {
                size: self.viewport_size,
                limit: MAX_VIEWPORT_SIZE,
            });
        }
        if self.output_edge == 0 {
            return Err(ConfigError::ZeroOutputEdge(self.output_edge));
        }
        if self.output_edge > MAX_OUTPUT_EDGE {
            return Err(ConfigError::OutputEdgeTooLarge {
                edge: self.output_edge,
                limit: MAX_OUTPUT_EDGE,
            });
        }
        let bounds_ok = self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.min_zoom <= self.max_zoom;
        if !bounds_ok {
            return Err(ConfigError::InvalidZoomBounds {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if !self.zoom_step.is_finite() || self.zoom_step <= 0.0 {
            return Err(ConfigError::InvalidZoomStep(self.zoom_step));
        }
        if self.max_file_bytes == 0 {
            return Err(ConfigError::ZeroFileLimit);
        }
        if let OutputFormat::Jpeg { quality } = self.output_format {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::InvalidQuality(quality));
            }
        }
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_size)
    }

    pub fn zoom_bounds(&self) -> ZoomBounds {
        ZoomBounds::new(self.min_zoom, self.max_zoom, self.zoom_step)
    }

    pub fn output_spec(&self) -> OutputSpec {
        OutputSpec {
            edge: self.output_edge,
            format: self.output_format,
            background: self.background,
            filter: self.filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reference_profile() {
        let config = CropConfig::new();
        assert_eq!(config.viewport_size, 280);
        assert_eq!(config.output_edge, 400);
        assert_eq!(config.min_zoom, 1.0);
        assert_eq!(config.max_zoom, 3.0);
        assert_eq!(config.zoom_step, 0.05);
        assert_eq!(config.max_file_bytes, 10_485_760);
        assert_eq!(config.output_format, OutputFormat::Jpeg { quality: 90 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_viewport_rejected() {
        let mut config = CropConfig::new();
        config.viewport_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroViewport(0)));
    }

    #[test]
    fn test_zero_output_rejected() {
        let mut config = CropConfig::new();
        config.output_edge = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroOutputEdge(0)));
    }

    #[test]
    fn test_oversized_output_rejected() {
        let mut config = CropConfig::new();
        config.output_edge = MAX_OUTPUT_EDGE;
        assert!(config.validate().is_ok());

        config.output_edge = MAX_OUTPUT_EDGE + 1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutputEdgeTooLarge {
                edge: 8193,
                limit: 8192
            })
        );

        config.output_edge = u32::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutputEdgeTooLarge { .. })
        ));
    }

    #[test]
    fn test_oversized_viewport_rejected() {
        let mut config = CropConfig::new();
        config.viewport_size = u32::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ViewportTooLarge { .. })
        ));
    }

    #[test]
    fn test_inverted_zoom_bounds_rejected() {
        let mut config = CropConfig::new();
        config.min_zoom = 3.0;
        config.max_zoom = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidZoomBounds { .. })
        ));
    }

    #[test]
    fn test_nan_zoom_rejected() {
        let mut config = CropConfig::new();
        config.max_zoom = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_step_rejected() {
        let mut config = CropConfig::new();
        config.zoom_step = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidZoomStep(0.0)));
    }

    #[test]
    fn test_zero_file_limit_rejected() {
        let mut config = CropConfig::new();
        config.max_file_bytes = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroFileLimit));
    }

    #[test]
    fn test_bad_quality_rejected() {
        let mut config = CropConfig::new();
        config.output_format = OutputFormat::Jpeg { quality: 0 };
        assert_eq!(config.validate(), Err(ConfigError::InvalidQuality(0)));

        config.output_format = OutputFormat::Jpeg { quality: 101 };
        assert_eq!(config.validate(), Err(ConfigError::InvalidQuality(101)));

        config.output_format = OutputFormat::Png;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: CropConfig =
            serde_json::from_str(r#"{ "viewport_size": 320, "output_format": { "encoding": "png" } }"#)
                .unwrap();
        assert_eq!(config.viewport_size, 320);
        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.output_edge, 400);
        assert_eq!(config.zoom_step, 0.05);
    }

    #[test]
    fn test_media_types() {
        assert_eq!(OutputFormat::Jpeg { quality: 90 }.media_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.media_type(), "image/png");
    }
}
