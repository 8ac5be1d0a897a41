//! Roundcrop Core - circular crop engine
//!
//! This crate positions an image inside a fixed square viewport (cover-fit,
//! zoom, free pan), and renders exactly what the viewport shows into a
//! circular-masked square bitmap ready for upload.
//!
//! # Module Structure
//!
//! - `geometry` - Display geometry and the viewport-to-source inverse mapping
//! - `interaction` - Pointer drag / wheel zoom state machine
//! - `source` - File validation and decoding
//! - `raster` - Rect-to-rect resample with circular mask
//! - `encode` - JPEG / PNG payload encoding
//! - `session` - Load, edit, commit lifecycle
//!
//! All rendering is deterministic: the same image and transform always
//! produce the same payload bytes.

pub mod config;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod raster;
pub mod session;
pub mod source;

pub use config::{ConfigError, CropConfig, OutputFormat, OutputSpec};
pub use encode::{EncodeError, Payload};
pub use error::CropError;
pub use geometry::{DisplayGeometry, Pan, SourceRect, TransformState, Viewport};
pub use interaction::{Controller, Effect, InteractionEvent, PointerState, ZoomBounds};
pub use raster::{rasterize, InterpolationFilter};
pub use session::{CropSession, ExportSink, SessionState, SinkError};
pub use source::{DecodeTicket, ImageSource, SelectedFile};
