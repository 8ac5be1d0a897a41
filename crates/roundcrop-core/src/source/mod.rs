//! Image source loading.
//!
//! Turning a user-selected file into something the crop engine can draw
//! happens in two steps:
//!
//! 1. [`validate_selection`] checks the declared media type and the size
//!    ceiling. It is synchronous and cheap, so a bad file is rejected before
//!    any session state changes.
//! 2. [`decode_source`] decodes the bytes (any format the `image` crate was
//!    built with), applies EXIF orientation and converts to RGBA8. This is
//!    the slow step; the session hands it out as a [`DecodeTicket`] so the
//!    host can run it wherever it likes.

mod orientation;

use std::fmt;
use std::io::Cursor;

use image::{ImageReader, RgbaImage};
use tracing::debug;

use crate::config::CropConfig;
use crate::error::CropError;

pub use orientation::{read_orientation, Orientation};

/// A file chosen by the user, as handed over by the host.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name, for logging only.
    pub name: String,
    /// Declared media type (e.g. `image/jpeg`). May be empty when the host
    /// could not determine one.
    pub media_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A decoded image ready for display and export.
///
/// Dimensions are always non-zero and already reflect EXIF orientation.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pixels: RgbaImage,
}

impl ImageSource {
    /// Wrap an RGBA bitmap. Fails with `DecodeFailed` for a zero-sized image.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, CropError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(CropError::DecodeFailed(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }
        Ok(Self { pixels })
    }

    pub fn natural_width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)` in pixels.
    pub fn natural_size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// The decoded bitmap.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Check a selected file against the media type and size rules.
///
/// # Errors
///
/// - `InvalidType` if the declared media type is not `image/*`, or if no type
///   was declared and the bytes are not a recognised image format.
/// - `TooLarge` if the file exceeds `config.max_file_bytes`.
pub fn validate_selection(file: &SelectedFile, config: &CropConfig) -> Result<(), CropError> {
    let media_type = file.media_type.trim().to_ascii_lowercase();

    if media_type.is_empty() {
        if image::guess_format(&file.bytes).is_err() {
            return Err(CropError::InvalidType(format!(
                "unrecognised contents in {}",
                file.name
            )));
        }
    } else if !media_type.starts_with("image/") {
        return Err(CropError::InvalidType(media_type));
    }

    if file.len() > config.max_file_bytes {
        return Err(CropError::TooLarge {
            size: file.len(),
            limit: config.max_file_bytes,
        });
    }

    Ok(())
}

/// Decode file bytes into an [`ImageSource`].
///
/// # Errors
///
/// Returns `DecodeFailed` if the format is unknown, the data is corrupt or
/// truncated, or the result has no pixels.
pub fn decode_source(bytes: &[u8]) -> Result<ImageSource, CropError> {
    let orientation = read_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CropError::DecodeFailed(e.to_string()))?;

    let img = reader
        .decode()
        .map_err(|e| CropError::DecodeFailed(e.to_string()))?;

    debug!(
        width = img.width(),
        height = img.height(),
        ?orientation,
        "Decoded image"
    );

    ImageSource::from_rgba(orientation.apply(img).into_rgba8())
}

/// A pending decode handed out by the session.
///
/// The generation ties the eventual result back to the selection that
/// produced it; results for superseded selections are discarded.
#[derive(Debug, Clone)]
pub struct DecodeTicket {
    generation: u64,
    file: SelectedFile,
}

impl DecodeTicket {
    pub(crate) fn new(generation: u64, file: SelectedFile) -> Self {
        Self { generation, file }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    /// Run the decode.
    pub fn decode(&self) -> Result<ImageSource, CropError> {
        decode_source(&self.file.bytes)
    }
}
