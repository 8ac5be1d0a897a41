//! Error kinds surfaced by a crop session.

use thiserror::Error;

use crate::encode::EncodeError;

/// Errors observable by the host of a crop session.
#[derive(Debug, Error)]
pub enum CropError {
    /// The selected file is not an image.
    #[error("Not an image file: {0}")]
    InvalidType(String),

    /// The selected file exceeds the configured size ceiling.
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    /// The decoder rejected the file's bytes.
    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    /// Commit requested without a fully decoded image.
    #[error("No image loaded")]
    NotReady,

    /// The export sink rejected the payload.
    #[error("Export failed: {0}")]
    SinkFailed(String),

    /// A commit is in flight; input and new selections are refused.
    #[error("Crop session is busy committing")]
    Busy,

    /// The rendered bitmap could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl CropError {
    /// Stable name of the error kind, for hosts that branch on it.
    pub fn kind(&self) -> &'static str {
        match self {
            CropError::InvalidType(_) => "InvalidType",
            CropError::TooLarge { .. } => "TooLarge",
            CropError::DecodeFailed(_) => "DecodeFailed",
            CropError::NotReady => "NotReady",
            CropError::SinkFailed(_) => "SinkFailed",
            CropError::Busy => "Busy",
            CropError::Encode(_) => "EncodeFailed",
        }
    }
}
