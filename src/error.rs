//! Error types for conversion.
//!
//! Every failure is fatal for the conversion in progress: nothing is written
//! until the whole image has been encoded.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving formats, decoding inputs, or encoding.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// Color or palette format name is not recognised.
    #[error("Unknown format '{0}'")]
    UnknownFormat(String),

    /// Decoded source image is in a layout the encoder does not handle.
    #[error("Unsupported source pixel layout: {0}")]
    UnsupportedSourcePixelLayout(String),

    /// Mode reached the pixel loop without a defined transform.
    #[error("Unsupported color mode: {0}")]
    UnsupportedTargetMode(String),

    /// Mask requested but missing, unreadable, or not RGBA.
    #[error("Mask unavailable or invalid: {0}")]
    MaskUnavailableOrInvalid(String),

    /// Palette file is truncated or not palette-indexed.
    #[error("Malformed palette source: {0}")]
    MalformedPaletteSource(String),

    /// A header field does not fit its on-disk width.
    #[error("Header field {field} = {value} exceeds maximum {max}")]
    HeaderFieldOverflow {
        /// Name of the header field.
        field: &'static str,
        /// The rejected value.
        value: u64,
        /// Largest value the field can hold.
        max: u64,
    },

    /// Header bytes are too short or carry the wrong magic.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// An RLE packet claims more bytes than the stream holds.
    #[error("Truncated RLE packet at offset {offset}")]
    MalformedRleStream {
        /// Offset of the control byte of the broken packet.
        offset: usize,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// PNG decoding failed.
    #[error("PNG decoding error: {0}")]
    Png(#[from] png::DecodingError),

    /// Image crate failure (mask decoding, LUT output).
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
