//! Image to D2 payload conversion.
//!
//! Pipeline: encode each row (PixelEncoder + BitPacker), concatenate rows,
//! optionally RLE-compress, optionally prefix the header.

use log::{debug, info};
use std::io::Write;
use std::path::Path;

use crate::decode::{AlphaMask, SourceImage};
use crate::error::{ConvertError, Result};
use crate::format::bit_packer::BitPacker;
use crate::format::color_mode::{BaseMode, ColorMode};
use crate::format::header::{Header, HEADER_LEN};
use crate::format::pixel::{encode_direct, encode_indexed, is_direct_mode, is_indexed_mode};
use crate::format::rle;

/// Values placed in the header's free-form fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderOptions {
    pub flags: u8,
    pub image_type: u8,
}

/// Conversion settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Target mode; its RLE flag selects compression
    pub mode: ColorMode,
    /// Emit a header when set
    pub header: Option<HeaderOptions>,
}

impl ConvertOptions {
    pub fn new(mode: ColorMode) -> Self {
        ConvertOptions { mode, header: None }
    }

    pub fn with_header(mut self, flags: u8, image_type: u8) -> Self {
        self.header = Some(HeaderOptions { flags, image_type });
        self
    }
}

/// Result of a conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedImage {
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
    pub header: Option<Header>,
    /// Packed pixels, RLE-compressed if the mode says so
    pub payload: Vec<u8>,
    /// Size of the packed pixels before compression
    pub unpacked_len: usize,
}

impl ConvertedImage {
    /// Total output size including header
    pub fn len(&self) -> usize {
        self.payload.len() + if self.header.is_some() { HEADER_LEN } else { 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if let Some(header) = &self.header {
            header.write_to(writer)?;
        }
        writer.write_all(&self.payload)
    }

    /// Header (if any) followed by payload
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output = Vec::with_capacity(self.len());
        if let Some(header) = &self.header {
            output.extend_from_slice(&header.to_bytes());
        }
        output.extend_from_slice(&self.payload);
        output
    }

    /// Write the output file in one go
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()).map_err(|e| ConvertError::io(path, e))
    }
}

/// Reject source/mask/mode combinations before any pixel work
fn validate(image: &SourceImage, mask: Option<&AlphaMask>, mode: BaseMode) -> Result<()> {
    if is_indexed_mode(mode) {
        if !image.is_indexed() {
            return Err(ConvertError::UnsupportedSourcePixelLayout(format!(
                "{} needs a palette-indexed source, got {}",
                mode,
                image.layout_name()
            )));
        }
    } else if !is_direct_mode(mode) {
        return Err(ConvertError::UnsupportedTargetMode(mode.to_string()));
    }

    if let Some(mask) = mask {
        if (mask.width, mask.height) != (image.width, image.height) {
            return Err(ConvertError::MaskUnavailableOrInvalid(format!(
                "mask is {}x{}, image is {}x{}",
                mask.width, mask.height, image.width, image.height
            )));
        }
    }

    Ok(())
}

/// Encode one row, appending its bytes to `output`. Partial bytes are
/// flushed at the end of the row.
fn encode_row(
    image: &SourceImage,
    mask: Option<&AlphaMask>,
    mode: BaseMode,
    y: u32,
    output: &mut Vec<u8>,
) -> Result<()> {
    let mut packer = BitPacker::new();
    let indexed = is_indexed_mode(mode);

    for x in 0..image.width {
        let encoded = if indexed {
            let mask_alpha = mask.map(|m| m.alpha_at(x, y));
            encode_indexed(image.indexed_pixel(x, y)?, mask_alpha, mode)?
        } else {
            encode_direct(image.direct_pixel(x, y)?, mode)?
        };
        encoded.write(output, &mut packer);
    }

    if let Some(byte) = packer.flush() {
        output.push(byte);
    }
    Ok(())
}

/// Pack all rows of `image` in `mode`, without compression or header
pub fn encode_pixels(image: &SourceImage, mask: Option<&AlphaMask>, mode: BaseMode) -> Result<Vec<u8>> {
    validate(image, mask, mode)?;

    let mut output = Vec::new();
    for y in 0..image.height {
        encode_row(image, mask, mode, y, &mut output)?;
    }
    Ok(output)
}

/// Run the full conversion pipeline
pub fn convert(image: &SourceImage, mask: Option<&AlphaMask>, options: &ConvertOptions) -> Result<ConvertedImage> {
    let mode = options.mode;
    let packed = encode_pixels(image, mask, mode.base)?;
    let unpacked_len = packed.len();
    debug!("Packed {}x{} as {}: {} bytes", image.width, image.height, mode.base, unpacked_len);

    let payload = if mode.flags.rle {
        let compressed = rle::encode(&packed);
        info!("Original size {} bytes RLE compressed to {} bytes", unpacked_len, compressed.len());
        compressed
    } else {
        packed
    };

    let header = match options.header {
        Some(h) => Some(Header::new(image.width, image.height, h.flags, h.image_type, mode, payload.len())?),
        None => None,
    };

    Ok(ConvertedImage {
        width: image.width,
        height: image.height,
        mode,
        header,
        payload,
        unpacked_len,
    })
}
