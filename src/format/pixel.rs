//! Per-pixel encoding into D2 formats.
//!
//! Direct modes (ARGB8888, RGBA8888, RGB565) take an RGB(A) pixel; indexed
//! modes (AI44, I8, I4, I2, I1) take a palette index. Multi-byte results are
//! written little-endian.

use super::bit_packer::BitPacker;
use super::color_mode::BaseMode;
use crate::error::{ConvertError, Result};

// ============================================================================
// Pixel types
// ============================================================================

/// Direct-color source pixel. `a` is None when the source has no alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: Option<u8>,
}

impl Pixel {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Pixel { r, g, b, a: None }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Pixel { r, g, b, a: Some(a) }
    }

    /// Effective alpha (255 when the source has none)
    #[inline]
    pub fn alpha(&self) -> u8 {
        self.a.unwrap_or(255)
    }

    /// Scale color channels by alpha when the pixel carries a real alpha value
    #[inline]
    pub fn premultiplied(self) -> Self {
        match self.a {
            Some(a) => Pixel {
                r: premultiply_channel(self.r, a),
                g: premultiply_channel(self.g, a),
                b: premultiply_channel(self.b, a),
                a: Some(a),
            },
            None => self,
        }
    }
}

/// Palette-indexed source pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedPixel {
    pub index: u8,
    /// Alpha from the palette transparency table, if any
    pub alpha: Option<u8>,
}

impl IndexedPixel {
    pub fn new(index: u8) -> Self {
        IndexedPixel { index, alpha: None }
    }

    pub fn with_alpha(index: u8, alpha: u8) -> Self {
        IndexedPixel { index, alpha: Some(alpha) }
    }
}

/// Output of encoding one pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedPixel {
    Word32(u32),
    Half16(u16),
    Byte(u8),
    /// Sub-byte (or I8) value routed through the row's `BitPacker`
    Bits { value: u8, width: u8 },
}

impl EncodedPixel {
    /// Append this pixel to a row buffer
    #[inline]
    pub fn write(self, row: &mut Vec<u8>, packer: &mut BitPacker) {
        match self {
            EncodedPixel::Word32(word) => row.extend_from_slice(&word.to_le_bytes()),
            EncodedPixel::Half16(half) => row.extend_from_slice(&half.to_le_bytes()),
            EncodedPixel::Byte(byte) => row.push(byte),
            EncodedPixel::Bits { value, width } => {
                if let Some(byte) = packer.pack(value, width) {
                    row.push(byte);
                }
            }
        }
    }
}

// ============================================================================
// Channel math
// ============================================================================

/// `channel * alpha / 255`, truncating
#[inline]
pub fn premultiply_channel(channel: u8, alpha: u8) -> u8 {
    ((channel as u32 * alpha as u32) / 255) as u8
}

#[inline]
pub fn encode_argb8888(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

#[inline]
pub fn encode_rgba8888(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | a as u32
}

/// Quantize to 5/6/5 bits by `c * max / 255` and pack R in the MSBs
#[inline]
pub fn encode_rgb565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r as u32 * 31) / 255;
    let g6 = (g as u32 * 63) / 255;
    let b5 = (b as u32 * 31) / 255;
    ((r5 << 11) | (g6 << 5) | b5) as u16
}

/// Alpha nibble high, index nibble low. Fully transparent pixels always use
/// index 0.
#[inline]
pub fn encode_ai44(index: u8, alpha: u8) -> u8 {
    let index = if alpha == 0 { 0 } else { index & 0x0F };
    ((alpha >> 4) << 4) | index
}

// ============================================================================
// Encoders
// ============================================================================

/// True when `mode` takes direct RGB(A) pixels
pub fn is_direct_mode(mode: BaseMode) -> bool {
    matches!(mode, BaseMode::Argb8888 | BaseMode::Rgba8888 | BaseMode::Rgb565)
}

/// True when `mode` takes palette indices
pub fn is_indexed_mode(mode: BaseMode) -> bool {
    matches!(
        mode,
        BaseMode::Ai44 | BaseMode::I8 | BaseMode::I4 | BaseMode::I2 | BaseMode::I1
    )
}

/// Encode a direct-color pixel. Pixels with a real alpha channel are
/// premultiplied before packing.
pub fn encode_direct(pixel: Pixel, mode: BaseMode) -> Result<EncodedPixel> {
    let p = pixel.premultiplied();
    let a = p.alpha();

    match mode {
        BaseMode::Argb8888 => Ok(EncodedPixel::Word32(encode_argb8888(a, p.r, p.g, p.b))),
        BaseMode::Rgba8888 => Ok(EncodedPixel::Word32(encode_rgba8888(p.r, p.g, p.b, a))),
        BaseMode::Rgb565 => Ok(EncodedPixel::Half16(encode_rgb565(p.r, p.g, p.b))),
        other => Err(ConvertError::UnsupportedTargetMode(format!(
            "{} cannot encode direct-color pixels",
            other
        ))),
    }
}

/// Encode a palette index. `mask_alpha` overrides the pixel's own alpha for
/// AI44; the pure indexed modes ignore alpha.
pub fn encode_indexed(pixel: IndexedPixel, mask_alpha: Option<u8>, mode: BaseMode) -> Result<EncodedPixel> {
    if mode == BaseMode::Ai44 {
        let alpha = mask_alpha.or(pixel.alpha).unwrap_or(255);
        return Ok(EncodedPixel::Byte(encode_ai44(pixel.index, alpha)));
    }

    match mode.index_bits() {
        Some(bits) => {
            let mask = ((1u16 << bits) - 1) as u8;
            Ok(EncodedPixel::Bits {
                value: pixel.index & mask,
                width: bits,
            })
        }
        None => Err(ConvertError::UnsupportedTargetMode(format!(
            "{} cannot encode palette indices",
            mode
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premultiply_argb8888() {
        let encoded = encode_direct(Pixel::rgba(200, 100, 50, 128), BaseMode::Argb8888).unwrap();
        let expected = 128u32 << 24 | (200 * 128 / 255) << 16 | (100 * 128 / 255) << 8 | (50 * 128 / 255);
        assert_eq!(encoded, EncodedPixel::Word32(expected));
        assert_eq!(expected, 0x8064_3219);
    }

    #[test]
    fn test_no_premultiply_without_alpha() {
        let encoded = encode_direct(Pixel::rgb(200, 100, 50), BaseMode::Argb8888).unwrap();
        assert_eq!(encoded, EncodedPixel::Word32(0xFFC8_6432));

        let encoded = encode_direct(Pixel::rgb(1, 2, 3), BaseMode::Rgba8888).unwrap();
        assert_eq!(encoded, EncodedPixel::Word32(0x0102_03FF));
    }

    #[test]
    fn test_rgba8888_layout() {
        let encoded = encode_direct(Pixel::rgba(255, 255, 255, 255), BaseMode::Rgba8888).unwrap();
        assert_eq!(encoded, EncodedPixel::Word32(0xFFFF_FFFF));

        let encoded = encode_direct(Pixel::rgba(255, 0, 0, 0), BaseMode::Rgba8888).unwrap();
        assert_eq!(encoded, EncodedPixel::Word32(0));
    }

    #[test]
    fn test_rgb565_boundaries() {
        assert_eq!(encode_rgb565(255, 255, 255), 0xFFFF);
        assert_eq!(encode_rgb565(0, 0, 0), 0x0000);
        assert_eq!(encode_rgb565(255, 0, 0), 0xF800);
        assert_eq!(encode_rgb565(0, 255, 0), 0x07E0);
        assert_eq!(encode_rgb565(0, 0, 255), 0x001F);
        // 128 * 31 / 255 = 15, 128 * 63 / 255 = 31
        assert_eq!(encode_rgb565(128, 128, 128), (15 << 11) | (31 << 5) | 15);
    }

    #[test]
    fn test_rgb565_discards_alpha_after_premultiply() {
        let encoded = encode_direct(Pixel::rgba(255, 255, 255, 0), BaseMode::Rgb565).unwrap();
        assert_eq!(encoded, EncodedPixel::Half16(0));
    }

    #[test]
    fn test_ai44_zero_alpha() {
        for index in 0..=255u8 {
            assert_eq!(encode_ai44(index, 0), 0x00);
        }
        let encoded = encode_indexed(IndexedPixel::new(7), Some(0), BaseMode::Ai44).unwrap();
        assert_eq!(encoded, EncodedPixel::Byte(0));
    }

    #[test]
    fn test_ai44_alpha_sources() {
        // No mask, no tRNS: opaque
        let encoded = encode_indexed(IndexedPixel::new(0x3), None, BaseMode::Ai44).unwrap();
        assert_eq!(encoded, EncodedPixel::Byte(0xF3));

        // tRNS alpha used when there is no mask
        let encoded = encode_indexed(IndexedPixel::with_alpha(0x3, 0x80), None, BaseMode::Ai44).unwrap();
        assert_eq!(encoded, EncodedPixel::Byte(0x83));

        // Mask wins over tRNS
        let encoded = encode_indexed(IndexedPixel::with_alpha(0x13, 0x80), Some(0x4F), BaseMode::Ai44).unwrap();
        assert_eq!(encoded, EncodedPixel::Byte(0x43));
    }

    #[test]
    fn test_indexed_bits() {
        let cases = [
            (BaseMode::I8, 0xABu8, 0xABu8, 8u8),
            (BaseMode::I4, 0xAB, 0x0B, 4),
            (BaseMode::I2, 0xAB, 0x03, 2),
            (BaseMode::I1, 0xAB, 0x01, 1),
        ];
        for (mode, index, value, width) in cases {
            let encoded = encode_indexed(IndexedPixel::new(index), Some(0), mode).unwrap();
            assert_eq!(encoded, EncodedPixel::Bits { value, width });
        }
    }

    #[test]
    fn test_unsupported_modes() {
        for mode in [BaseMode::Alpha8, BaseMode::Argb4444, BaseMode::Rgba5551, BaseMode::Ai44] {
            assert!(matches!(
                encode_direct(Pixel::rgb(0, 0, 0), mode),
                Err(ConvertError::UnsupportedTargetMode(_))
            ));
        }
        for mode in [BaseMode::Alpha1, BaseMode::Rgb565] {
            assert!(matches!(
                encode_indexed(IndexedPixel::new(0), None, mode),
                Err(ConvertError::UnsupportedTargetMode(_))
            ));
        }
    }

    #[test]
    fn test_write_little_endian() {
        let mut row = Vec::new();
        let mut packer = BitPacker::new();
        EncodedPixel::Word32(0x1122_3344).write(&mut row, &mut packer);
        EncodedPixel::Half16(0xF800).write(&mut row, &mut packer);
        EncodedPixel::Byte(0x7F).write(&mut row, &mut packer);
        assert_eq!(row, vec![0x44, 0x33, 0x22, 0x11, 0x00, 0xF8, 0x7F]);
    }
}
